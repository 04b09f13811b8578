//! Integration tests for the TRIBUN rules engine
//!
//! Tests the collaborator entry points end to end: enumeration,
//! transition, action words and board transport.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tribun_core::action::is_board_action;
use tribun_core::reach::{reachable_for_attack, reachable_for_move};
use tribun_core::{
    apply_action, generate_legal_actions, pack_board, unpack_board, Action, Board, Cid, Color,
    EndReason, GameState, Illegal, Part, Snapshot, Status, Unit, DIRECTIONS,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn cid(x: i8, y: i8) -> Cid {
    Cid::encode(x, y).unwrap()
}

fn state_with(units: &[((i8, i8), Unit)]) -> GameState {
    let mut board = Board::empty();
    for &((x, y), unit) in units {
        board.set(cid(x, y), Some(unit));
    }
    GameState::new(board)
}

/// Every board invariant a reachable state must satisfy
fn assert_invariants(state: &GameState) {
    let board = state.board();
    for color in Color::BOTH {
        let tribuns = board
            .units()
            .filter(|(_, u)| u.tribun && u.color == color)
            .count();
        assert!(tribuns <= 1, "{:?} has {} tribuns", color, tribuns);
    }
    for (cid, unit) in board.units() {
        assert!(unit.is_normal(), "unit {:?} at {} not normal", unit, cid.raw());
        assert!(!(unit.tribun && unit.has_secondary()), "tribun with secondary");
    }
    assert_eq!(unpack_board(&pack_board(board)).unwrap(), *board);
}

/// Play random legal actions, preferring board actions
fn random_playout(seed: u64, max_plies: u32) -> GameState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = GameState::new_game();

    while !state.is_ended() && state.ply() < max_plies {
        let words = generate_legal_actions(&state);
        assert!(!words.is_empty(), "active game without legal actions");
        assert!(words.windows(2).all(|w| w[0] < w[1]));

        let board_words: Vec<u32> = words.iter().copied().filter(|&w| is_board_action(w)).collect();
        let pool = if board_words.is_empty() { &words } else { &board_words };
        let word = *pool.choose(&mut rng).unwrap();

        state = apply_action(&state, word)
            .unwrap_or_else(|e| panic!("generated action {:#010x} rejected: {}", word, e));
        assert_invariants(&state);
    }
    state
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_height_one_move_asymmetry() {
    let board = Board::empty();
    let origin = cid(0, 0);

    let moves = reachable_for_move(origin, 1, Color::Black, false, &board);
    assert_eq!(moves, vec![cid(1, 1)]);

    let mut attacks = reachable_for_attack(origin, 1, Color::Black, false, &board);
    attacks.sort();
    let mut expected = vec![cid(1, 0), cid(0, 1)];
    expected.sort();
    assert_eq!(attacks, expected);

    let mut neighbors: Vec<Cid> = DIRECTIONS.iter().filter_map(|&d| origin.step(d)).collect();
    neighbors.sort();
    assert_eq!(reachable_for_move(origin, 1, Color::Black, true, &board), neighbors);
    assert_eq!(reachable_for_attack(origin, 1, Color::Black, true, &board), neighbors);
}

#[test]
fn test_split_minimum_cardinality() {
    let state = state_with(&[((0, 0), Unit::new(Color::White, 4))]);

    let single = Action::Split { actor: cid(0, 0), heights: [4, 0, 0, 0, 0, 0] };
    let err = apply_action(&state, single.encode()).unwrap_err();
    assert!(matches!(err.illegal_reason(), Some(Illegal::BadSplit(_))));
    assert!(!generate_legal_actions(&state).contains(&single.encode()));

    let pair = Action::Split { actor: cid(0, 0), heights: [2, 2, 0, 0, 0, 0] };
    assert!(apply_action(&state, pair.encode()).is_ok());
}

#[test]
fn test_attack_tribun_short_circuit() {
    // white has far less material but reaches the black tribun
    let state = state_with(&[
        ((0, 0), Unit::tribun(Color::Black, 1)),
        ((-3, -3), Unit::new(Color::Black, 8)),
        ((3, 3), Unit::new(Color::Black, 8)),
        ((2, 1), Unit::new(Color::White, 2)),
    ]);
    let attack = Action::AttackTribun {
        attacker: cid(2, 1),
        tribun: cid(0, 0),
        winner: Color::White,
    };
    assert!(generate_legal_actions(&state).contains(&attack.encode()));

    let next = apply_action(&state, attack.encode()).unwrap();
    assert_eq!(next.status(), Status::Ended);
    assert_eq!(next.winner(), Some(Color::White));
    assert!(generate_legal_actions(&next).is_empty());
}

#[test]
fn test_no_damage_for_full_sum() {
    // two pawns reach 2 against a 2: kill, never a damage of 2
    let state = state_with(&[
        ((0, 0), Unit::new(Color::Black, 2)),
        ((1, 0), Unit::new(Color::White, 1)),
        ((0, 1), Unit::new(Color::White, 1)),
    ]);
    let words = generate_legal_actions(&state);
    let damage_two = Action::Damage { target: cid(0, 0), amount: 2 };
    assert!(!words.contains(&damage_two.encode()));
    let kill = Action::Kill { attacker: cid(0, 1), target: cid(0, 0), part: Part::Primary };
    assert!(words.contains(&kill.encode()));
}

#[test]
fn test_illegal_action_reports_rule() {
    let state = GameState::new_game();
    // black unit while white is to move
    let black_pawn = cid(-4, -3);
    let mv = Action::Move { from: black_pawn, to: cid(-3, -2), part: Part::Primary };
    let err = apply_action(&state, mv.encode()).unwrap_err();
    assert_eq!(err.illegal_reason(), Some(&Illegal::NotYourUnit));
    assert!(err.to_string().contains("opponent"));
}

#[test]
fn test_malformed_word_rejected() {
    let state = GameState::new_game();
    assert!(apply_action(&state, 0xF000_0000).is_err());
}

#[test]
fn test_resign_by_either_side() {
    let state = GameState::new_game();
    for color in Color::BOTH {
        let resign = Action::End { reason: EndReason::Resign, loser: color };
        let next = apply_action(&state, resign.encode()).unwrap();
        assert_eq!(next.winner(), Some(color.opponent()));
        assert_eq!(next.turn(), state.turn());
    }
}

// ============================================================================
// PLAYOUTS
// ============================================================================

#[test]
fn test_random_playouts_keep_invariants() {
    for seed in 0..8 {
        let end = random_playout(seed, 120);
        assert!(end.is_ended() || end.ply() == 120);
    }
}

#[test]
fn test_playouts_are_deterministic() {
    let a = random_playout(42, 60);
    let b = random_playout(42, 60);
    assert_eq!(a, b);
    assert_eq!(Snapshot::from(&a), Snapshot::from(&b));
}

#[test]
fn test_snapshot_mid_game() {
    let state = random_playout(7, 30);
    let json = Snapshot::from(&state).to_json().unwrap();
    let restored = Snapshot::from_json(&json).unwrap().into_state().unwrap();
    assert_eq!(restored, state);
    assert_eq!(generate_legal_actions(&restored), generate_legal_actions(&state));
}
