//! Game state, legal action enumeration and state transition

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::action::{is_board_action, Action, DrawAction, EndReason, Part, SymConfig};
use crate::attack::{analyze_target, AttackAnalysis};
use crate::board::{Board, Cid};
use crate::error::{Error, Illegal};
use crate::reach::reachable_for_move;
use crate::unit::{is_legal_height, normalize, satisfies_sp, Color, Unit, HEIGHTS, MAX_HEIGHT};

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Ended,
}

/// Game state (apply an action to get the next one)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GameState {
    board: Board,

    /// Color to move
    turn: Color,

    /// Actions applied so far
    ply: u32,

    /// Side with a pending draw offer
    draw_offer_by: Option<Color>,

    /// Side whose last offer was declined and may not offer again yet
    draw_offer_blocked: Option<Color>,

    status: Status,

    /// Winning color once ended; `None` for a tie
    winner: Option<Color>,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Fresh game on `board`, white to move
    pub fn new(board: Board) -> Self {
        Self {
            board,
            turn: Color::White,
            ply: 0,
            draw_offer_by: None,
            draw_offer_blocked: None,
            status: Status::Active,
            winner: None,
        }
    }

    /// Fresh game from the default opening
    pub fn new_game() -> Self {
        Self::new(Board::opening())
    }

    /// Rebuild a state from its fields, checking the board invariants
    pub fn from_parts(
        board: Board,
        turn: Color,
        ply: u32,
        draw_offer_by: Option<Color>,
        draw_offer_blocked: Option<Color>,
        status: Status,
        winner: Option<Color>,
    ) -> Result<Self, Error> {
        for color in Color::BOTH {
            let tribuns = board
                .units()
                .filter(|(_, unit)| unit.tribun && unit.color == color)
                .count();
            if tribuns > 1 {
                return Err(Error::InvalidState(format!("{:?} has {} tribuns", color, tribuns)));
            }
        }
        if let Some((cid, _)) = board.units().find(|(_, unit)| unit.tribun && unit.has_secondary()) {
            return Err(Error::InvalidState(format!(
                "tribun at cell {} carries a secondary",
                cid.raw()
            )));
        }
        if status == Status::Active && winner.is_some() {
            return Err(Error::InvalidState("active game has a winner".to_string()));
        }

        Ok(Self {
            board,
            turn,
            ply,
            draw_offer_by,
            draw_offer_blocked,
            status,
            winner,
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn draw_offer_by(&self) -> Option<Color> {
        self.draw_offer_by
    }

    pub fn draw_offer_blocked(&self) -> Option<Color> {
        self.draw_offer_blocked
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn is_ended(&self) -> bool {
        self.status == Status::Ended
    }

    // ========================================================================
    // ACTION GENERATION
    // ========================================================================

    /// Every legal action word, sorted ascending and distinct
    pub fn legal_actions(&self) -> Vec<u32> {
        if self.is_ended() {
            return Vec::new();
        }

        let board_actions = self.board_actions();
        let mut words: FxHashSet<u32> = board_actions.iter().map(Action::encode).collect();

        if board_actions.is_empty() {
            words.insert(
                Action::End {
                    reason: EndReason::NoLegalMoves,
                    loser: self.turn,
                }
                .encode(),
            );
        }
        words.extend(self.admin_actions().iter().map(Action::encode));

        let mut sorted: Vec<u32> = words.into_iter().collect();
        sorted.sort_unstable();
        sorted
    }

    /// Legal actions that change the board, for the side to move
    pub fn board_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.is_ended() {
            return actions;
        }

        for cid in Cid::all() {
            match self.board.get(cid) {
                Some(unit) if unit.color == self.turn => {
                    self.generate_moves(cid, &unit, &mut actions);
                    self.generate_backstabbs(cid, &unit, &mut actions);
                    self.generate_splits(cid, &unit, &mut actions);
                }
                Some(_) => self.generate_attacks(cid, &mut actions),
                None => {
                    self.generate_combines(cid, &mut actions);
                    self.generate_sym_combines(cid, &mut actions);
                }
            }
        }
        actions
    }

    /// Resign and draw handling, available to both colors
    fn admin_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        for color in Color::BOTH {
            actions.push(Action::End {
                reason: EndReason::Resign,
                loser: color,
            });

            let draw = |action| Action::Draw { actor: color, action };
            match self.draw_offer_by {
                None if self.draw_offer_blocked != Some(color) => {
                    actions.push(draw(DrawAction::Offer));
                }
                None => {}
                Some(offerer) if offerer == color => actions.push(draw(DrawAction::Retract)),
                Some(_) => {
                    actions.push(draw(DrawAction::Accept));
                    actions.push(draw(DrawAction::Decline));
                }
            }
        }
        actions
    }

    fn generate_moves(&self, origin: Cid, unit: &Unit, actions: &mut Vec<Action>) {
        for part in Part::BOTH {
            let height = unit.height(part);
            if height == 0 {
                continue;
            }
            let tribun = unit.tribun && part == Part::Primary;
            for to in reachable_for_move(origin, height, unit.color, tribun, &self.board) {
                if self.board.is_empty(to) {
                    actions.push(Action::Move { from: origin, to, part });
                }
            }
        }
    }

    fn generate_backstabbs(&self, origin: Cid, unit: &Unit, actions: &mut Vec<Action>) {
        if !unit.has_secondary() {
            return;
        }
        for dir in 0..6u8 {
            if origin.neighbor(dir).is_some_and(|cell| self.board.is_empty(cell)) {
                actions.push(Action::Backstabb { actor: origin, dir });
            }
        }
    }

    fn generate_splits(&self, origin: Cid, unit: &Unit, actions: &mut Vec<Action>) {
        if unit.tribun {
            return;
        }
        let open: [bool; 6] = std::array::from_fn(|dir| {
            origin
                .neighbor(dir as u8)
                .is_some_and(|cell| self.board.is_empty(cell))
        });

        let mut plans = Vec::new();
        split_search(unit, &open, 0, unit.primary, &mut [0; 6], &mut plans);
        actions.extend(plans.into_iter().map(|heights| Action::Split {
            actor: origin,
            heights,
        }));
    }

    fn generate_combines(&self, center: Cid, actions: &mut Vec<Action>) {
        let donors: [Option<(u8, Unit)>; 6] = std::array::from_fn(|dir| {
            let dir = dir as u8;
            center
                .neighbor(dir)
                .and_then(|cell| self.board.get(cell))
                .filter(|unit| unit.color == self.turn)
                .map(|unit| (dir, unit))
        });

        for &(dir_a, donor_a) in donors.iter().flatten() {
            for &(dir_b, donor_b) in donors.iter().flatten() {
                if dir_a == dir_b {
                    continue;
                }
                for donate_a in valid_donations(&donor_a) {
                    for donate_b in valid_donations(&donor_b) {
                        if is_legal_height(donate_a + donate_b) {
                            actions.push(Action::Combine {
                                center,
                                dir_a,
                                dir_b,
                                donate_a,
                                donate_b,
                            });
                        }
                    }
                }
            }
        }
    }

    fn generate_sym_combines(&self, center: Cid, actions: &mut Vec<Action>) {
        for config in SymConfig::ALL {
            let Ok(donor) = self.sym_donor(center, config) else {
                continue;
            };
            let count = config.directions().len() as u8;
            for donate in 1..=4u8 {
                if donor_remainder(&donor, donate).is_some() && is_legal_height(donate * count) {
                    actions.push(Action::SymCombine {
                        center,
                        config,
                        donate,
                    });
                }
            }
        }
    }

    fn generate_attacks(&self, target: Cid, actions: &mut Vec<Action>) {
        let Some(analysis) = analyze_target(&self.board, target, self.turn) else {
            return;
        };

        for &attacker in &analysis.tribun_attackers {
            actions.push(Action::AttackTribun {
                attacker,
                tribun: target,
                winner: self.turn,
            });
        }
        for &(attacker, part) in &analysis.killers {
            actions.push(Action::Kill { attacker, target, part });
        }
        for &attacker in &analysis.enslavers {
            actions.push(Action::Enslave { attacker, target });
        }
        if analysis.can_liberate {
            actions.push(Action::Liberate { target });
        }
        for &amount in &analysis.damages {
            actions.push(Action::Damage { target, amount });
        }
    }

    // ========================================================================
    // APPLY ACTION
    // ========================================================================

    /// Validate `word` against this state and return the next state.
    /// On error nothing is changed.
    pub fn apply_action(&self, word: u32) -> Result<GameState, Error> {
        let action = Action::decode(word)?;

        let mut next = self.clone();
        if let Err(reason) = next.apply_internal(action) {
            tracing::debug!(word = format_args!("{:#010x}", word), %reason, "rejected action");
            return Err(Error::IllegalAction { word, reason });
        }

        tracing::trace!(?action, ply = next.ply, "applied action");
        if next.is_ended() {
            tracing::info!(winner = ?next.winner, ply = next.ply, "game ended");
        }
        Ok(next)
    }

    fn apply_internal(&mut self, action: Action) -> Result<(), Illegal> {
        if self.is_ended() {
            return Err(Illegal::GameOver);
        }

        match action {
            Action::Draw { actor, action } => return self.apply_draw(actor, action),
            Action::End { reason, loser } => return self.apply_end(reason, loser),
            _ => {}
        }

        match action {
            Action::Move { from, to, part } => self.apply_move(from, to, part)?,
            Action::Kill { attacker, target, part } => self.apply_kill(attacker, target, part)?,
            Action::Liberate { target } => self.apply_liberate(target)?,
            Action::Damage { target, amount } => self.apply_damage(target, amount)?,
            Action::Enslave { attacker, target } => self.apply_enslave(attacker, target)?,
            Action::Combine {
                center,
                dir_a,
                dir_b,
                donate_a,
                donate_b,
            } => self.apply_combine(center, [(dir_a, donate_a), (dir_b, donate_b)])?,
            Action::SymCombine {
                center,
                config,
                donate,
            } => self.apply_sym_combine(center, config, donate)?,
            Action::Split { actor, heights } => self.apply_split(actor, heights)?,
            Action::Backstabb { actor, dir } => self.apply_backstabb(actor, dir)?,
            Action::AttackTribun {
                attacker,
                tribun,
                winner,
            } => self.apply_attack_tribun(attacker, tribun, winner)?,
            Action::Draw { .. } | Action::End { .. } => {}
        }

        self.end_turn();
        Ok(())
    }

    fn own_unit(&self, cid: Cid) -> Result<Unit, Illegal> {
        let unit = self.board.get(cid).ok_or(Illegal::EmptyCell)?;
        if unit.color != self.turn {
            return Err(Illegal::NotYourUnit);
        }
        Ok(unit)
    }

    fn empty_neighbor(&self, cid: Cid, dir: u8) -> Result<Cid, Illegal> {
        let cell = cid.neighbor(dir).ok_or(Illegal::OffBoard)?;
        if !self.board.is_empty(cell) {
            return Err(Illegal::DestinationOccupied);
        }
        Ok(cell)
    }

    /// Enemy unit on `target` and the attack analysis against it
    fn attack_on(&self, target: Cid) -> Result<(Unit, AttackAnalysis), Illegal> {
        let victim = self.board.get(target).ok_or(Illegal::NotAnEnemy)?;
        let analysis = analyze_target(&self.board, target, self.turn).ok_or(Illegal::NotAnEnemy)?;
        Ok((victim, analysis))
    }

    /// Write a unit in normal form
    fn place(&mut self, cid: Cid, unit: Unit) {
        self.board.set(cid, normalize(unit));
    }

    fn apply_move(&mut self, from: Cid, to: Cid, part: Part) -> Result<(), Illegal> {
        let unit = self.own_unit(from)?;
        let height = unit.height(part);
        if height == 0 {
            return Err(Illegal::NoSuchPart);
        }
        if !self.board.is_empty(to) {
            return Err(Illegal::DestinationOccupied);
        }
        let tribun = unit.tribun && part == Part::Primary;
        if !reachable_for_move(from, height, unit.color, tribun, &self.board).contains(&to) {
            return Err(Illegal::Unreachable);
        }

        self.board.set(from, None);
        self.place(to, unit);
        Ok(())
    }

    fn apply_kill(&mut self, attacker: Cid, target: Cid, part: Part) -> Result<(), Illegal> {
        let unit = self.own_unit(attacker)?;
        if unit.height(part) == 0 {
            return Err(Illegal::NoSuchPart);
        }
        let (victim, analysis) = self.attack_on(target)?;
        if victim.tribun {
            return Err(Illegal::TargetIsTribun);
        }
        if !analysis.can_kill_with(attacker, part) {
            let reaches = analysis
                .groups
                .iter()
                .any(|g| g.origin == attacker && g.options.iter().any(|o| o.part == part));
            return Err(if reaches {
                Illegal::InsufficientAttack
            } else {
                Illegal::Unreachable
            });
        }

        self.board.set(attacker, None);
        self.place(target, unit);
        Ok(())
    }

    fn apply_liberate(&mut self, target: Cid) -> Result<(), Illegal> {
        let (victim, analysis) = self.attack_on(target)?;
        if victim.tribun {
            return Err(Illegal::TargetIsTribun);
        }
        if !analysis.can_liberate {
            return Err(Illegal::CannotLiberate);
        }

        self.place(target, Unit { primary: 0, ..victim });
        Ok(())
    }

    fn apply_damage(&mut self, target: Cid, amount: u8) -> Result<(), Illegal> {
        let (victim, analysis) = self.attack_on(target)?;
        if victim.tribun {
            return Err(Illegal::TargetIsTribun);
        }
        if !analysis.can_damage(amount) {
            return Err(Illegal::DamageUnavailable(amount));
        }

        let primary = victim.primary.saturating_sub(amount);
        self.place(target, Unit { primary, ..victim });
        Ok(())
    }

    fn apply_enslave(&mut self, attacker: Cid, target: Cid) -> Result<(), Illegal> {
        let unit = self.own_unit(attacker)?;
        let (victim, analysis) = self.attack_on(target)?;
        if victim.tribun {
            return Err(Illegal::TargetIsTribun);
        }
        if !analysis.enslavers.contains(&attacker) {
            return Err(Illegal::CannotEnslave);
        }

        self.board.set(attacker, None);
        self.place(
            target,
            Unit::new(unit.color, unit.primary).with_secondary(victim.primary),
        );
        Ok(())
    }

    fn apply_combine(&mut self, center: Cid, donors: [(u8, u8); 2]) -> Result<(), Illegal> {
        if !self.board.is_empty(center) {
            return Err(Illegal::DestinationOccupied);
        }
        let [(dir_a, donate_a), (dir_b, donate_b)] = donors;
        if dir_a == dir_b {
            return Err(Illegal::BadDonors);
        }

        let mut updates = Vec::with_capacity(2);
        let mut tribun = false;
        for (dir, donate) in donors {
            let cell = center.neighbor(dir).ok_or(Illegal::OffBoard)?;
            let donor = self.own_unit(cell)?;
            let rest = donor_remainder(&donor, donate).ok_or(Illegal::BadDonation(donate))?;
            tribun |= donor.tribun;
            updates.push((cell, rest));
        }

        let total = donate_a + donate_b;
        if !is_legal_height(total) {
            return Err(Illegal::BadCombinedHeight(total));
        }

        for (cell, rest) in updates {
            self.board.set(cell, rest);
        }
        let combined = Unit {
            tribun,
            ..Unit::new(self.turn, total)
        };
        self.place(center, combined);
        Ok(())
    }

    /// The common donor unit of a symmetric combine around `center`
    fn sym_donor(&self, center: Cid, config: SymConfig) -> Result<Unit, Illegal> {
        let mut first: Option<Unit> = None;
        for &dir in config.directions() {
            let cell = center.neighbor(dir).ok_or(Illegal::OffBoard)?;
            let donor = self.own_unit(cell)?;
            if donor.tribun {
                return Err(Illegal::TribunNotAllowed);
            }
            match first {
                None => first = Some(donor),
                Some(f) if f == donor => {}
                Some(_) => return Err(Illegal::BadDonors),
            }
        }
        first.ok_or(Illegal::BadDonors)
    }

    fn apply_sym_combine(&mut self, center: Cid, config: SymConfig, donate: u8) -> Result<(), Illegal> {
        if !self.board.is_empty(center) {
            return Err(Illegal::DestinationOccupied);
        }
        let donor = self.sym_donor(center, config)?;
        let rest = donor_remainder(&donor, donate).ok_or(Illegal::BadDonation(donate))?;
        let total = donate * config.directions().len() as u8;
        if !is_legal_height(total) {
            return Err(Illegal::BadCombinedHeight(total));
        }

        for &dir in config.directions() {
            if let Some(cell) = center.neighbor(dir) {
                self.board.set(cell, rest);
            }
        }
        self.place(center, Unit::new(self.turn, total));
        Ok(())
    }

    fn apply_split(&mut self, actor: Cid, heights: [u8; 6]) -> Result<(), Illegal> {
        let unit = self.own_unit(actor)?;
        if unit.tribun {
            return Err(Illegal::TribunNotAllowed);
        }
        let rest = split_remainder(&unit, &heights).map_err(Illegal::BadSplit)?;

        let mut placements = Vec::new();
        for (dir, &height) in heights.iter().enumerate() {
            if height > 0 {
                placements.push((self.empty_neighbor(actor, dir as u8)?, height));
            }
        }

        self.board.set(actor, rest);
        for (cell, height) in placements {
            self.place(cell, Unit::new(unit.color, height));
        }
        Ok(())
    }

    fn apply_backstabb(&mut self, actor: Cid, dir: u8) -> Result<(), Illegal> {
        let unit = self.own_unit(actor)?;
        if !unit.has_secondary() {
            return Err(Illegal::NoSecondary);
        }
        let cell = self.empty_neighbor(actor, dir)?;

        self.board.set(actor, None);
        self.place(cell, Unit::new(unit.color, unit.primary));
        Ok(())
    }

    fn apply_attack_tribun(&mut self, attacker: Cid, tribun: Cid, winner: Color) -> Result<(), Illegal> {
        let unit = self.own_unit(attacker)?;
        let (victim, analysis) = self.attack_on(tribun)?;
        if !victim.tribun {
            return Err(Illegal::TargetNotTribun);
        }
        if winner != self.turn {
            return Err(Illegal::WrongWinner);
        }
        if !analysis.tribun_attackers.contains(&attacker) {
            return Err(Illegal::Unreachable);
        }

        self.board.set(attacker, None);
        self.place(tribun, unit);
        self.status = Status::Ended;
        self.winner = Some(winner);
        Ok(())
    }

    fn apply_draw(&mut self, actor: Color, action: DrawAction) -> Result<(), Illegal> {
        match action {
            DrawAction::Offer => {
                if self.draw_offer_by.is_some() {
                    return Err(Illegal::DrawStateMismatch);
                }
                if self.draw_offer_blocked == Some(actor) {
                    return Err(Illegal::DrawOfferBlocked(actor));
                }
                self.draw_offer_by = Some(actor);
            }
            DrawAction::Retract => {
                if self.draw_offer_by != Some(actor) {
                    return Err(Illegal::DrawStateMismatch);
                }
                self.draw_offer_by = None;
            }
            DrawAction::Accept => {
                if self.draw_offer_by != Some(actor.opponent()) {
                    return Err(Illegal::DrawStateMismatch);
                }
                self.draw_offer_by = None;
                self.status = Status::Ended;
                self.winner = None;
            }
            DrawAction::Decline => {
                if self.draw_offer_by != Some(actor.opponent()) {
                    return Err(Illegal::DrawStateMismatch);
                }
                self.draw_offer_by = None;
                self.draw_offer_blocked = Some(actor.opponent());
            }
        }
        self.ply += 1;
        Ok(())
    }

    fn apply_end(&mut self, reason: EndReason, loser: Color) -> Result<(), Illegal> {
        if reason == EndReason::NoLegalMoves {
            if loser != self.turn {
                return Err(Illegal::WrongTurn(self.turn));
            }
            if !self.board_actions().is_empty() {
                return Err(Illegal::MovesAvailable);
            }
        }

        self.status = Status::Ended;
        self.winner = match reason {
            EndReason::TimeoutGameTie => None,
            _ => Some(loser.opponent()),
        };
        self.draw_offer_by = None;
        self.ply += 1;
        Ok(())
    }

    /// Hand the move to the opponent after a board action
    fn end_turn(&mut self) {
        let mover = self.turn;
        self.turn = mover.opponent();
        self.ply += 1;
        self.draw_offer_by = None;
        if self.draw_offer_blocked == Some(mover) {
            self.draw_offer_blocked = None;
        }
    }
}

// ============================================================================
// DONATION AND SPLIT HELPERS
// ============================================================================

/// What stays behind when `donor` gives `donate` from its primary.
/// `None` if the donation is not allowed; `Some(None)` if the cell empties.
fn donor_remainder(donor: &Unit, donate: u8) -> Option<Option<Unit>> {
    if donate == 0 || donate > donor.primary {
        return None;
    }
    if donor.tribun {
        // a tribun moves whole or not at all
        return (donate == donor.primary).then_some(None);
    }

    let primary = donor.primary - donate;
    if !is_legal_height(primary) || !satisfies_sp(primary, donor.secondary) {
        return None;
    }
    if primary == 0 {
        return Some(None);
    }
    Some(Some(Unit { primary, ..*donor }))
}

fn valid_donations(donor: &Unit) -> impl Iterator<Item = u8> + '_ {
    (1..=MAX_HEIGHT).filter(move |&donate| donor_remainder(donor, donate).is_some())
}

/// Unit left on the origin after a split, or why the split is malformed
fn split_remainder(unit: &Unit, heights: &[u8; 6]) -> Result<Option<Unit>, &'static str> {
    if heights.iter().any(|&h| !is_legal_height(h)) {
        return Err("illegal height");
    }
    let moved: u16 = heights.iter().map(|&h| u16::from(h)).sum();
    if moved > u16::from(unit.primary) {
        return Err("heights exceed the primary");
    }

    let primary = unit.primary - moved as u8;
    if !is_legal_height(primary) {
        return Err("remainder is not a legal height");
    }
    if !satisfies_sp(primary, unit.secondary) {
        return Err("remainder cannot carry the secondary");
    }

    let placed = heights.iter().filter(|&&h| h > 0).count();
    let stacks = placed + usize::from(primary > 0);
    if stacks < 2 {
        return Err("fewer than two stacks");
    }

    Ok((primary > 0).then_some(Unit { primary, ..*unit }))
}

/// Depth-first search over the six directions; each level picks a
/// height for one direction within the remaining budget.
fn split_search(
    unit: &Unit,
    open: &[bool; 6],
    dir: usize,
    budget: u8,
    heights: &mut [u8; 6],
    plans: &mut Vec<[u8; 6]>,
) {
    if dir == heights.len() {
        if split_remainder(unit, heights).is_ok() {
            plans.push(*heights);
        }
        return;
    }

    for &height in &HEIGHTS {
        if height > budget || (height > 0 && !open[dir]) {
            break;
        }
        heights[dir] = height;
        split_search(unit, open, dir + 1, budget - height, heights, plans);
    }
    heights[dir] = 0;
}

/// Leaf count of the board-action tree to `depth`
pub fn perft(state: &GameState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    state
        .legal_actions()
        .into_iter()
        .filter(|&word| is_board_action(word))
        .filter_map(|word| state.apply_action(word).ok())
        .map(|next| perft(&next, depth - 1))
        .sum()
}

// ============================================================================
// TESTS
// ============================================================================
