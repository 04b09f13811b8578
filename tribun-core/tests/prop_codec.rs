//! Property-based tests for the codecs: cell indices, unit bytes and
//! action words.

use proptest::prelude::*;

use tribun_core::board::{decode, on_board};
use tribun_core::unit::is_legal_height;
use tribun_core::{normalize, Action, Cid, Color, Unit, HEIGHTS};

fn any_unit() -> impl Strategy<Value = Unit> {
    (any::<bool>(), any::<bool>(), 0u8..=8, 0u8..=8).prop_map(|(black, tribun, p, s)| Unit {
        color: if black { Color::Black } else { Color::White },
        tribun,
        primary: p,
        secondary: s,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Every on-board coordinate survives encode then decode.
    #[test]
    fn prop_cid_bijection(x in -5i8..=5, y in -5i8..=5) {
        match Cid::encode(x, y) {
            Ok(cid) => {
                prop_assert!(on_board(x, y));
                prop_assert_eq!(decode(cid.raw()).unwrap(), (x, y));
            }
            Err(_) => prop_assert!(!on_board(x, y)),
        }
    }

    /// Normalization is idempotent and lands on a normal unit.
    #[test]
    fn prop_normalize_idempotent(unit in any_unit()) {
        if let Some(once) = normalize(unit) {
            prop_assert!(once.is_normal());
            prop_assert!(is_legal_height(once.primary) && once.primary > 0);
            prop_assert_eq!(normalize(once), Some(once));
        }
    }

    /// A normal unit survives the byte codec.
    #[test]
    fn prop_unit_byte_round_trip(unit in any_unit()) {
        if let Some(unit) = normalize(unit) {
            prop_assert_eq!(Unit::from_byte(unit.to_byte()).unwrap(), Some(unit));
        }
    }

    /// Any byte with no reserved code decodes, and re-encodes to itself
    /// unless it spells an empty cell.
    #[test]
    fn prop_unit_byte_decode(byte in any::<u8>()) {
        if let Ok(Some(unit)) = Unit::from_byte(byte) {
            prop_assert!(HEIGHTS.contains(&unit.primary));
            prop_assert_eq!(unit.to_byte(), byte);
        }
    }

    /// Every word that decodes re-encodes to the same bits.
    #[test]
    fn prop_action_word_round_trip(word in any::<u32>()) {
        if let Ok(action) = Action::decode(word) {
            prop_assert_eq!(action.encode(), word);
            prop_assert_eq!(Action::decode(action.encode()).unwrap(), action);
        }
    }

    /// Moves between any two board cells round-trip.
    #[test]
    fn prop_move_round_trip(from in 0u8..121, to in 0u8..121, secondary in any::<bool>()) {
        if let (Ok(from), Ok(to)) = (Cid::new(from), Cid::new(to)) {
            let part = if secondary { tribun_core::Part::Secondary } else { tribun_core::Part::Primary };
            let action = Action::Move { from, to, part };
            prop_assert_eq!(Action::decode(action.encode()).unwrap(), action);
        }
    }
}
