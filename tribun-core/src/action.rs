//! 32-bit action words
//!
//! Bits 31-28 hold the opcode, bits 27-0 the payload. Payload fields are
//! packed from bit 0 upward in declaration order:
//!
//! | Op | Name          | Payload                                        |
//! |----|---------------|------------------------------------------------|
//! | 0  | MOVE          | from(7) to(7) part(1)                          |
//! | 1  | KILL          | attacker(7) target(7) part(1)                  |
//! | 2  | LIBERATE      | target(7)                                      |
//! | 3  | DAMAGE        | target(7) amount-1(3)                          |
//! | 4  | ENSLAVE       | attacker(7) target(7)                          |
//! | 5  | COMBINE       | center(7) dirA(3) dirB(3) donA-1(3) donB-1(3)  |
//! | 6  | SYM_COMBINE   | center(7) config(2) donate-1(2)                |
//! | 7  | SPLIT         | actor(7) h0..h5 (3 each, height codes)         |
//! | 8  | BACKSTABB     | actor(7) dir(3)                                |
//! | 9  | ATTACK_TRIBUN | attacker(7) tribun(7) winner(1)                |
//! | 10 | DRAW          | actor(1) action(2)                             |
//! | 11 | END           | reason(2) loser(1)                             |
//!
//! On the wire a word is a 4-byte little-endian frame.

use serde::{Deserialize, Serialize};

use crate::board::Cid;
use crate::error::Error;
use crate::unit::{height_index, round_height, Color, HEIGHTS};

const OPCODE_SHIFT: u32 = 28;
const PAYLOAD_MASK: u32 = (1 << OPCODE_SHIFT) - 1;

pub const OP_MOVE: u32 = 0;
pub const OP_KILL: u32 = 1;
pub const OP_LIBERATE: u32 = 2;
pub const OP_DAMAGE: u32 = 3;
pub const OP_ENSLAVE: u32 = 4;
pub const OP_COMBINE: u32 = 5;
pub const OP_SYM_COMBINE: u32 = 6;
pub const OP_SPLIT: u32 = 7;
pub const OP_BACKSTABB: u32 = 8;
pub const OP_ATTACK_TRIBUN: u32 = 9;
pub const OP_DRAW: u32 = 10;
pub const OP_END: u32 = 11;

/// Opcode of a raw word
pub fn opcode(word: u32) -> u32 {
    word >> OPCODE_SHIFT
}

/// True for actions that act on the board (as opposed to DRAW and END)
pub fn is_board_action(word: u32) -> bool {
    opcode(word) <= OP_ATTACK_TRIBUN
}

/// Which sub-unit of a stack acts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Part {
    Primary = 0,
    Secondary = 1,
}

impl Part {
    pub const BOTH: [Part; 2] = [Part::Primary, Part::Secondary];
}

/// Donor layout of a symmetric combine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymConfig {
    /// All six neighbors
    Six = 0,
    /// Neighbors 0, 2, 4
    ThreeEven = 1,
    /// Neighbors 1, 3, 5
    ThreeOdd = 2,
}

impl SymConfig {
    pub const ALL: [SymConfig; 3] = [SymConfig::Six, SymConfig::ThreeEven, SymConfig::ThreeOdd];

    pub fn directions(self) -> &'static [u8] {
        match self {
            SymConfig::Six => &[0, 1, 2, 3, 4, 5],
            SymConfig::ThreeEven => &[0, 2, 4],
            SymConfig::ThreeOdd => &[1, 3, 5],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawAction {
    Offer = 0,
    Retract = 1,
    Accept = 2,
    Decline = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Resign = 0,
    NoLegalMoves = 1,
    TimeoutPlayer = 2,
    TimeoutGameTie = 3,
}

/// A decoded action word
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Move { from: Cid, to: Cid, part: Part },
    Kill { attacker: Cid, target: Cid, part: Part },
    Liberate { target: Cid },
    /// `amount` is the effective damage, 1-8
    Damage { target: Cid, amount: u8 },
    Enslave { attacker: Cid, target: Cid },
    /// Donations are 1-8; directions index `DIRECTIONS`
    Combine { center: Cid, dir_a: u8, dir_b: u8, donate_a: u8, donate_b: u8 },
    /// `donate` is 1-4
    SymCombine { center: Cid, config: SymConfig, donate: u8 },
    /// Height moved onto each neighbor direction; the rest stays put
    Split { actor: Cid, heights: [u8; 6] },
    Backstabb { actor: Cid, dir: u8 },
    AttackTribun { attacker: Cid, tribun: Cid, winner: Color },
    Draw { actor: Color, action: DrawAction },
    End { reason: EndReason, loser: Color },
}

// ============================================================================
// BIT PACKING
// ============================================================================

struct Packer {
    payload: u32,
    shift: u32,
}

impl Packer {
    fn new() -> Self {
        Self { payload: 0, shift: 0 }
    }

    fn put(mut self, value: u32, bits: u32) -> Self {
        self.payload |= (value & ((1 << bits) - 1)) << self.shift;
        self.shift += bits;
        self
    }

    fn cid(self, cid: Cid) -> Self {
        self.put(u32::from(cid.raw()), 7)
    }

    fn finish(self, op: u32) -> u32 {
        (op << OPCODE_SHIFT) | self.payload
    }
}

struct Unpacker {
    word: u32,
    payload: u32,
    shift: u32,
}

impl Unpacker {
    fn new(word: u32) -> Self {
        Self {
            word,
            payload: word & PAYLOAD_MASK,
            shift: 0,
        }
    }

    fn take(&mut self, bits: u32) -> u32 {
        let value = (self.payload >> self.shift) & ((1 << bits) - 1);
        self.shift += bits;
        value
    }

    fn malformed(&self, reason: &'static str) -> Error {
        Error::MalformedAction {
            word: self.word,
            reason,
        }
    }

    fn cid(&mut self) -> Result<Cid, Error> {
        let raw = self.take(7) as u8;
        Cid::new(raw).map_err(|_| self.malformed("cell id is not on the board"))
    }

    fn part(&mut self) -> Part {
        if self.take(1) == 0 {
            Part::Primary
        } else {
            Part::Secondary
        }
    }

    fn color(&mut self) -> Color {
        Color::from_bit(self.take(1))
    }

    fn dir(&mut self) -> Result<u8, Error> {
        let dir = self.take(3) as u8;
        if dir >= 6 {
            return Err(self.malformed("direction out of range"));
        }
        Ok(dir)
    }

    fn height(&mut self) -> Result<u8, Error> {
        let code = self.take(3) as usize;
        HEIGHTS
            .get(code)
            .copied()
            .ok_or_else(|| self.malformed("reserved height code"))
    }

    /// Reject words with bits set above the last field
    fn finish(self, action: Action) -> Result<Action, Error> {
        if self.payload >> self.shift != 0 {
            return Err(self.malformed("unused payload bits set"));
        }
        Ok(action)
    }
}

// ============================================================================
// ENCODE / DECODE
// ============================================================================

impl Action {
    pub fn opcode(&self) -> u32 {
        match self {
            Action::Move { .. } => OP_MOVE,
            Action::Kill { .. } => OP_KILL,
            Action::Liberate { .. } => OP_LIBERATE,
            Action::Damage { .. } => OP_DAMAGE,
            Action::Enslave { .. } => OP_ENSLAVE,
            Action::Combine { .. } => OP_COMBINE,
            Action::SymCombine { .. } => OP_SYM_COMBINE,
            Action::Split { .. } => OP_SPLIT,
            Action::Backstabb { .. } => OP_BACKSTABB,
            Action::AttackTribun { .. } => OP_ATTACK_TRIBUN,
            Action::Draw { .. } => OP_DRAW,
            Action::End { .. } => OP_END,
        }
    }

    pub fn encode(&self) -> u32 {
        let p = Packer::new();
        let p = match *self {
            Action::Move { from, to, part } => p.cid(from).cid(to).put(part as u32, 1),
            Action::Kill { attacker, target, part } => {
                p.cid(attacker).cid(target).put(part as u32, 1)
            }
            Action::Liberate { target } => p.cid(target),
            Action::Damage { target, amount } => {
                p.cid(target).put(u32::from(amount).wrapping_sub(1), 3)
            }
            Action::Enslave { attacker, target } => p.cid(attacker).cid(target),
            Action::Combine { center, dir_a, dir_b, donate_a, donate_b } => p
                .cid(center)
                .put(u32::from(dir_a), 3)
                .put(u32::from(dir_b), 3)
                .put(u32::from(donate_a).wrapping_sub(1), 3)
                .put(u32::from(donate_b).wrapping_sub(1), 3),
            Action::SymCombine { center, config, donate } => p
                .cid(center)
                .put(config as u32, 2)
                .put(u32::from(donate).wrapping_sub(1), 2),
            Action::Split { actor, heights } => {
                heights.iter().fold(p.cid(actor), |p, &h| {
                    let code = height_index(round_height(h)).unwrap_or(0);
                    p.put(u32::from(code), 3)
                })
            }
            Action::Backstabb { actor, dir } => p.cid(actor).put(u32::from(dir), 3),
            Action::AttackTribun { attacker, tribun, winner } => {
                p.cid(attacker).cid(tribun).put(winner.bit(), 1)
            }
            Action::Draw { actor, action } => p.put(actor.bit(), 1).put(action as u32, 2),
            Action::End { reason, loser } => p.put(reason as u32, 2).put(loser.bit(), 1),
        };
        p.finish(self.opcode())
    }

    pub fn decode(word: u32) -> Result<Action, Error> {
        let mut u = Unpacker::new(word);
        let action = match opcode(word) {
            OP_MOVE => Action::Move {
                from: u.cid()?,
                to: u.cid()?,
                part: u.part(),
            },
            OP_KILL => Action::Kill {
                attacker: u.cid()?,
                target: u.cid()?,
                part: u.part(),
            },
            OP_LIBERATE => Action::Liberate { target: u.cid()? },
            OP_DAMAGE => Action::Damage {
                target: u.cid()?,
                amount: u.take(3) as u8 + 1,
            },
            OP_ENSLAVE => Action::Enslave {
                attacker: u.cid()?,
                target: u.cid()?,
            },
            OP_COMBINE => Action::Combine {
                center: u.cid()?,
                dir_a: u.dir()?,
                dir_b: u.dir()?,
                donate_a: u.take(3) as u8 + 1,
                donate_b: u.take(3) as u8 + 1,
            },
            OP_SYM_COMBINE => {
                let center = u.cid()?;
                let config = match u.take(2) {
                    0 => SymConfig::Six,
                    1 => SymConfig::ThreeEven,
                    2 => SymConfig::ThreeOdd,
                    _ => return Err(u.malformed("reserved sym-combine config")),
                };
                Action::SymCombine {
                    center,
                    config,
                    donate: u.take(2) as u8 + 1,
                }
            }
            OP_SPLIT => {
                let actor = u.cid()?;
                let mut heights = [0u8; 6];
                for h in heights.iter_mut() {
                    *h = u.height()?;
                }
                Action::Split { actor, heights }
            }
            OP_BACKSTABB => Action::Backstabb {
                actor: u.cid()?,
                dir: u.dir()?,
            },
            OP_ATTACK_TRIBUN => Action::AttackTribun {
                attacker: u.cid()?,
                tribun: u.cid()?,
                winner: u.color(),
            },
            OP_DRAW => {
                let actor = u.color();
                let action = match u.take(2) {
                    0 => DrawAction::Offer,
                    1 => DrawAction::Retract,
                    2 => DrawAction::Accept,
                    _ => DrawAction::Decline,
                };
                Action::Draw { actor, action }
            }
            OP_END => {
                let reason = match u.take(2) {
                    0 => EndReason::Resign,
                    1 => EndReason::NoLegalMoves,
                    2 => EndReason::TimeoutPlayer,
                    _ => EndReason::TimeoutGameTie,
                };
                Action::End {
                    reason,
                    loser: u.color(),
                }
            }
            _ => return Err(u.malformed("unknown opcode")),
        };
        u.finish(action)
    }
}

/// 4-byte little-endian wire frame
pub fn to_frame(word: u32) -> [u8; 4] {
    word.to_le_bytes()
}

pub fn from_frame(frame: [u8; 4]) -> u32 {
    u32::from_le_bytes(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(x: i8, y: i8) -> Cid {
        Cid::encode(x, y).unwrap()
    }

    #[test]
    fn test_move_layout() {
        let word = Action::Move {
            from: cid(-5, -5),
            to: cid(0, 0),
            part: Part::Secondary,
        }
        .encode();
        // from = 0, to = 60 at bit 7, part at bit 14
        assert_eq!(word, (60 << 7) | (1 << 14));
    }

    #[test]
    fn test_opcode_nibble() {
        let word = Action::End {
            reason: EndReason::TimeoutGameTie,
            loser: Color::Black,
        }
        .encode();
        assert_eq!(opcode(word), OP_END);
        assert_eq!(word & PAYLOAD_MASK, 0b111);
        assert!(!is_board_action(word));
    }

    #[test]
    fn test_damage_amount_offset() {
        let word = Action::Damage { target: cid(0, 0), amount: 8 }.encode();
        assert_eq!((word >> 7) & 0x7, 7);
        assert_eq!(Action::decode(word).unwrap(), Action::Damage { target: cid(0, 0), amount: 8 });
    }

    #[test]
    fn test_split_uses_height_codes() {
        let action = Action::Split {
            actor: cid(1, 1),
            heights: [8, 0, 6, 0, 0, 1],
        };
        let word = action.encode();
        assert_eq!((word >> 7) & 0x7, 6);
        assert_eq!((word >> 13) & 0x7, 5);
        assert_eq!(Action::decode(word).unwrap(), action);
    }

    #[test]
    fn test_round_trip_samples() {
        let actions = [
            Action::Kill { attacker: cid(1, 0), target: cid(2, 1), part: Part::Primary },
            Action::Liberate { target: cid(-3, 0) },
            Action::Enslave { attacker: cid(0, 5), target: cid(1, 5) },
            Action::Combine { center: cid(0, 0), dir_a: 5, dir_b: 0, donate_a: 8, donate_b: 1 },
            Action::SymCombine { center: cid(2, 2), config: SymConfig::ThreeOdd, donate: 2 },
            Action::Backstabb { actor: cid(-1, -1), dir: 3 },
            Action::AttackTribun { attacker: cid(4, 4), tribun: cid(5, 5), winner: Color::Black },
            Action::Draw { actor: Color::White, action: DrawAction::Decline },
            Action::End { reason: EndReason::Resign, loser: Color::White },
        ];
        for action in actions {
            assert_eq!(Action::decode(action.encode()).unwrap(), action);
        }
    }

    #[test]
    fn test_decode_rejects_malformed() {
        // unknown opcode
        assert!(Action::decode(12 << OPCODE_SHIFT).is_err());
        // off-board cell 6
        assert!(Action::decode(OP_LIBERATE << OPCODE_SHIFT | 6).is_err());
        // backstabb direction 6
        let word = (OP_BACKSTABB << OPCODE_SHIFT) | (6 << 7) | 60;
        assert!(Action::decode(word).is_err());
        // sym-combine config 3
        let word = (OP_SYM_COMBINE << OPCODE_SHIFT) | (3 << 7) | 60;
        assert!(Action::decode(word).is_err());
        // split height code 7
        let word = (OP_SPLIT << OPCODE_SHIFT) | (7 << 7) | 60;
        assert!(Action::decode(word).is_err());
        // stray bit above a liberate payload
        let word = (OP_LIBERATE << OPCODE_SHIFT) | (1 << 20) | 60;
        assert!(Action::decode(word).is_err());
    }

    #[test]
    fn test_frame_is_little_endian() {
        let word = 0x1234_5678;
        assert_eq!(to_frame(word), [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(from_frame(to_frame(word)), word);
    }

    #[test]
    fn test_serde_tagged() {
        let action = Action::Backstabb { actor: cid(0, 0), dir: 2 };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"op":"backstabb","actor":60,"dir":2}"#);
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
