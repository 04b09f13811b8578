//! Error taxonomy for the rules engine

use crate::unit::Color;

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("coordinate ({x}, {y}) is outside the board")]
    OutOfRange { x: i8, y: i8 },

    #[error("cell index {0} is not a board cell")]
    CidOutOfRange(u8),

    #[error("invalid unit byte {0:#04x}")]
    InvalidUnitByte(u8),

    #[error("malformed action word {word:#010x}: {reason}")]
    MalformedAction { word: u32, reason: &'static str },

    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("illegal action {word:#010x}: {reason}")]
    IllegalAction { word: u32, reason: Illegal },

    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Rule that rejected the action, if this is an `IllegalAction`
    pub fn illegal_reason(&self) -> Option<&Illegal> {
        match self {
            Error::IllegalAction { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Rule violated by a rejected action
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Illegal {
    #[error("the game has already ended")]
    GameOver,

    #[error("it is {0:?}'s turn")]
    WrongTurn(Color),

    #[error("no unit on the acting cell")]
    EmptyCell,

    #[error("the acting unit belongs to the opponent")]
    NotYourUnit,

    #[error("the unit has no such sub-unit")]
    NoSuchPart,

    #[error("destination cell is occupied")]
    DestinationOccupied,

    #[error("destination is off the board")]
    OffBoard,

    #[error("target is not reachable by that sub-unit")]
    Unreachable,

    #[error("target cell holds no enemy unit")]
    NotAnEnemy,

    #[error("a tribun can only be attacked with ATTACK_TRIBUN")]
    TargetIsTribun,

    #[error("target is not a tribun")]
    TargetNotTribun,

    #[error("declared winner is not the attacking color")]
    WrongWinner,

    #[error("attack sum cannot kill the target with that attacker")]
    InsufficientAttack,

    #[error("no attack combination liberates the target")]
    CannotLiberate,

    #[error("damage of {0} is not achievable")]
    DamageUnavailable(u8),

    #[error("enslave conditions are not met")]
    CannotEnslave,

    #[error("combine donors are invalid")]
    BadDonors,

    #[error("donation of {0} is not valid for that donor")]
    BadDonation(u8),

    #[error("combined height {0} is not a legal height")]
    BadCombinedHeight(u8),

    #[error("a tribun cannot take part in that action")]
    TribunNotAllowed,

    #[error("split is malformed: {0}")]
    BadSplit(&'static str),

    #[error("unit has no secondary to discard")]
    NoSecondary,

    #[error("draw action does not match the pending offer state")]
    DrawStateMismatch,

    #[error("draw offers by {0:?} are blocked")]
    DrawOfferBlocked(Color),

    #[error("the side to move still has legal actions")]
    MovesAvailable,
}
