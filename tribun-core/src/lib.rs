//! TRIBUN Core - Rules engine
//!
//! This crate is the authoritative arbiter of the game:
//! - Board geometry (121-slot cell index over a radius-5 hex grid)
//! - Stacked units, their byte codec and normalization
//! - 32-bit action words
//! - Movement and attack reachability per height class
//! - Combined attack resolution
//! - Legal action enumeration and state transition

pub mod action;
pub mod attack;
pub mod board;
pub mod error;
pub mod game;
pub mod reach;
pub mod snapshot;
pub mod unit;

// Re-exports for convenient access
pub use action::{Action, DrawAction, EndReason, Part, SymConfig};
pub use board::{pack_board, unpack_board, Board, Cid, Coord, BOARD_RADIUS, CELLS, DIRECTIONS};
pub use error::{Error, Illegal};
pub use game::{perft, GameState, Status};
pub use snapshot::Snapshot;
pub use unit::{normalize, Color, Unit, HEIGHTS};

/// Sorted, distinct legal action words for `state`
pub fn generate_legal_actions(state: &GameState) -> Vec<u32> {
    state.legal_actions()
}

/// Validate and apply one action word
pub fn apply_action(state: &GameState, word: u32) -> Result<GameState, Error> {
    state.apply_action(word)
}
