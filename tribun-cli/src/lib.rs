//! TRIBUN CLI commands
//!
//! Commands:
//! - legal: List legal actions for a snapshot or the opening
//! - decode: Decode one action word
//! - perft: Count action-tree leaves per depth
//! - playout: Run seeded random games

pub mod config;
pub mod inspect;
pub mod playout;

pub use config::PlayoutConfig;
