//! JSON snapshot of a game for transport
//!
//! The board travels as base64 of its 121 packed unit bytes.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::Error;
use crate::game::{GameState, Status};
use crate::unit::Color;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub board: String,
    pub turn: Color,
    pub ply: u32,
    pub draw_offer_by: Option<Color>,
    pub draw_offer_blocked: Option<Color>,
    pub status: Status,
    pub winner: Option<Color>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Snapshot, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_state(self) -> Result<GameState, Error> {
        GameState::try_from(self)
    }
}

impl From<&GameState> for Snapshot {
    fn from(state: &GameState) -> Self {
        Self {
            board: state.board().to_base64(),
            turn: state.turn(),
            ply: state.ply(),
            draw_offer_by: state.draw_offer_by(),
            draw_offer_blocked: state.draw_offer_blocked(),
            status: state.status(),
            winner: state.winner(),
        }
    }
}

impl TryFrom<Snapshot> for GameState {
    type Error = Error;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        let board = Board::from_base64(&snapshot.board)?;
        GameState::from_parts(
            board,
            snapshot.turn,
            snapshot.ply,
            snapshot.draw_offer_by,
            snapshot.draw_offer_blocked,
            snapshot.status,
            snapshot.winner,
        )
    }
}
