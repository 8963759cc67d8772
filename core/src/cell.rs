use serde::{Deserialize, Serialize};

use crate::Coord2;

/// Player-visible state of a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellState {
    Hidden,
    Revealed,
    Flagged,
}

impl CellState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Full engine-side description of a cell, including what the player cannot see.
///
/// Before the first reveal the mine layout does not exist yet, so every cell reports
/// `is_mine == false` and a zero count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub position: Coord2,
    pub is_mine: bool,
    pub adjacent_mine_count: u8,
    pub state: CellState,
}
