use thiserror::Error;

use crate::{CellCount, MAX_SIZE, MIN_SIZE};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Board size {rows}x{columns} is outside {MIN_SIZE}..={MAX_SIZE}")]
    InvalidSize { rows: u32, columns: u32 },
    #[error("Mine count {mines} is outside 1..={max}")]
    InvalidMineCount { mines: u32, max: CellCount },
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Move not allowed on this cell in the current state")]
    InvalidTransition,
    #[error("Coordinates outside of the board")]
    OutOfBounds,
    #[error("Game already ended, no new moves are accepted")]
    GameOver,
}

pub type Result<T> = core::result::Result<T, GameError>;
