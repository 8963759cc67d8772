use crate::*;
pub use random::*;

mod random;

pub trait LayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout;
}

/// How much of the first revealed area is kept free of mines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FirstMovePolicy {
    SimpleSafe,
    SafeNeighborhood,
}

/// Builds an unfilled board; mines are placed when the first reveal position is known.
pub fn generate(rows: u32, columns: u32, mines: u32, seed: u64) -> Result<Board> {
    let config = GameConfig::new(rows, columns, mines)?;
    log::debug!(
        "new board {}x{} with {} mines, seed {:#x}",
        config.rows,
        config.columns,
        config.mines,
        seed
    );
    Ok(Board::new(config, seed))
}
