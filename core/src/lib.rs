#![no_std]

extern crate alloc;

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use automark::*;
pub use cell::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use selection::*;
pub use session::*;
pub use types::*;
pub use view::*;

mod automark;
mod cell;
mod engine;
mod error;
mod generator;
mod selection;
mod session;
mod types;
mod view;

/// Smallest accepted number of rows or columns.
pub const MIN_SIZE: Coord = 2;
/// Largest accepted number of rows or columns.
pub const MAX_SIZE: Coord = 50;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub rows: Coord,
    pub columns: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(rows: Coord, columns: Coord, mines: CellCount) -> Self {
        Self {
            rows,
            columns,
            mines,
        }
    }

    /// Validates raw dimensions before narrowing them to board types.
    ///
    /// Sizes must lie in `MIN_SIZE..=MAX_SIZE` and the mine count in `1..=rows * columns - 2`, which leaves
    /// room for a safe first reveal and at least one more safe cell.
    pub fn new(rows: u32, columns: u32, mines: u32) -> Result<Self> {
        let size_range = u32::from(MIN_SIZE)..=u32::from(MAX_SIZE);
        if !size_range.contains(&rows) || !size_range.contains(&columns) {
            return Err(ConfigError::InvalidSize { rows, columns }.into());
        }

        // Both fit in `Coord` after the range check above.
        let (rows, columns) = (rows as Coord, columns as Coord);
        let max = Self::max_mines(rows, columns);
        if mines == 0 || mines > u32::from(max) {
            return Err(ConfigError::InvalidMineCount { mines, max }.into());
        }

        Ok(Self::new_unchecked(rows, columns, mines as CellCount))
    }

    pub const fn max_mines(rows: Coord, columns: Coord) -> CellCount {
        mult(rows, columns).saturating_sub(2)
    }

    /// Re-checks a config that may have been built with [`GameConfig::new_unchecked`] or deserialized.
    pub fn validate(&self) -> Result<Self> {
        Self::new(self.rows.into(), self.columns.into(), self.mines.into())
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.columns)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.columns)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells() - self.mines
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(16, 16, 40)
    }
}

/// Named board presets, `Custom` for anything else.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    pub const fn config(self) -> Option<GameConfig> {
        match self {
            Self::Beginner => Some(GameConfig::new_unchecked(9, 9, 10)),
            Self::Intermediate => Some(GameConfig::new_unchecked(16, 16, 40)),
            Self::Expert => Some(GameConfig::new_unchecked(16, 30, 99)),
            Self::Custom => None,
        }
    }

    pub fn of(config: GameConfig) -> Self {
        [Self::Beginner, Self::Intermediate, Self::Expert]
            .into_iter()
            .find(|difficulty| difficulty.config() == Some(config))
            .unwrap_or(Self::Custom)
    }
}

/// Placed mines together with the adjacency counts derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    adjacent: Array2<u8>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        // Boards hold at most `MAX_SIZE * MAX_SIZE` cells.
        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count() as CellCount;

        let mut adjacent: Array2<u8> = Array2::default(mine_mask.dim());
        for ((row, column), count) in adjacent.indexed_iter_mut() {
            let coords = (row as Coord, column as Coord);
            *count = mine_mask
                .iter_neighbors(coords)
                .filter(|&pos| mine_mask[pos.to_nd_index()])
                .count() as u8;
        }

        Self {
            mine_mask,
            adjacent,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::OutOfBounds);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn game_config(&self) -> GameConfig {
        let (rows, columns) = self.size();
        GameConfig::new_unchecked(rows, columns, self.mine_count)
    }

    pub fn size(&self) -> Coord2 {
        let (rows, columns) = self.mine_mask.dim();
        (rows as Coord, columns as Coord)
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len() as CellCount
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.adjacent[coords.to_nd_index()]
    }

    pub fn mine_coords(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.mine_mask
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((row, column), _)| (row as Coord, column as Coord))
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    Flagged,
    Unflagged,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    /// The revealed cell held a mine; carries the triggering position.
    HitMine(Coord2),
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_accepts_bounds() {
        assert!(GameConfig::new(2, 2, 1).is_ok());
        assert!(GameConfig::new(2, 2, 2).is_ok());
        assert!(GameConfig::new(50, 50, 2498).is_ok());
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        assert_eq!(
            GameConfig::new(1, 9, 3),
            Err(GameError::Configuration(ConfigError::InvalidSize {
                rows: 1,
                columns: 9
            }))
        );
        assert!(GameConfig::new(9, 51, 3).is_err());
        assert_eq!(
            GameConfig::new(2, 2, 3),
            Err(GameError::Configuration(ConfigError::InvalidMineCount {
                mines: 3,
                max: 2
            }))
        );
        assert!(GameConfig::new(9, 9, 0).is_err());
        assert!(GameConfig::new(300, 300, 10).is_err());
    }

    #[test]
    fn difficulty_presets_round_trip() {
        for difficulty in [
            Difficulty::Beginner,
            Difficulty::Intermediate,
            Difficulty::Expert,
        ] {
            let config = difficulty.config().unwrap();
            assert!(config.validate().is_ok());
            assert_eq!(Difficulty::of(config), difficulty);
        }
        assert_eq!(
            Difficulty::of(GameConfig::new_unchecked(5, 7, 3)),
            Difficulty::Custom
        );
    }

    #[test]
    fn layout_computes_adjacent_counts() {
        let layout = MineLayout::from_mine_coords((3, 3), &[(0, 0), (2, 2)]).unwrap();

        assert_eq!(layout.mine_count(), 2);
        assert_eq!(layout.safe_cell_count(), 7);
        assert_eq!(layout.adjacent_mine_count((1, 1)), 2);
        assert_eq!(layout.adjacent_mine_count((0, 2)), 0);
        assert_eq!(layout.adjacent_mine_count((0, 1)), 1);
        assert!(layout.contains_mine((2, 2)));
    }

    #[test]
    fn layout_rejects_out_of_bounds_mines() {
        assert_eq!(
            MineLayout::from_mine_coords((2, 2), &[(2, 0)]),
            Err(GameError::OutOfBounds)
        );
    }
}
