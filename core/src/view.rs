use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// What the client may know about one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub position: Position,
    pub state: CellState,
    /// Only present on revealed safe cells.
    pub adjacent_mines: Option<u8>,
    /// Only set on the mine that ended the game.
    pub mine: bool,
}

impl CellView {
    pub const fn hidden(position: Position) -> Self {
        Self {
            position,
            state: CellState::Hidden,
            adjacent_mines: None,
            mine: false,
        }
    }
}

/// Session snapshot sent to clients. Never carries the position of a mine that has not been revealed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub rows: Coord,
    pub columns: Coord,
    pub mines: CellCount,
    pub flags: CellCount,
    pub mines_left: i32,
    pub status: GameStatus,
    pub elapsed_secs: u32,
    pub difficulty: Difficulty,
    /// Row-major.
    pub cells: Vec<CellView>,
}

impl BoardView {
    pub fn from_session(session: &GameSession) -> Self {
        let mut view = Self::from_board(session.board());
        view.elapsed_secs = session.elapsed_secs();
        view.difficulty = session.difficulty();
        view
    }

    pub fn from_board(board: &Board) -> Self {
        let (rows, columns) = board.size();
        let mut cells = Vec::with_capacity(usize::from(board.config().total_cells()));

        for row in 0..rows {
            for column in 0..columns {
                let coords = (row, column);
                let state = board.cell_state(coords);
                cells.push(CellView {
                    position: coords.into(),
                    state,
                    adjacent_mines: board.clue_at(coords),
                    mine: board.triggered_mine() == Some(coords),
                });
            }
        }

        Self {
            rows,
            columns,
            mines: board.mine_count(),
            flags: board.flag_count(),
            mines_left: board.mines_left(),
            status: board.status(),
            elapsed_secs: 0,
            difficulty: Difficulty::of(board.config()),
            cells,
        }
    }

    /// A fresh, fully hidden board of `config`.
    pub fn blank(config: GameConfig) -> Self {
        let (rows, columns) = config.size();
        let cells = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| CellView::hidden(Position::new(row, column))))
            .collect();

        Self {
            rows,
            columns,
            mines: config.mines,
            flags: 0,
            mines_left: config.mines.into(),
            status: GameStatus::Pending,
            elapsed_secs: 0,
            difficulty: Difficulty::of(config),
            cells,
        }
    }

    pub fn config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.rows, self.columns, self.mines)
    }

    pub fn contains(&self, (row, column): Coord2) -> bool {
        row < self.rows && column < self.columns
    }

    pub fn cell(&self, coords: Coord2) -> Option<&CellView> {
        if !self.contains(coords) {
            return None;
        }
        self.cells.get(self.index(coords))
    }

    /// Moves a cell to `state`, keeping the flag counters consistent.
    ///
    /// Revealed cells never change again. A cell revealed here has no count until the next authoritative
    /// snapshot. Returns whether anything changed.
    pub fn set_state(&mut self, coords: Coord2, state: CellState) -> bool {
        if !self.contains(coords) {
            return false;
        }

        let index = self.index(coords);
        let Some(cell) = self.cells.get_mut(index) else {
            return false;
        };
        let previous = cell.state;
        if previous == state || previous == CellState::Revealed {
            return false;
        }
        cell.state = state;

        match (previous, state) {
            (CellState::Flagged, _) => self.flags = self.flags.saturating_sub(1),
            (_, CellState::Flagged) => self.flags = self.flags.saturating_add(1),
            _ => {}
        }
        self.mines_left = i32::from(self.mines) - i32::from(self.flags);
        true
    }

    fn index(&self, (row, column): Coord2) -> usize {
        usize::from(row) * usize::from(self.columns) + usize::from(column)
    }
}

impl PlayerView for BoardView {
    fn dimensions(&self) -> Coord2 {
        (self.rows, self.columns)
    }

    fn state_at(&self, coords: Coord2) -> CellState {
        self.cell(coords).map_or(CellState::Hidden, |cell| cell.state)
    }

    fn clue_at(&self, coords: Coord2) -> Option<u8> {
        self.cell(coords)
            .filter(|cell| cell.state == CellState::Revealed)
            .and_then(|cell| cell.adjacent_mines)
    }
}
