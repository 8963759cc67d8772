use crate::*;

/// One game from reset to reset: the board, its difficulty and the elapsed-time counter.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSession {
    board: Board,
    difficulty: Difficulty,
    elapsed_secs: u32,
}

impl GameSession {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self::with_board(Board::new(config, seed)))
    }

    pub fn with_board(board: Board) -> Self {
        Self {
            difficulty: Difficulty::of(board.config()),
            board,
            elapsed_secs: 0,
        }
    }

    /// Replaces this session with a fresh pending one.
    ///
    /// `None` keeps the current configuration. An invalid configuration leaves the session untouched.
    pub fn reset(&mut self, config: Option<GameConfig>, seed: u64) -> Result<()> {
        let config = config.unwrap_or(self.board.config());
        *self = Self::new(config, seed)?;
        Ok(())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Advances the timer by one second while the game is running; returns whether it moved.
    pub fn tick(&mut self) -> bool {
        if matches!(self.status(), GameStatus::Active) {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
            true
        } else {
            false
        }
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        self.board.reveal(coords)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        self.board.toggle_flag(coords)
    }

    pub fn auto_mark(&mut self, range: CellRange) -> Result<AutoMarkResult> {
        self.board.auto_mark(range)
    }

    pub fn auto_mark_selection(
        &mut self,
        rect: SelectionRect,
        geometry: BoardGeometry,
    ) -> Result<AutoMarkResult> {
        self.board.check_not_finished()?;
        let range = self.map_selection(rect, geometry);
        self.board.auto_mark(range)
    }

    /// Read-only, so it stays available after the game ends.
    pub fn map_selection(&self, rect: SelectionRect, geometry: BoardGeometry) -> CellRange {
        let (rows, columns) = self.board.size();
        map_selection_to_cells(rect, geometry.cell_size, geometry.origin, rows, columns)
    }

    pub fn view(&self) -> BoardView {
        BoardView::from_session(self)
    }
}
