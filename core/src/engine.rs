use alloc::collections::VecDeque;
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Pending,
    Active,
    Victory,
    Defeat,
}

impl GameStatus {
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A single game board: visibility grid, deferred mine layout and the status it drives.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    config: GameConfig,
    seed: u64,
    layout: Option<MineLayout>,
    cells: Array2<CellState>,
    revealed_count: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    status: GameStatus,
    triggered_mine: Option<Coord2>,
}

impl Board {
    /// An unfilled board; the layout is generated from `seed` on the first reveal.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            layout: None,
            cells: Array2::default(config.size().to_nd_index()),
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            status: Default::default(),
            triggered_mine: None,
        }
    }

    /// A board with a fixed layout, used for replays and tests.
    pub fn with_layout(layout: MineLayout) -> Result<Self> {
        let config = layout.game_config().validate()?;
        let mut board = Self::new(config, 0);
        board.layout = Some(layout);
        Ok(board)
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Whether the mine layout exists yet.
    pub fn is_placed(&self) -> bool {
        self.layout.is_some()
    }

    pub fn mine_count(&self) -> CellCount {
        self.config.mines
    }

    pub fn flag_count(&self) -> CellCount {
        self.flagged_count.0
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    pub fn mines_left(&self) -> i32 {
        i32::from(self.config.mines) - i32::from(self.flagged_count.0)
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (rows, columns) = self.size();
        if coords.0 < rows && coords.1 < columns {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub fn cell_state(&self, coords: Coord2) -> CellState {
        self.cells[coords.to_nd_index()]
    }

    pub fn has_mine_at(&self, coords: Coord2) -> bool {
        self.layout
            .as_ref()
            .is_some_and(|layout| layout.contains_mine(coords))
    }

    pub fn cell(&self, coords: Coord2) -> Result<Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(Cell {
            position: coords,
            is_mine: self.has_mine_at(coords),
            adjacent_mine_count: self
                .layout
                .as_ref()
                .map_or(0, |layout| layout.adjacent_mine_count(coords)),
            state: self.cell_state(coords),
        })
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_active()?;

        Ok(match self.cells[coords.to_nd_index()] {
            CellState::Hidden => {
                self.cells[coords.to_nd_index()] = CellState::Flagged;
                self.flagged_count += 1;
                MarkOutcome::Flagged
            }
            CellState::Flagged => {
                self.cells[coords.to_nd_index()] = CellState::Hidden;
                self.flagged_count -= 1;
                MarkOutcome::Unflagged
            }
            CellState::Revealed => return Err(GameError::InvalidTransition),
        })
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        if !matches!(self.cells[coords.to_nd_index()], CellState::Hidden) {
            return Ok(RevealOutcome::NoChange);
        }

        let layout = match self.layout.take() {
            Some(layout) => layout,
            None => self.place_mines(coords),
        };
        let outcome = self.reveal_single_cell(&layout, coords);
        self.layout = Some(layout);
        Ok(outcome)
    }

    /// Flags a hidden cell without any rule checks; callers are responsible for the status gate.
    pub(crate) fn flag_hidden(&mut self, coords: Coord2) -> bool {
        if matches!(self.cells[coords.to_nd_index()], CellState::Hidden) {
            self.cells[coords.to_nd_index()] = CellState::Flagged;
            self.flagged_count += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn check_not_finished(&self) -> Result<()> {
        if self.status.is_finished() {
            Err(GameError::GameOver)
        } else {
            Ok(())
        }
    }

    fn check_active(&self) -> Result<()> {
        match self.status {
            GameStatus::Active => Ok(()),
            GameStatus::Pending => Err(GameError::InvalidTransition),
            GameStatus::Victory | GameStatus::Defeat => Err(GameError::GameOver),
        }
    }

    /// Places mines around the first reveal.
    fn place_mines(&self, start: Coord2) -> MineLayout {
        let layout =
            RandomLayoutGenerator::new(self.seed, start, FirstMovePolicy::SafeNeighborhood)
                .generate(self.config);
        log::debug!(
            "placed {} mines, first reveal at {:?}",
            layout.mine_count(),
            start
        );
        layout
    }

    fn reveal_single_cell(&mut self, layout: &MineLayout, coords: Coord2) -> RevealOutcome {
        self.mark_started();

        if layout.contains_mine(coords) {
            self.cells[coords.to_nd_index()] = CellState::Revealed;
            self.triggered_mine = Some(coords);
            self.end_game(false);
            return RevealOutcome::HitMine(coords);
        }

        self.cells[coords.to_nd_index()] = CellState::Revealed;
        self.revealed_count += 1;

        if layout.adjacent_mine_count(coords) == 0 {
            let mut visited: Array2<bool> = Array2::default(self.cells.dim());
            visited[coords.to_nd_index()] = true;
            let mut to_visit = VecDeque::from([coords]);

            while let Some(visit_coords) = to_visit.pop_front() {
                for pos in self.cells.iter_neighbors(visit_coords) {
                    if visited[pos.to_nd_index()] {
                        continue;
                    }
                    visited[pos.to_nd_index()] = true;

                    // Flagged cells are never opened by a cascade, and zero cells have no mine neighbors.
                    if !matches!(self.cells[pos.to_nd_index()], CellState::Hidden) {
                        continue;
                    }

                    self.cells[pos.to_nd_index()] = CellState::Revealed;
                    self.revealed_count += 1;

                    if layout.adjacent_mine_count(pos) == 0 {
                        to_visit.push_back(pos);
                    }
                }
            }
        }

        if self.revealed_count == Saturating(layout.safe_cell_count()) {
            self.end_game(true);
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        }
    }

    fn mark_started(&mut self) {
        if matches!(self.status, GameStatus::Pending) {
            self.status = GameStatus::Active;
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.status.is_finished() {
            return;
        }

        self.status = if won {
            GameStatus::Victory
        } else {
            GameStatus::Defeat
        };
        log::debug!("game finished: {:?}", self.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::with_layout(MineLayout::from_mine_coords(size, mines).unwrap()).unwrap()
    }

    fn revealed(board: &Board) -> usize {
        board
            .cells
            .iter()
            .filter(|&&state| state == CellState::Revealed)
            .count()
    }

    #[test]
    fn reveal_hits_mine_and_sets_triggered_cell() {
        let mut board = board((2, 2), &[(0, 0)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine((0, 0)));
        assert_eq!(board.status(), GameStatus::Defeat);
        assert_eq!(board.triggered_mine(), Some((0, 0)));
        assert_eq!(board.cell_state((0, 0)), CellState::Revealed);
        assert_eq!(revealed(&board), 1);
    }

    #[test]
    fn mine_hit_does_not_cascade() {
        let mut board = board((4, 4), &[(3, 3), (0, 0)]);

        assert_eq!(board.reveal((1, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::HitMine((0, 0)));
        assert_eq!(revealed(&board), 2);
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut board = board((3, 3), &[(2, 2)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(board.cell((1, 1)).unwrap().adjacent_mine_count, 1);
        assert_eq!(board.cell_state((1, 1)), CellState::Revealed);
        assert_eq!(board.cell_state((2, 2)), CellState::Hidden);
        assert_eq!(board.status(), GameStatus::Victory);
    }

    #[test]
    fn flood_fill_stops_at_numbered_border() {
        // Mine column at column 2 splits a 3x5 board.
        let mut board = board((3, 5), &[(0, 2), (1, 2), (2, 2)]);

        assert_eq!(board.reveal((1, 0)).unwrap(), RevealOutcome::Revealed);

        for row in 0..3 {
            assert_eq!(board.cell_state((row, 0)), CellState::Revealed);
            assert_eq!(board.cell_state((row, 1)), CellState::Revealed);
            assert_eq!(board.cell_state((row, 3)), CellState::Hidden);
            assert_eq!(board.cell_state((row, 4)), CellState::Hidden);
        }
        assert_eq!(board.revealed_count(), 6);
    }

    #[test]
    fn zero_region_on_two_by_three_needs_second_reveal() {
        let mut board = board((2, 3), &[(0, 0)]);

        assert_eq!(board.reveal((1, 2)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(board.revealed_count(), 4);
        assert_eq!(board.cell_state((1, 0)), CellState::Hidden);
        assert_eq!(board.status(), GameStatus::Active);

        assert_eq!(board.reveal((1, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(board.status(), GameStatus::Victory);
    }

    #[test]
    fn cascade_skips_flagged_cells() {
        let mut board = board((3, 3), &[(2, 2)]);
        board.reveal((2, 1)).unwrap();
        board.toggle_flag((0, 1)).unwrap();

        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::Revealed);

        assert_eq!(board.cell_state((0, 1)), CellState::Flagged);
        assert_eq!(board.cell_state((1, 0)), CellState::Revealed);
        assert_eq!(board.cell_state((2, 0)), CellState::Revealed);
        // Only reachable through the flagged cell.
        assert_eq!(board.cell_state((0, 2)), CellState::Hidden);
        assert_eq!(board.status(), GameStatus::Active);
    }

    #[test]
    fn reveal_of_revealed_or_flagged_is_noop() {
        let mut board = board((3, 3), &[(0, 0)]);
        board.reveal((0, 1)).unwrap();
        board.toggle_flag((0, 0)).unwrap();
        let before = board.clone();

        assert_eq!(board.reveal((0, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board, before);
    }

    #[test]
    fn reveal_rejects_out_of_bounds() {
        let mut board = board((3, 3), &[(0, 0)]);
        assert_eq!(board.reveal((3, 0)), Err(GameError::OutOfBounds));
        assert_eq!(board.toggle_flag((0, 3)), Err(GameError::OutOfBounds));
    }

    #[test]
    fn flag_toggles_and_counts() {
        let mut board = board((3, 3), &[(0, 0)]);
        board.reveal((0, 1)).unwrap();

        assert_eq!(board.toggle_flag((2, 2)).unwrap(), MarkOutcome::Flagged);
        assert_eq!(board.toggle_flag((0, 0)).unwrap(), MarkOutcome::Flagged);
        assert_eq!(board.flag_count(), 2);
        assert_eq!(board.mines_left(), -1);

        assert_eq!(board.toggle_flag((2, 2)).unwrap(), MarkOutcome::Unflagged);
        assert_eq!(board.flag_count(), 1);
        assert_eq!(board.mines_left(), 0);
    }

    #[test]
    fn flag_rejects_revealed_and_pending() {
        let mut board = board((3, 3), &[(0, 0)]);
        assert_eq!(board.toggle_flag((1, 1)), Err(GameError::InvalidTransition));

        board.reveal((0, 1)).unwrap();
        let before = board.clone();
        assert_eq!(board.toggle_flag((0, 1)), Err(GameError::InvalidTransition));
        assert_eq!(board, before);
    }

    #[test]
    fn terminal_status_rejects_mutation() {
        let mut board = board((2, 2), &[(0, 0)]);
        board.reveal((0, 0)).unwrap();
        let before = board.clone();

        assert_eq!(board.reveal((1, 1)), Err(GameError::GameOver));
        assert_eq!(board.toggle_flag((1, 1)), Err(GameError::GameOver));
        assert_eq!(board, before);
    }

    #[test]
    fn first_reveal_places_mines_with_safe_neighborhood() {
        for seed in 0..50 {
            let mut board = generate(9, 9, 10, seed).unwrap();
            let outcome = board.reveal((4, 4)).unwrap();

            assert!(!matches!(outcome, RevealOutcome::HitMine(_)));
            assert!(board.is_placed());
            assert!(!board.has_mine_at((4, 4)));
            assert_eq!(board.cell((4, 4)).unwrap().adjacent_mine_count, 0);
            assert_eq!(board.mine_count(), 10);
        }
    }

    #[test]
    fn same_seed_and_first_reveal_replay_identically() {
        let mut a = generate(16, 16, 40, 1234).unwrap();
        let mut b = generate(16, 16, 40, 1234).unwrap();

        a.reveal((0, 15)).unwrap();
        b.reveal((0, 15)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn victory_iff_all_safe_cells_revealed() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.reveal((0, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(board.reveal((1, 0)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(board.status(), GameStatus::Active);
        assert_eq!(board.reveal((1, 1)).unwrap(), RevealOutcome::Won);
        assert_eq!(
            board.revealed_count(),
            board.config().total_cells() - board.mine_count()
        );
    }

    #[test]
    fn large_board_cascade_is_iterative() {
        let mut board = board((50, 50), &[(49, 49)]);

        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(board.revealed_count(), 2499);
    }
}
