use alloc::collections::BTreeSet;
use serde::{Deserialize, Serialize};

use crate::*;

/// What a player can know about a board: visibility plus the counts of revealed cells.
///
/// Implemented by the engine's [`Board`] and by the client-side [`BoardView`], so the same deduction runs on
/// both sides of the wire.
pub trait PlayerView {
    fn dimensions(&self) -> Coord2;

    fn state_at(&self, coords: Coord2) -> CellState;

    /// Adjacent mine count of a revealed safe cell, `None` for anything else.
    fn clue_at(&self, coords: Coord2) -> Option<u8>;
}

impl PlayerView for Board {
    fn dimensions(&self) -> Coord2 {
        self.size()
    }

    fn state_at(&self, coords: Coord2) -> CellState {
        self.cell_state(coords)
    }

    fn clue_at(&self, coords: Coord2) -> Option<u8> {
        let cell = self.cell(coords).ok()?;
        (cell.state == CellState::Revealed && !cell.is_mine).then_some(cell.adjacent_mine_count)
    }
}

/// Cells newly moved from hidden to flagged by one auto-mark pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoMarkResult {
    pub flagged: BTreeSet<Coord2>,
}

impl AutoMarkResult {
    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flagged.len()
    }
}

/// Single-cell deduction over `range`.
///
/// A revealed clue inside the range whose count equals its number of unrevealed neighbors has only mines around
/// it; its hidden neighbors that also lie inside the range are returned. Cells outside the range only serve as
/// context. One pass, no propagation between clues.
pub fn deduce_mines(view: &impl PlayerView, range: CellRange) -> BTreeSet<Coord2> {
    let size = view.dimensions();
    let range = range.clamped(size);
    let mut certain = BTreeSet::new();

    for coords in range.iter() {
        let Some(clue) = view.clue_at(coords) else {
            continue;
        };
        if clue == 0 {
            continue;
        }

        let unrevealed = NeighborIter::new(coords, size)
            .filter(|&pos| view.state_at(pos).is_unrevealed())
            .count();
        if usize::from(clue) != unrevealed {
            continue;
        }

        certain.extend(
            NeighborIter::new(coords, size)
                .filter(|&pos| view.state_at(pos) == CellState::Hidden)
                .filter(|&pos| range.contains(pos)),
        );
    }

    certain
}

impl Board {
    pub fn auto_mark(&mut self, range: CellRange) -> Result<AutoMarkResult> {
        self.check_not_finished()?;

        let mut result = AutoMarkResult::default();
        for coords in deduce_mines(&*self, range) {
            if self.flag_hidden(coords) {
                result.flagged.insert(coords);
            }
        }

        log::debug!("auto-mark over {:?} flagged {} cells", range, result.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::with_layout(MineLayout::from_mine_coords(size, mines).unwrap()).unwrap()
    }

    fn whole(board: &Board) -> CellRange {
        let (rows, columns) = board.size();
        CellRange::spanning((0, 0), (rows - 1, columns - 1))
    }

    #[test]
    fn flags_all_hidden_neighbors_when_count_matches() {
        // Row of four: mine, safe, mine, safe.
        let mut board = board((2, 4), &[(0, 0), (0, 2)]);
        board.reveal((1, 1)).unwrap();
        board.reveal((0, 1)).unwrap();
        board.reveal((1, 0)).unwrap();
        board.reveal((1, 2)).unwrap();

        let result = board.auto_mark(whole(&board)).unwrap();

        assert_eq!(result.flagged, BTreeSet::from([(0, 0), (0, 2)]));
        assert_eq!(board.cell_state((0, 0)), CellState::Flagged);
        assert_eq!(board.flag_count(), 2);
    }

    #[test]
    fn leaves_ambiguous_clues_alone() {
        let mut board = board((3, 3), &[(0, 0)]);
        board.reveal((1, 1)).unwrap();

        let result = board.auto_mark(whole(&board)).unwrap();

        assert!(result.is_empty());
        assert_eq!(board.flag_count(), 0);
    }

    #[test]
    fn second_pass_is_empty() {
        let mut board = board((2, 4), &[(0, 0), (0, 2)]);
        board.reveal((0, 1)).unwrap();
        board.reveal((1, 0)).unwrap();
        board.reveal((1, 1)).unwrap();

        let first = board.auto_mark(whole(&board)).unwrap();
        let second = board.auto_mark(whole(&board)).unwrap();

        assert!(!first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn never_flags_outside_range() {
        let mut board = board((2, 4), &[(0, 0), (0, 2)]);
        board.reveal((0, 1)).unwrap();
        board.reveal((1, 0)).unwrap();
        board.reveal((1, 1)).unwrap();

        // Only the clue column: (0,1) and (1,1). Its mines sit in columns 0 and 2.
        let result = board
            .auto_mark(CellRange::spanning((0, 1), (1, 1)))
            .unwrap();
        assert!(result.is_empty());

        let result = board
            .auto_mark(CellRange::spanning((0, 0), (1, 1)))
            .unwrap();
        assert_eq!(result.flagged, BTreeSet::from([(0, 0)]));
        assert_eq!(board.cell_state((0, 2)), CellState::Hidden);
    }

    #[test]
    fn existing_flags_count_as_unrevealed() {
        let mut board = board((2, 4), &[(0, 0), (0, 2)]);
        board.reveal((0, 1)).unwrap();
        board.reveal((1, 0)).unwrap();
        board.reveal((1, 1)).unwrap();
        board.reveal((1, 2)).unwrap();
        board.toggle_flag((0, 0)).unwrap();

        // (1,1) shows 2 with one flagged and one hidden neighbor left.
        let result = board.auto_mark(whole(&board)).unwrap();

        assert_eq!(result.flagged, BTreeSet::from([(0, 2)]));
        assert_eq!(board.flag_count(), 2);
        assert_eq!(board.status(), GameStatus::Active);
    }

    #[test]
    fn pending_board_marks_nothing() {
        let mut board = generate(9, 9, 10, 3).unwrap();
        assert!(board.auto_mark(whole(&board)).unwrap().is_empty());
        assert_eq!(board.status(), GameStatus::Pending);
    }

    #[test]
    fn rejected_after_game_over() {
        let mut board = board((2, 2), &[(0, 0)]);
        board.reveal((0, 0)).unwrap();

        assert_eq!(board.auto_mark(whole(&board)), Err(GameError::GameOver));
    }
}
