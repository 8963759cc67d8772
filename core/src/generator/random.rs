use super::*;
use alloc::vec::Vec;

/// Generation strategy that can keep the starting cell, or its whole neighborhood, free of mines, but other than
/// that is purely random.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    start: Coord2,
    policy: FirstMovePolicy,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64, start: Coord2, policy: FirstMovePolicy) -> Self {
        Self {
            seed,
            start,
            policy,
        }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use FirstMovePolicy::*;
        use rand::prelude::*;

        let total_cells = config.total_cells();
        let neighborhood: Vec<Coord2> = NeighborIter::new(self.start, config.size()).collect();
        let neighborhood_size = 1 + neighborhood.len() as CellCount;

        // `GameConfig` leaves at least the start cell free; only the neighborhood may not fit.
        let actual_policy = match self.policy {
            SafeNeighborhood if config.mines + neighborhood_size > total_cells => {
                log::debug!("Board too small for a safe neighborhood, keeping only the start cell safe");
                SimpleSafe
            }
            policy => policy,
        };

        // Excluded cells are pre-marked so the placement loop skips them, then cleared again below.
        let mut mines: Array2<bool> = Array2::default(config.size().to_nd_index());
        let excluded: &[Coord2] = match actual_policy {
            SimpleSafe => &[],
            SafeNeighborhood => &neighborhood,
        };
        mines[self.start.to_nd_index()] = true;
        for &coords in excluded {
            mines[coords.to_nd_index()] = true;
        }
        let mut free_cells = total_cells - 1 - excluded.len() as CellCount;
        let mut mines_placed = 0;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (rows, columns) = config.size();
        while mines_placed < config.mines && free_cells > 0 {
            let mut place: CellCount = rng.random_range(0..free_cells);
            'scan: for row in 0..rows {
                for column in 0..columns {
                    let cell = &mut mines[(row, column).to_nd_index()];
                    if *cell {
                        continue;
                    }
                    if place == 0 {
                        *cell = true;
                        mines_placed += 1;
                        free_cells -= 1;
                        break 'scan;
                    }
                    place -= 1;
                }
            }
        }

        // undo to make safe cells
        mines[self.start.to_nd_index()] = false;
        for &coords in excluded {
            mines[coords.to_nd_index()] = false;
        }

        let layout = MineLayout::from_mine_mask(mines);
        // double check mine count
        if layout.mine_count() != config.mines {
            log::warn!(
                "Generated layout count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                config.mines
            );
        }
        layout
    }
}
