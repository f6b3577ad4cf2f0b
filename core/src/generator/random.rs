use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// How mine positions are drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Sampling {
    /// Draw random coordinates, discarding ones already taken.
    #[default]
    Rejection,
    /// Draw distinct cell indices in one pass, for boards close to full.
    IndexSample,
}

/// Purely random mine placement, no cell is guaranteed safe.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RandomBoardGenerator {
    sampling: Sampling,
}

impl RandomBoardGenerator {
    pub fn new(sampling: Sampling) -> Self {
        Self { sampling }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(&self, config: BoardConfig, seed: u64) -> Result<Board> {
        let total_cells = config.total_cells();
        if config.mines == 0 || config.mines >= total_cells {
            log::warn!(
                "Cannot place {} mines on {} cells",
                config.mines,
                total_cells
            );
            return Err(GameError::MineCountOutOfRange);
        }

        let mut rng = SmallRng::seed_from_u64(seed);
        let (width, height) = config.size;
        let wanted = usize::from(config.mines);

        let mines: Vec<Coord2> = match self.sampling {
            Sampling::Rejection => {
                let mut taken = BTreeSet::new();
                let mut mines = Vec::with_capacity(wanted);
                let mut draws = 0usize;
                while mines.len() < wanted {
                    let coords = (rng.random_range(0..width), rng.random_range(0..height));
                    draws += 1;
                    if taken.insert(coords) {
                        mines.push(coords);
                    }
                }
                log::trace!("placed {} mines in {} draws", wanted, draws);
                mines
            }
            Sampling::IndexSample => {
                rand::seq::index::sample(&mut rng, total_cells.into(), wanted)
                    .into_iter()
                    .map(|index| {
                        let x = index % usize::from(width);
                        let y = index / usize::from(width);
                        // both below the side lengths
                        (x as Coord, y as Coord)
                    })
                    .collect()
            }
        };

        log::debug!(
            "generated {}x{} board with {} mines, seed {}",
            width,
            height,
            mines.len(),
            seed
        );
        check_generated(Board::from_mine_coords(config.size, &mines)?, config)
    }
}
