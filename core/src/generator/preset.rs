use alloc::vec::Vec;

use super::*;

/// Places a fixed list of mines, ignoring the seed.
#[derive(Clone, Debug, PartialEq)]
pub struct PresetBoardGenerator {
    mines: Vec<Coord2>,
}

impl PresetBoardGenerator {
    pub fn new(mines: Vec<Coord2>) -> Self {
        Self { mines }
    }
}

impl BoardGenerator for PresetBoardGenerator {
    fn generate(&self, config: BoardConfig, _seed: u64) -> Result<Board> {
        check_generated(Board::from_mine_coords(config.size, &self.mines)?, config)
    }
}
