use crate::types::has_size;
use crate::*;
pub use preset::*;
pub use random::*;

mod preset;
mod random;

pub trait BoardGenerator {
    /// Builds a board for `config`. Random strategies derive every choice from `seed`.
    fn generate(&self, config: BoardConfig, seed: u64) -> Result<Board>;
}

/// Construction check on generator output.
fn check_generated(board: Board, config: BoardConfig) -> Result<Board> {
    if board.size() != config.size || !has_size(board.tiles(), config.size) {
        log::error!(
            "Generated board is {:?} but {:?} was requested",
            board.size(),
            config.size
        );
        return Err(GameError::InvalidBoardShape);
    }
    Ok(board)
}
