use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Mine count must leave at least one safe cell and place at least one mine")]
    MineCountOutOfRange,
    #[error("Mine list does not match the mines on the board")]
    InconsistentMines,
}

pub type Result<T> = core::result::Result<T, GameError>;
