use kvsweep_core::{GameError, GameStatus};
use kvsweep_protocol::{ErrorBody, RequestError, StateView};
use thiserror::Error;

use crate::status_view;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend failure on {key}: {message}")]
    Backend { key: String, message: String },
    #[error("Could not encode or decode stored value")]
    Codec(#[from] serde_json::Error),
    #[error("Could not access store file")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("Invalid position ({x}, {y})")]
    InvalidPosition { x: i64, y: i64 },
    #[error("Game {0} not found")]
    NotFound(String),
    #[error("Game is already finished ({status})")]
    GameFinished {
        status: GameStatus,
        /// Final state, echoed back to the client.
        state: Box<StateView>,
    },
    #[error("Inconsistent game state: {0}")]
    Construction(#[from] GameError),
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-bounds input.
    Validation,
    /// Unknown game or a move against a finished one.
    State,
    /// Generated or stored data breaks a board invariant.
    Construction,
    /// Backend read or write failure.
    Store,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Request(_) | Self::InvalidPosition { .. } => ErrorKind::Validation,
            Self::NotFound(_) | Self::GameFinished { .. } => ErrorKind::State,
            Self::Construction(_) => ErrorKind::Construction,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Body returned to clients. Construction and store failures share a
    /// generic message so backend details stay internal.
    pub fn to_body(&self) -> ErrorBody {
        let error = match self {
            Self::Request(err) => err.to_string(),
            Self::InvalidPosition { .. } => "Invalid coordinates".to_owned(),
            Self::NotFound(_) => "Game not found".to_owned(),
            Self::GameFinished { status, state } => {
                return ErrorBody {
                    error: "Game is already finished".to_owned(),
                    status: Some(status_view(*status)),
                    state: Some(StateView::clone(state)),
                };
            }
            Self::Construction(_) | Self::Store(_) => "Internal server error".to_owned(),
        };
        ErrorBody {
            error,
            status: None,
            state: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
