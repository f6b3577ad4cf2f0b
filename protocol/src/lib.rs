//! JSON shapes exchanged with the request layer and written to the key-value store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ongoing,
    Won,
    Lost,
}

/// Board, masks and mines, all rows indexed `[y][x]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    /// `-1` for a mine, otherwise the adjacent mine count.
    pub board: Vec<Vec<i8>>,
    pub revealed: Vec<Vec<bool>>,
    pub flags: Vec<Vec<bool>>,
    /// `[x, y]` pairs.
    pub mines: Vec<[u8; 2]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecordView {
    pub id: String,
    pub status: Status,
    pub state: StateView,
    /// Creation time in unix milliseconds.
    pub timestamp: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing game_id")]
    MissingGameId,
    #[error("Invalid coordinates")]
    InvalidCoordinates,
}

/// A reveal or flag move. Coordinates are kept raw until [`MoveRequest::coords`] checks them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub x: Value,
    #[serde(default)]
    pub y: Value,
}

impl MoveRequest {
    pub fn game_id(&self) -> Result<&str, RequestError> {
        if self.game_id.is_empty() {
            Err(RequestError::MissingGameId)
        } else {
            Ok(&self.game_id)
        }
    }

    pub fn coords(&self) -> Result<(i64, i64), RequestError> {
        match (integer(&self.x), integer(&self.y)) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(RequestError::InvalidCoordinates),
        }
    }
}

/// Integral JSON numbers, including floats such as `3.0`.
fn integer(value: &Value) -> Option<i64> {
    let number = value.as_number()?;
    if let Some(int) = number.as_i64() {
        return Some(int);
    }
    let float = number.as_f64()?;
    (float.is_finite() && float.fract() == 0.0).then_some(float as i64)
}

/// Optional board parameters, fractional values are floored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewGameRequest {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub mine_count: Option<f64>,
}

impl NewGameRequest {
    /// `(width, height, mine_count)` floored, non-finite values dropped.
    pub fn floored(&self) -> (Option<i64>, Option<i64>, Option<i64>) {
        let floor = |value: Option<f64>| {
            value
                .filter(|value| value.is_finite())
                .map(|value| value.floor() as i64)
        };
        (floor(self.width), floor(self.height), floor(self.mine_count))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameResponse {
    pub game_id: String,
    #[serde(flatten)]
    pub state: StateView,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    pub status: Status,
    #[serde(flatten)]
    pub state: StateView,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Final status when a move targets a finished game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Final board flattened beside `status` for finished games.
    #[serde(flatten)]
    pub state: Option<StateView>,
}
