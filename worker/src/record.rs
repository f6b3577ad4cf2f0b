use kvsweep_core::{Board, Coord, GameError, GameStatus, GridState, Tile, ToNdIndex, iter_coords};
use kvsweep_protocol::{GameRecordView, MoveResponse, NewGameResponse, StateView, Status};
use ndarray::Array2;
use serde_json::Value;

use crate::{Result, StoreError};

/// A persisted game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameRecord {
    pub id: String,
    pub state: GridState,
    pub status: GameStatus,
    /// Creation time in unix milliseconds.
    pub timestamp: i64,
}

impl GameRecord {
    pub fn to_view(&self) -> GameRecordView {
        GameRecordView {
            id: self.id.clone(),
            status: status_view(self.status),
            state: state_view(&self.state),
            timestamp: self.timestamp,
        }
    }

    pub fn from_view(view: GameRecordView) -> std::result::Result<Self, GameError> {
        Ok(Self {
            id: view.id,
            state: state_from_view(view.state)?,
            status: status_from_view(view.status),
            timestamp: view.timestamp,
        })
    }

    pub fn to_new_game_response(&self) -> NewGameResponse {
        NewGameResponse {
            game_id: self.id.clone(),
            state: state_view(&self.state),
        }
    }

    pub fn to_move_response(&self) -> MoveResponse {
        MoveResponse {
            status: status_view(self.status),
            state: state_view(&self.state),
        }
    }

    pub(crate) fn encode(&self) -> Result<Value> {
        serde_json::to_value(self.to_view()).map_err(|err| StoreError::from(err).into())
    }

    pub(crate) fn decode(value: Value) -> Result<Self> {
        let view: GameRecordView = serde_json::from_value(value).map_err(StoreError::from)?;
        Ok(Self::from_view(view)?)
    }
}

pub fn status_view(status: GameStatus) -> Status {
    match status {
        GameStatus::Ongoing => Status::Ongoing,
        GameStatus::Won => Status::Won,
        GameStatus::Lost => Status::Lost,
    }
}

pub fn status_from_view(status: Status) -> GameStatus {
    match status {
        Status::Ongoing => GameStatus::Ongoing,
        Status::Won => GameStatus::Won,
        Status::Lost => GameStatus::Lost,
    }
}

pub fn state_view(state: &GridState) -> StateView {
    let board = state.board();
    StateView {
        board: rows(board.tiles(), |tile| tile.to_value()),
        revealed: rows(state.revealed(), |&revealed| revealed),
        flags: rows(state.flags(), |&flag| flag),
        mines: board.mines().iter().map(|&(x, y)| [x, y]).collect(),
    }
}

/// Rebuilds engine state from `[y][x]` rows, rejecting ragged or mismatched matrices.
pub fn state_from_view(view: StateView) -> std::result::Result<GridState, GameError> {
    let height = view.board.len();
    let width = view.board.first().map_or(0, Vec::len);
    let size = match (Coord::try_from(width), Coord::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(GameError::InvalidBoardShape),
    };

    let tiles = matrix(&view.board, size, |&value| Tile::from_value(value))?;
    let mines = view.mines.into_iter().map(|[x, y]| (x, y)).collect();
    let board = Board::from_parts(tiles, mines)?;
    let revealed = matrix(&view.revealed, size, |&revealed| Some(revealed))?;
    let flags = matrix(&view.flags, size, |&flag| Some(flag))?;

    GridState::from_parts(board, revealed, flags)
}

fn rows<T, U>(array: &Array2<T>, convert: impl Fn(&T) -> U) -> Vec<Vec<U>> {
    let (width, height) = array.dim();
    (0..height)
        .map(|y| (0..width).map(|x| convert(&array[[x, y]])).collect())
        .collect()
}

fn matrix<T, U: Default + Clone>(
    rows: &[Vec<T>],
    size: (Coord, Coord),
    convert: impl Fn(&T) -> Option<U>,
) -> std::result::Result<Array2<U>, GameError> {
    if rows.len() != usize::from(size.1) || rows.iter().any(|row| row.len() != usize::from(size.0)) {
        return Err(GameError::InvalidBoardShape);
    }
    let mut array = Array2::default(size.to_nd_index());
    for coords in iter_coords(size) {
        let value = &rows[usize::from(coords.1)][usize::from(coords.0)];
        array[coords.to_nd_index()] = convert(value).ok_or(GameError::InvalidBoardShape)?;
    }
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> GameRecord {
        let board = Board::from_mine_coords((5, 5), &[(0, 0), (3, 1)]).unwrap();
        let mut state = GridState::new(board);
        state.reveal((4, 4)).unwrap();
        state.toggle_flag((0, 0)).unwrap();
        GameRecord {
            id: "1700000000000".into(),
            state,
            status: GameStatus::Ongoing,
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn view_rows_are_indexed_by_y_then_x() {
        let view = sample().to_view();

        assert_eq!(view.state.board.len(), 5);
        assert_eq!(view.state.board[0][0], -1);
        assert_eq!(view.state.board[1][3], -1);
        assert_eq!(view.state.board[0][3], 1);
        assert!(view.state.flags[0][0]);
        assert!(view.state.revealed[4][4]);
        assert_eq!(view.state.mines, vec![[0, 0], [3, 1]]);
    }

    #[test]
    fn decode_restores_encoded_record() {
        let record = sample();

        let decoded = GameRecord::decode(record.encode().unwrap()).unwrap();

        assert_eq!(decoded, record);
    }

    #[test]
    fn ragged_masks_are_rejected() {
        let mut view = sample().to_view();
        view.state.revealed[2].pop();

        assert_eq!(
            GameRecord::from_view(view).unwrap_err(),
            GameError::InvalidBoardShape
        );
    }

    #[test]
    fn mine_list_must_match_board() {
        let mut view = sample().to_view();
        view.state.mines.pop();

        assert_eq!(
            GameRecord::from_view(view).unwrap_err(),
            GameError::InconsistentMines
        );
    }

    #[test]
    fn tampered_counts_are_rejected() {
        let mut view = sample().to_view();
        // (2, 2) borders only the mine at (3, 1)
        view.state.board[2][2] = 5;

        assert_eq!(
            GameRecord::from_view(view).unwrap_err(),
            GameError::InconsistentMines
        );
    }

    #[test]
    fn malformed_json_is_a_store_error() {
        let err = GameRecord::decode(json!({ "id": 5 })).unwrap_err();

        assert!(matches!(err, crate::ServiceError::Store(StoreError::Codec(_))));
    }
}
