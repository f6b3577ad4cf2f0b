use serde::{Deserialize, Serialize};

/// Fixed content of a board cell, decided at generation time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Mine,
    Count(u8),
}

impl Tile {
    /// Value used for mine cells in the numeric board encoding.
    pub const MINE_VALUE: i8 = -1;

    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Count(0))
    }

    /// `-1` for a mine, otherwise the adjacent mine count.
    pub const fn to_value(self) -> i8 {
        match self {
            Self::Mine => Self::MINE_VALUE,
            // at most 8 neighbors
            Self::Count(count) => count as i8,
        }
    }

    pub const fn from_value(value: i8) -> Option<Self> {
        match value {
            Self::MINE_VALUE => Some(Self::Mine),
            0..=8 => Some(Self::Count(value as u8)),
            _ => None,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::Count(0)
    }
}
