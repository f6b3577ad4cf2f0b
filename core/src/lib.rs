#![no_std]

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use generator::*;
pub use tile::*;
pub use types::*;

mod engine;
mod error;
mod generator;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl BoardConfig {
    pub const MIN_SIDE: Coord = 5;
    pub const MAX_SIDE: Coord = 30;

    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Clamps the sides to `[MIN_SIDE, MAX_SIDE]`, then the mine count to
    /// `[1, width * height - 1]` of the clamped board.
    pub fn clamped(width: i64, height: i64, mines: i64) -> Self {
        let side = |value: i64| value.clamp(Self::MIN_SIDE.into(), Self::MAX_SIDE.into()) as Coord;
        let size = (side(width), side(height));
        let max_mines = mult(size.0, size.1) - 1;
        let mines = mines.clamp(1, max_mines.into()) as CellCount;
        Self::new_unchecked(size, mines)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

/// Immutable part of a game: the tile grid and the mine coordinates in placement order.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    size: Coord2,
    tiles: Array2<Tile>,
    mines: Vec<Coord2>,
}

impl Board {
    /// Places `mine_coords` on an empty board of `size` and counts adjacency.
    ///
    /// Repeated coordinates are kept once, in order of first appearance.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut mines = Vec::with_capacity(mine_coords.len());
        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            if seen.insert(coords) {
                mines.push(coords);
            }
        }
        check_mine_count(size, mines.len())?;

        let mut tiles: Array2<Tile> = Array2::default(size.to_nd_index());
        for &coords in &mines {
            tiles[coords.to_nd_index()] = Tile::Mine;
        }
        for &coords in &mines {
            for pos in NeighborIter::new(coords, size) {
                if let Tile::Count(count) = &mut tiles[pos.to_nd_index()] {
                    *count += 1;
                }
            }
        }

        Ok(Self { size, tiles, mines })
    }

    /// Rebuilds a board from previously generated parts, checking that the
    /// mine list and the tiles agree and that every count matches its
    /// neighborhood.
    pub fn from_parts(tiles: Array2<Tile>, mines: Vec<Coord2>) -> Result<Self> {
        let (width, height) = tiles.dim();
        let size = match (Coord::try_from(width), Coord::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(GameError::InvalidBoardShape),
        };
        check_mine_count(size, mines.len())?;

        let mut seen = BTreeSet::new();
        for &coords in &mines {
            let in_bounds = coords.0 < size.0 && coords.1 < size.1;
            if !in_bounds || !seen.insert(coords) || !tiles[coords.to_nd_index()].is_mine() {
                return Err(GameError::InconsistentMines);
            }
        }
        if tiles.iter().filter(|tile| tile.is_mine()).count() != mines.len() {
            return Err(GameError::InconsistentMines);
        }
        for coords in iter_coords(size) {
            if let Tile::Count(count) = tiles[coords.to_nd_index()] {
                let adjacent = NeighborIter::new(coords, size)
                    .filter(|pos| tiles[pos.to_nd_index()].is_mine())
                    .count();
                if usize::from(count) != adjacent {
                    log::warn!("Count {count} at {coords:?} does not match {adjacent} adjacent mines");
                    return Err(GameError::InconsistentMines);
                }
            }
        }

        Ok(Self { size, tiles, mines })
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn tiles(&self) -> &Array2<Tile> {
        &self.tiles
    }

    pub fn mines(&self) -> &[Coord2] {
        &self.mines
    }

    pub fn mine_count(&self) -> CellCount {
        // bounded by total_cells
        self.mines.len() as CellCount
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count()
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if coords.0 < self.size.0 && coords.1 < self.size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size)
    }
}

impl Index<Coord2> for Board {
    type Output = Tile;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.tiles[coords.to_nd_index()]
    }
}

fn check_mine_count(size: Coord2, mines: usize) -> Result<()> {
    let total = usize::from(mult(size.0, size.1));
    if (1..total).contains(&mines) {
        Ok(())
    } else {
        Err(GameError::MineCountOutOfRange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Ongoing
    }
}

impl core::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Status of an ongoing game after this outcome.
    pub const fn status(self) -> GameStatus {
        match self {
            Self::NoChange | Self::Revealed => GameStatus::Ongoing,
            Self::HitMine => GameStatus::Lost,
            Self::Won => GameStatus::Won,
        }
    }
}
