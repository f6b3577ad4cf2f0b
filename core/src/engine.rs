use alloc::vec;
use ndarray::Array2;

use crate::types::has_size;
use crate::*;

/// Player-visible state of one game: the board plus the reveal and flag masks.
///
/// Moves mutate the value in place; callers that persist state work on a copy
/// and write it back as a whole.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    board: Board,
    revealed: Array2<bool>,
    flags: Array2<bool>,
}

impl GridState {
    pub fn new(board: Board) -> Self {
        let shape = board.size().to_nd_index();
        Self {
            board,
            revealed: Array2::default(shape),
            flags: Array2::default(shape),
        }
    }

    pub fn from_parts(board: Board, revealed: Array2<bool>, flags: Array2<bool>) -> Result<Self> {
        if !has_size(&revealed, board.size()) || !has_size(&flags, board.size()) {
            return Err(GameError::InvalidBoardShape);
        }
        Ok(Self {
            board,
            revealed,
            flags,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn revealed(&self) -> &Array2<bool> {
        &self.revealed
    }

    pub fn flags(&self) -> &Array2<bool> {
        &self.flags
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.revealed[coords.to_nd_index()]
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.flags[coords.to_nd_index()]
    }

    /// Reveals the cell at `coords`.
    ///
    /// Revealed and flagged cells are left alone. A mine discloses every mine
    /// of the board, a zero cell floods its connected zero region and that
    /// region's border. The caller is responsible for rejecting moves on a
    /// finished game.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;

        if self.is_revealed(coords) || self.is_flagged(coords) {
            return Ok(RevealOutcome::NoChange);
        }

        self.revealed[coords.to_nd_index()] = true;
        let tile = self.board[coords];

        if tile.is_mine() {
            self.disclose_mines();
            return Ok(RevealOutcome::HitMine);
        }

        if tile.is_zero() {
            self.flood_fill(coords);
        }

        Ok(if self.is_cleared() {
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        })
    }

    /// Flips the flag at `coords`, ignoring revealed cells.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.board.validate_coords(coords)?;

        if self.is_revealed(coords) {
            return Ok(MarkOutcome::NoChange);
        }

        let flag = &mut self.flags[coords.to_nd_index()];
        *flag = !*flag;
        Ok(MarkOutcome::Changed)
    }

    /// Whether every safe cell has been revealed.
    pub fn is_cleared(&self) -> bool {
        self.board
            .tiles()
            .iter()
            .zip(self.revealed.iter())
            .all(|(tile, &revealed)| revealed || tile.is_mine())
    }

    /// Iterative fill from an already revealed zero cell, using the reveal
    /// mask as the visited set.
    fn flood_fill(&mut self, start: Coord2) {
        let mut to_visit = vec![start];

        while let Some(coords) = to_visit.pop() {
            for pos in self.board.iter_neighbors(coords) {
                let index = pos.to_nd_index();
                if self.revealed[index] || self.flags[index] {
                    continue;
                }
                self.revealed[index] = true;
                if self.board[pos].is_zero() {
                    to_visit.push(pos);
                }
            }
        }
    }

    /// Reveals every mine, flagged or not.
    fn disclose_mines(&mut self) {
        for &coords in self.board.mines() {
            self.revealed[coords.to_nd_index()] = true;
        }
    }
}
