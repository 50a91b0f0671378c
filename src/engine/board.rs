//! Game board: a grid of cell states with placement rules, shooting and the
//! destroyed-ship halo.

use crate::engine::common::{BoardError, Coord, Orientation};
use crate::engine::config::{BOARD_SIZE, STANDARD_FLEET};
use core::fmt;

/// State of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Empty,
    Ship,
    Miss,
    ShipHit,
}

const DIAGONALS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[CellState; BOARD_SIZE]; BOARD_SIZE],
    longest_ship: usize,
}

impl Board {
    /// Create an empty board sized for the standard fleet.
    pub fn new() -> Self {
        Self::with_longest_ship(STANDARD_FLEET.longest())
    }

    /// Create an empty board that refuses runs longer than `longest_ship`.
    pub fn with_longest_ship(longest_ship: usize) -> Self {
        Board {
            cells: [[CellState::Empty; BOARD_SIZE]; BOARD_SIZE],
            longest_ship,
        }
    }

    pub fn get(&self, coord: Coord) -> CellState {
        self.cells[coord.row()][coord.col()]
    }

    /// Overwrite a cell. Used to mark shot results reported by the opponent.
    pub fn set(&mut self, coord: Coord, state: CellState) {
        self.cells[coord.row()][coord.col()] = state;
    }

    /// Look up a cell by signed offsets, `None` when off the board.
    fn at(&self, row: isize, col: isize) -> Option<CellState> {
        if row < 0 || col < 0 || row >= BOARD_SIZE as isize || col >= BOARD_SIZE as isize {
            return None;
        }
        Some(self.cells[row as usize][col as usize])
    }

    /// Count consecutive cells in `state` starting next to `coord` and walking
    /// in direction `(dr, dc)`.
    fn run_length(&self, coord: Coord, (dr, dc): (isize, isize), state: CellState) -> usize {
        let mut len = 0;
        let (mut r, mut c) = (coord.row() as isize + dr, coord.col() as isize + dc);
        while self.at(r, c) == Some(state) {
            len += 1;
            r += dr;
            c += dc;
        }
        len
    }

    /// Toggle one cell to `Ship`. Silently ignored when the cell is not empty,
    /// touches another ship diagonally, or would grow a run past the longest
    /// allowed ship.
    pub fn place_ship(&mut self, coord: Coord) {
        if self.get(coord) != CellState::Empty {
            return;
        }
        let (r, c) = (coord.row() as isize, coord.col() as isize);
        if DIAGONALS
            .iter()
            .any(|(dr, dc)| self.at(r + dr, c + dc) == Some(CellState::Ship))
        {
            return;
        }
        let length = 1
            + [(0, -1), (0, 1), (-1, 0), (1, 0)]
                .iter()
                .map(|&dir| self.run_length(coord, dir, CellState::Ship))
                .sum::<usize>();
        if length > self.longest_ship {
            return;
        }
        self.set(coord, CellState::Ship);
    }

    /// Clear a `Ship` cell back to `Empty`. Any other state is left alone.
    pub fn remove_ship(&mut self, coord: Coord) {
        if self.get(coord) == CellState::Ship {
            self.set(coord, CellState::Empty);
        }
    }

    /// Reset every cell to `Empty`.
    pub fn clear(&mut self) {
        self.cells = [[CellState::Empty; BOARD_SIZE]; BOARD_SIZE];
    }

    /// `true` while the cell has not been targeted yet.
    pub fn can_shoot(&self, coord: Coord) -> bool {
        matches!(self.get(coord), CellState::Empty | CellState::Ship)
    }

    /// Resolve a shot: `Ok(true)` on a hit, `Ok(false)` on a miss.
    pub fn shoot(&mut self, coord: Coord) -> Result<bool, BoardError> {
        match self.get(coord) {
            CellState::Empty => {
                self.set(coord, CellState::Miss);
                Ok(false)
            }
            CellState::Ship => {
                self.set(coord, CellState::ShipHit);
                Ok(true)
            }
            CellState::Miss | CellState::ShipHit => Err(BoardError::AlreadyShot),
        }
    }

    /// Given a freshly hit cell, report whether the whole ship containing it
    /// is now hit. A destroyed ship gets its surrounding empty cells marked as
    /// `Miss`; nothing changes otherwise.
    pub fn mark_destroyed_if_complete(&mut self, coord: Coord) -> bool {
        if self.get(coord) != CellState::ShipHit {
            return false;
        }
        let (r, c) = (coord.row() as isize, coord.col() as isize);

        let left = self.run_length(coord, (0, -1), CellState::ShipHit) as isize;
        let right = self.run_length(coord, (0, 1), CellState::ShipHit) as isize;
        let up = self.run_length(coord, (-1, 0), CellState::ShipHit) as isize;
        let down = self.run_length(coord, (1, 0), CellState::ShipHit) as isize;

        let (lc, rc, tr, br) = (c - left, c + right, r - up, r + down);

        // an intact segment right past either end means the ship is still afloat
        let beyond = [(r, lc - 1), (r, rc + 1), (tr - 1, c), (br + 1, c)];
        if beyond
            .iter()
            .any(|&(row, col)| self.at(row, col) == Some(CellState::Ship))
        {
            return false;
        }

        for row in (tr - 1)..=(br + 1) {
            for col in (lc - 1)..=(rc + 1) {
                if self.at(row, col) == Some(CellState::Empty) {
                    self.cells[row as usize][col as usize] = CellState::Miss;
                }
            }
        }
        true
    }

    /// `true` while at least one un-hit ship cell remains.
    pub fn has_alive_ships(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .any(|&cell| cell == CellState::Ship)
    }

    /// Whether a whole ship of `length` starting at `origin` fits on empty
    /// water without touching any other ship, orthogonally or diagonally.
    pub fn can_place_ship_at(&self, origin: Coord, orientation: Orientation, length: usize) -> bool {
        if length == 0 || length > self.longest_ship {
            return false;
        }
        let (dr, dc) = match orientation {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
        };
        let (r0, c0) = (origin.row() as isize, origin.col() as isize);
        let (r1, c1) = (r0 + dr * (length as isize - 1), c0 + dc * (length as isize - 1));
        if r1 >= BOARD_SIZE as isize || c1 >= BOARD_SIZE as isize {
            return false;
        }
        for row in (r0 - 1)..=(r1 + 1) {
            for col in (c0 - 1)..=(c1 + 1) {
                match self.at(row, col) {
                    None | Some(CellState::Empty) => {}
                    Some(_) => return false,
                }
            }
        }
        true
    }

    /// Place a whole ship checked with [`Board::can_place_ship_at`].
    /// Returns `false` and leaves the board untouched when it does not fit.
    pub fn place_segment(&mut self, origin: Coord, orientation: Orientation, length: usize) -> bool {
        if !self.can_place_ship_at(origin, orientation, length) {
            return false;
        }
        for i in 0..length {
            let (row, col) = match orientation {
                Orientation::Horizontal => (origin.row(), origin.col() + i),
                Orientation::Vertical => (origin.row() + i, origin.col()),
            };
            self.cells[row][col] = CellState::Ship;
        }
        true
    }

    /// Number of cells currently in `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().flatten().filter(|&&cell| cell == state).count()
    }

    pub fn longest_ship(&self) -> usize {
        self.longest_ship
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        for row in &self.cells {
            write!(f, "  ")?;
            for cell in row {
                let ch = match cell {
                    CellState::Empty => '.',
                    CellState::Ship => '#',
                    CellState::Miss => 'o',
                    CellState::ShipHit => 'X',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
