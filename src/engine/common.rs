//! Common types for Battleship: coordinates and board errors.

use crate::engine::config::BOARD_SIZE;

/// A cell position on a board. Always inside `0..BOARD_SIZE` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawCoord", into = "RawCoord")
)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Returns `None` when `(row, col)` falls outside the board.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn row(&self) -> usize {
        self.row as usize
    }

    pub fn col(&self) -> usize {
        self.col as usize
    }

    /// Every coordinate of the board in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| {
            (0..BOARD_SIZE).map(move |col| Coord {
                row: row as u8,
                col: col as u8,
            })
        })
    }
}

impl core::fmt::Display for Coord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", (b'A' + self.col) as char, self.row + 1)
    }
}

/// Unvalidated wire form of [`Coord`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct RawCoord {
    pub row: u8,
    pub col: u8,
}

impl TryFrom<RawCoord> for Coord {
    type Error = BoardError;

    fn try_from(raw: RawCoord) -> Result<Self, Self::Error> {
        Coord::new(raw.row as usize, raw.col as usize).ok_or(BoardError::OutOfBounds)
    }
}

impl From<Coord> for RawCoord {
    fn from(coord: Coord) -> Self {
        RawCoord {
            row: coord.row,
            col: coord.col,
        }
    }
}

/// Orientation of a straight ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Errors returned by Board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinate outside the board.
    OutOfBounds,
    /// Cell was already shot at.
    AlreadyShot,
    /// Random placement could not fit the fleet.
    UnableToPlaceFleet,
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::OutOfBounds => write!(f, "Coordinate is out of bounds"),
            BoardError::AlreadyShot => write!(f, "Cell was already shot at"),
            BoardError::UnableToPlaceFleet => write!(f, "Unable to place fleet"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
