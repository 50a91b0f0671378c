//! Fleet bookkeeping: classifies ship runs on a board and checks them against
//! the required fleet.

use crate::engine::board::{Board, CellState};
use crate::engine::common::{BoardError, Coord, Orientation};
use crate::engine::config::{FleetRule, BOARD_SIZE, MAX_SHIP_LENGTH};
use rand::Rng;

/// Number of ships found on a board, grouped by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShipHistogram {
    counts: [usize; MAX_SHIP_LENGTH],
    oversized: usize,
}

impl ShipHistogram {
    /// Ships of exactly `length` cells.
    pub fn count(&self, length: usize) -> usize {
        if length == 0 || length > MAX_SHIP_LENGTH {
            return 0;
        }
        self.counts[length - 1]
    }

    /// Runs longer than [`MAX_SHIP_LENGTH`]; these never belong to a fleet.
    pub fn oversized(&self) -> usize {
        self.oversized
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.oversized
    }

    fn record(&mut self, length: usize) {
        if length > MAX_SHIP_LENGTH {
            self.oversized += 1;
        } else {
            self.counts[length - 1] += 1;
        }
    }
}

/// Scan the board once and classify every maximal straight run of `Ship`
/// cells. A run is measured to the right first; only a single-cell horizontal
/// run is extended downwards.
pub fn ship_length_histogram(board: &Board) -> ShipHistogram {
    let mut histogram = ShipHistogram::default();
    let mut visited = [[false; BOARD_SIZE]; BOARD_SIZE];
    let is_ship = |row: usize, col: usize| {
        Coord::new(row, col).is_some_and(|coord| board.get(coord) == CellState::Ship)
    };

    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            if visited[row][col] {
                continue;
            }
            visited[row][col] = true;
            if !is_ship(row, col) {
                continue;
            }

            let mut length = 1;
            let mut c = col + 1;
            while is_ship(row, c) {
                visited[row][c] = true;
                length += 1;
                c += 1;
            }
            if length == 1 {
                let mut r = row + 1;
                while is_ship(r, col) {
                    visited[r][col] = true;
                    length += 1;
                    r += 1;
                }
            }
            histogram.record(length);
        }
    }
    histogram
}

/// `true` iff the board carries exactly the required fleet: no missing ship
/// and no extra one of any length.
pub fn is_ready(board: &Board, fleet: &FleetRule) -> bool {
    let histogram = ship_length_histogram(board);
    histogram.oversized() == 0
        && (1..=MAX_SHIP_LENGTH).all(|len| histogram.count(len) == fleet.required(len))
}

/// Ships per length still to be placed; negative when the board carries more
/// than required. Index 0 holds length 1.
pub fn remaining(board: &Board, fleet: &FleetRule) -> [isize; MAX_SHIP_LENGTH] {
    let histogram = ship_length_histogram(board);
    core::array::from_fn(|idx| fleet.required(idx + 1) as isize - histogram.count(idx + 1) as isize)
}

const PLACEMENT_ATTEMPTS: usize = 200;
const FLEET_ATTEMPTS: usize = 50;

/// Clear `board` and fill it with a random legal fleet, longest ships first.
pub fn place_random_fleet<R: Rng>(
    board: &mut Board,
    fleet: &FleetRule,
    rng: &mut R,
) -> Result<(), BoardError> {
    'fleet: for _ in 0..FLEET_ATTEMPTS {
        board.clear();
        for length in (1..=MAX_SHIP_LENGTH).rev() {
            for _ in 0..fleet.required(length) {
                if !place_random_ship(board, length, rng) {
                    continue 'fleet;
                }
            }
        }
        if is_ready(board, fleet) {
            return Ok(());
        }
    }
    board.clear();
    Err(BoardError::UnableToPlaceFleet)
}

fn place_random_ship<R: Rng>(board: &mut Board, length: usize, rng: &mut R) -> bool {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let orientation = if rng.random() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let row = rng.random_range(0..BOARD_SIZE);
        let col = rng.random_range(0..BOARD_SIZE);
        if let Some(origin) = Coord::new(row, col) {
            if board.place_segment(origin, orientation, length) {
                return true;
            }
        }
    }
    false
}
