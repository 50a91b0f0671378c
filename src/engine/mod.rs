//! Core battleship engine (no_std compatible)
//!
//! Board cells, placement rules, shooting and fleet validation. Nothing in
//! here knows about sessions or the network.

pub mod board;
pub mod common;
pub mod config;
pub mod shipyard;

pub use board::{Board, CellState};
pub use common::{BoardError, Coord, Orientation, RawCoord};
pub use config::*;
pub use shipyard::{is_ready, place_random_fleet, remaining, ship_length_histogram, ShipHistogram};
