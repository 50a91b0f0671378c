use battleship::{
    is_ready, ship_length_histogram, Board, BoardError, CellState, Coord, Orientation, BOARD_SIZE,
    STANDARD_FLEET,
};

fn c(row: usize, col: usize) -> Coord {
    Coord::new(row, col).unwrap()
}

fn board_with(cells: &[(usize, usize)]) -> Board {
    let mut board = Board::new();
    for &(row, col) in cells {
        board.place_ship(c(row, col));
        assert_eq!(board.get(c(row, col)), CellState::Ship, "placing ({}, {})", row, col);
    }
    board
}

#[test]
fn coordinates_outside_the_board_are_rejected() {
    assert!(Coord::new(BOARD_SIZE, 0).is_none());
    assert!(Coord::new(0, BOARD_SIZE).is_none());
    assert_eq!(c(0, 0).to_string(), "A1");
    assert_eq!(c(9, 2).to_string(), "C10");
    assert_eq!(Coord::all().count(), BOARD_SIZE * BOARD_SIZE);
}

#[test]
fn diagonal_neighbour_is_refused() {
    let mut board = board_with(&[(4, 4)]);
    let before = board.clone();
    for (row, col) in [(3, 3), (3, 5), (5, 3), (5, 5)] {
        board.place_ship(c(row, col));
    }
    assert_eq!(board, before);
}

#[test]
fn orthogonal_neighbour_extends_the_run() {
    let board = board_with(&[(4, 4), (4, 5), (4, 6)]);
    assert_eq!(board.count(CellState::Ship), 3);
    let board = board_with(&[(3, 4), (5, 4), (4, 4)]);
    assert_eq!(board.count(CellState::Ship), 3);
}

#[test]
fn run_longer_than_the_longest_ship_is_refused() {
    let mut board = board_with(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)]);
    let before = board.clone();
    board.place_ship(c(0, 5));
    assert_eq!(board, before);
}

#[test]
fn joining_two_runs_counts_both_sides() {
    let mut board = board_with(&[(2, 0), (2, 1), (2, 2), (2, 4), (2, 5), (2, 6)]);
    let before = board.clone();
    board.place_ship(c(2, 3));
    assert_eq!(board, before);

    let mut board = board_with(&[(2, 0), (2, 1), (2, 3), (2, 4)]);
    board.place_ship(c(2, 2));
    assert_eq!(board.get(c(2, 2)), CellState::Ship);
}

#[test]
fn shorter_fleet_rule_limits_runs() {
    let mut board = Board::with_longest_ship(2);
    board.place_ship(c(0, 0));
    board.place_ship(c(0, 1));
    board.place_ship(c(0, 2));
    assert_eq!(board.get(c(0, 2)), CellState::Empty);
}

#[test]
fn remove_only_touches_ship_cells() {
    let mut board = board_with(&[(1, 1)]);
    board.shoot(c(7, 7)).unwrap();
    board.remove_ship(c(7, 7));
    assert_eq!(board.get(c(7, 7)), CellState::Miss);
    board.remove_ship(c(1, 1));
    assert_eq!(board.get(c(1, 1)), CellState::Empty);
}

#[test]
fn clear_resets_every_cell() {
    let mut board = board_with(&[(1, 1), (3, 3)]);
    board.shoot(c(0, 9)).unwrap();
    board.clear();
    assert_eq!(board.count(CellState::Empty), BOARD_SIZE * BOARD_SIZE);
}

#[test]
fn shot_cells_cannot_be_shot_again() {
    let mut board = board_with(&[(6, 6)]);
    assert!(board.can_shoot(c(6, 6)));
    assert!(board.can_shoot(c(0, 0)));

    assert_eq!(board.shoot(c(0, 0)), Ok(false));
    assert_eq!(board.shoot(c(6, 6)), Ok(true));
    assert!(!board.can_shoot(c(0, 0)));
    assert!(!board.can_shoot(c(6, 6)));
    assert_eq!(board.shoot(c(0, 0)), Err(BoardError::AlreadyShot));
    assert_eq!(board.shoot(c(6, 6)), Err(BoardError::AlreadyShot));
}

#[test]
fn single_cell_ship_gets_a_full_halo() {
    let mut board = board_with(&[(5, 5)]);
    assert_eq!(board.shoot(c(5, 5)), Ok(true));
    assert!(board.mark_destroyed_if_complete(c(5, 5)));

    assert_eq!(board.get(c(5, 5)), CellState::ShipHit);
    assert_eq!(board.count(CellState::Miss), 8);
    for row in 4..=6 {
        for col in 4..=6 {
            if (row, col) != (5, 5) {
                assert_eq!(board.get(c(row, col)), CellState::Miss);
            }
        }
    }
    assert_eq!(board.count(CellState::Empty), BOARD_SIZE * BOARD_SIZE - 9);
    assert!(!board.has_alive_ships());
}

#[test]
fn halo_is_clamped_at_the_corner() {
    let mut board = board_with(&[(0, 0)]);
    board.shoot(c(0, 0)).unwrap();
    assert!(board.mark_destroyed_if_complete(c(0, 0)));
    assert_eq!(board.count(CellState::Miss), 3);
}

#[test]
fn ship_is_destroyed_only_after_its_last_cell() {
    let mut board = board_with(&[(4, 3), (4, 4), (4, 5)]);

    board.shoot(c(4, 3)).unwrap();
    assert!(!board.mark_destroyed_if_complete(c(4, 3)));
    board.shoot(c(4, 5)).unwrap();
    assert!(!board.mark_destroyed_if_complete(c(4, 5)));
    assert_eq!(board.count(CellState::Miss), 0);

    board.shoot(c(4, 4)).unwrap();
    assert!(board.mark_destroyed_if_complete(c(4, 4)));
    // 3x5 box around the ship minus the ship itself
    assert_eq!(board.count(CellState::Miss), 12);
    assert_eq!(board.get(c(3, 2)), CellState::Miss);
    assert_eq!(board.get(c(5, 6)), CellState::Miss);
    assert_eq!(board.get(c(4, 7)), CellState::Empty);
}

#[test]
fn vertical_ship_halo_keeps_earlier_misses() {
    let mut board = board_with(&[(1, 8), (2, 8)]);
    board.shoot(c(0, 9)).unwrap();
    board.shoot(c(1, 8)).unwrap();
    board.shoot(c(2, 8)).unwrap();
    assert!(board.mark_destroyed_if_complete(c(2, 8)));
    // rows 0..=3, cols 7..=9 minus two ship cells
    assert_eq!(board.count(CellState::Miss), 10);
    assert_eq!(board.count(CellState::ShipHit), 2);
}

#[test]
fn miss_is_never_a_destroyed_ship() {
    let mut board = Board::new();
    board.shoot(c(3, 3)).unwrap();
    assert!(!board.mark_destroyed_if_complete(c(3, 3)));
    assert_eq!(board.count(CellState::Miss), 1);
}

#[test]
fn tracking_board_fills_halo_from_reported_hits() {
    // the opponent's board as seen by the shooter only ever holds reported results
    let mut view = Board::new();
    view.set(c(7, 1), CellState::ShipHit);
    view.set(c(7, 2), CellState::ShipHit);
    assert!(view.mark_destroyed_if_complete(c(7, 2)));
    assert_eq!(view.count(CellState::Miss), 10);
}

#[test]
fn alive_ships_survive_partial_damage() {
    let mut board = board_with(&[(0, 0), (0, 1), (9, 9)]);
    board.shoot(c(0, 0)).unwrap();
    board.shoot(c(9, 9)).unwrap();
    assert!(board.has_alive_ships());
    board.shoot(c(0, 1)).unwrap();
    assert!(!board.has_alive_ships());
}

#[test]
fn whole_ship_placement_keeps_distance() {
    let mut board = Board::new();
    assert!(board.place_segment(c(0, 0), Orientation::Horizontal, 4));
    assert!(!board.can_place_ship_at(c(1, 0), Orientation::Horizontal, 2));
    assert!(!board.can_place_ship_at(c(1, 4), Orientation::Vertical, 2));
    assert!(board.can_place_ship_at(c(2, 0), Orientation::Horizontal, 5));
    assert!(!board.can_place_ship_at(c(9, 7), Orientation::Horizontal, 4));
    assert!(!board.can_place_ship_at(c(5, 5), Orientation::Vertical, 6));
    assert!(!board.place_segment(c(0, 4), Orientation::Vertical, 3));
    assert_eq!(board.count(CellState::Ship), 4);
}

#[test]
fn histogram_of_a_partial_fleet() {
    let board = board_with(&[(0, 0), (0, 1), (2, 0)]);
    let histogram = ship_length_histogram(&board);
    assert_eq!(histogram.count(1), 1);
    assert_eq!(histogram.count(2), 1);
    assert_eq!(histogram.count(3), 0);
    assert_eq!(histogram.total(), 2);
    assert!(!is_ready(&board, &STANDARD_FLEET));
}
