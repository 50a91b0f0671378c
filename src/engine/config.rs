//! Board geometry and fleet composition shared by server and clients.

/// Rows and columns of every board.
pub const BOARD_SIZE: usize = 10;

/// Longest ship length a fleet table can describe.
pub const MAX_SHIP_LENGTH: usize = 5;

/// Required number of ships per length; index 0 holds length 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetRule {
    counts: [usize; MAX_SHIP_LENGTH],
}

/// The classic 10-ship fleet: four 2-deckers, three 3-deckers, two 4-deckers
/// and one 5-decker.
pub const STANDARD_FLEET: FleetRule = FleetRule::new([0, 4, 3, 2, 1]);

impl FleetRule {
    pub const fn new(counts: [usize; MAX_SHIP_LENGTH]) -> Self {
        Self { counts }
    }

    /// Number of ships of `length` the fleet requires. Zero for lengths outside
    /// `1..=MAX_SHIP_LENGTH`.
    pub fn required(&self, length: usize) -> usize {
        if length == 0 || length > MAX_SHIP_LENGTH {
            return 0;
        }
        self.counts[length - 1]
    }

    /// Longest ship length with a non-zero count.
    pub fn longest(&self) -> usize {
        self.counts
            .iter()
            .rposition(|&count| count > 0)
            .map_or(0, |idx| idx + 1)
    }

    /// Total number of ship cells in a complete fleet.
    pub fn total_cells(&self) -> usize {
        self.counts
            .iter()
            .enumerate()
            .map(|(idx, count)| (idx + 1) * count)
            .sum()
    }

    pub fn counts(&self) -> &[usize; MAX_SHIP_LENGTH] {
        &self.counts
    }
}

impl Default for FleetRule {
    fn default() -> Self {
        STANDARD_FLEET
    }
}
