//! Car spawner configuration
//!
//! New cars enter the world at the four grid corners on a fixed cadence.
//! Each entry point carries the initial travel direction a car leaves it
//! with; the direction is corrected as soon as the car makes its first
//! hop. The world owns the actual spawning because it needs the RNG and
//! the agent set; this module holds the schedule and the entry layout.

use super::types::{Direction, Position, DEFAULT_SPAWN_INTERVAL};

/// Where and how often new cars appear
#[derive(Debug, Clone)]
pub struct Spawner {
    entries: Vec<(Position, Direction)>,
    interval: u64,
}

impl Spawner {
    /// The four corners with their fixed initial directions
    pub fn corner_entries(width: i32, height: i32) -> Vec<(Position, Direction)> {
        vec![
            (Position::new(0, 0), Direction::Right),
            (Position::new(width - 1, 0), Direction::Left),
            (Position::new(0, height - 1), Direction::Up),
            (Position::new(width - 1, height - 1), Direction::Down),
        ]
    }

    pub fn new(width: i32, height: i32) -> Self {
        Self {
            entries: Self::corner_entries(width, height),
            interval: DEFAULT_SPAWN_INTERVAL,
        }
    }

    pub fn with_interval(width: i32, height: i32, interval: u64) -> Self {
        debug_assert!(interval > 0);
        Self {
            entries: Self::corner_entries(width, height),
            interval,
        }
    }

    pub fn entries(&self) -> &[(Position, Direction)] {
        &self.entries
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// True when the spawner should run after the given step
    pub fn is_due(&self, step_count: u64) -> bool {
        step_count % self.interval == 0
    }
}
