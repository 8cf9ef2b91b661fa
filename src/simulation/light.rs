//! Traffic light state
//!
//! Two states, no yellow. Lights do not run private timers: they compare
//! the global step counter against their period, so every light sharing
//! a period flips in the same tick.

use log::debug;

use super::types::{LightId, Position};

/// A traffic light gating one grid cell
#[derive(Debug, Clone)]
pub struct TrafficLight {
    pub id: LightId,
    pub position: Position,
    green: bool,
    period: u64,
}

impl TrafficLight {
    pub fn new(id: LightId, position: Position, period: u64, initially_green: bool) -> Self {
        debug_assert!(period > 0);
        Self {
            id,
            position,
            green: initially_green,
            period,
        }
    }

    /// True when cars may pass
    pub fn is_green(&self) -> bool {
        self.green
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Activate for the tick with the given global step counter
    pub fn activate(&mut self, step_count: u64) {
        if step_count % self.period == 0 {
            self.green = !self.green;
            debug!(
                "light {:?} at {} turned {}",
                self.id,
                self.position,
                if self.green { "green" } else { "red" }
            );
        }
    }
}
