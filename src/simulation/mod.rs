//! Standalone city traffic simulation engine
//!
//! This module contains the whole simulation core: the map compiler, the
//! occupancy grid, the agents, and the tick scheduler. It has no
//! transport or rendering dependencies and can be driven headless from a
//! test or a console runner.

mod car;
mod error;
mod graph;
mod grid;
mod light;
mod map;
mod spawner;
mod types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use car::{Car, CarState, CarUpdateResult};
#[allow(unused_imports)]
pub use error::{ConfigError, SimError};
#[allow(unused_imports)]
pub use graph::RouteGraph;
#[allow(unused_imports)]
pub use grid::MultiGrid;
#[allow(unused_imports)]
pub use light::TrafficLight;
#[allow(unused_imports)]
pub use map::{load_map_source, CellSpec, CityMap, DirectionTable, LightSpec, StaticCell};
#[allow(unused_imports)]
pub use spawner::Spawner;
#[allow(unused_imports)]
pub use types::{
    CarId, DestinationId, Direction, LightId, ObstacleId, Occupant, Position, RoadId, SimId,
    DEFAULT_SPAWN_INTERVAL, LANE_CHANGE_AFTER, REROUTE_AFTER,
};
pub use world::{CityWorld, StepSummary, WorldStats};
