//! External control surface for the simulation
//!
//! The thin session layer a transport (HTTP facade, IPC bridge, a test
//! harness) drives: initialize once, tick repeatedly, read entity
//! snapshots between ticks. Every call before `initialize` fails with
//! `SimError::NotInitialized`. All snapshot accessors are pure reads.
//!
//! The engine has no internal locking; if a hosting layer serves reads
//! concurrently with ticks it must wrap the session in its own exclusive
//! lock, because the grid is not safe to read mid-mutation.

use serde::Serialize;

use crate::simulation::{
    CarState, CityWorld, Direction, DirectionTable, Occupant, Position, SimError, StaticCell,
    StepSummary,
};

/// Snapshot of one car
#[derive(Debug, Clone, Serialize)]
pub struct CarView {
    pub id: usize,
    pub position: Position,
    pub state: CarState,
}

/// Snapshot of one traffic light
#[derive(Debug, Clone, Serialize)]
pub struct LightView {
    pub id: usize,
    pub position: Position,
    pub green: bool,
}

/// Snapshot of one road cell
#[derive(Debug, Clone, Serialize)]
pub struct RoadView {
    pub id: usize,
    pub position: Position,
    pub directions: Vec<Direction>,
}

/// Snapshot of a static cell with no extra state (obstacle, destination)
#[derive(Debug, Clone, Serialize)]
pub struct CellView {
    pub id: usize,
    pub position: Position,
}

/// A lazily initialized simulation drivable from an external layer
#[derive(Default)]
pub struct SimulationSession {
    world: Option<CityWorld>,
}

impl SimulationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the world; any previous world is discarded
    pub fn initialize(
        &mut self,
        map_source: &str,
        table: &DirectionTable,
    ) -> Result<(), SimError> {
        self.world = Some(CityWorld::new(map_source, table)?);
        Ok(())
    }

    /// Build the world with a seeded RNG for reproducible runs
    pub fn initialize_seeded(
        &mut self,
        map_source: &str,
        table: &DirectionTable,
        seed: u64,
    ) -> Result<(), SimError> {
        self.world = Some(CityWorld::new_seeded(map_source, table, seed)?);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.world.is_some()
    }

    fn world(&self) -> Result<&CityWorld, SimError> {
        self.world.as_ref().ok_or(SimError::NotInitialized)
    }

    /// Direct access to the world, for callers that outgrow the views
    pub fn world_mut(&mut self) -> Result<&mut CityWorld, SimError> {
        self.world.as_mut().ok_or(SimError::NotInitialized)
    }

    /// Advance the simulation by one step
    pub fn tick(&mut self) -> Result<StepSummary, SimError> {
        Ok(self.world_mut()?.tick())
    }

    /// False once the spawn perimeter deadlocked
    pub fn is_running(&self) -> Result<bool, SimError> {
        Ok(self.world()?.running)
    }

    /// All active cars, ordered by id
    pub fn cars(&self) -> Result<Vec<CarView>, SimError> {
        let world = self.world()?;
        let mut views: Vec<CarView> = world
            .cars
            .values()
            .map(|car| CarView {
                id: car.id.0 .0,
                position: car.position,
                state: car.state,
            })
            .collect();
        views.sort_by_key(|view| view.id);
        Ok(views)
    }

    /// All traffic lights with their current state, ordered by id
    pub fn traffic_lights(&self) -> Result<Vec<LightView>, SimError> {
        let world = self.world()?;
        let mut views: Vec<LightView> = world
            .lights
            .values()
            .map(|light| LightView {
                id: light.id.0 .0,
                position: light.position,
                green: light.is_green(),
            })
            .collect();
        views.sort_by_key(|view| view.id);
        Ok(views)
    }

    /// All road cells with their directions, ordered by id
    pub fn roads(&self) -> Result<Vec<RoadView>, SimError> {
        let world = self.world()?;
        let mut views: Vec<RoadView> = world
            .grid
            .occupants()
            .filter_map(|(occupant, position)| match occupant {
                Occupant::Road(id) => {
                    let directions = match world.map.cell(position) {
                        Some(StaticCell::Road { directions }) => directions.clone(),
                        _ => Vec::new(),
                    };
                    Some(RoadView {
                        id: id.0 .0,
                        position,
                        directions,
                    })
                }
                _ => None,
            })
            .collect();
        views.sort_by_key(|view| view.id);
        Ok(views)
    }

    /// All obstacle cells, ordered by id
    pub fn obstacles(&self) -> Result<Vec<CellView>, SimError> {
        let world = self.world()?;
        let mut views: Vec<CellView> = world
            .grid
            .occupants()
            .filter_map(|(occupant, position)| match occupant {
                Occupant::Obstacle(id) => Some(CellView {
                    id: id.0 .0,
                    position,
                }),
                _ => None,
            })
            .collect();
        views.sort_by_key(|view| view.id);
        Ok(views)
    }

    /// All destination cells, ordered by id
    pub fn destinations(&self) -> Result<Vec<CellView>, SimError> {
        let world = self.world()?;
        let mut views: Vec<CellView> = world
            .grid
            .occupants()
            .filter_map(|(occupant, position)| match occupant {
                Occupant::Destination(id) => Some(CellView {
                    id: id.0 .0,
                    position,
                }),
                _ => None,
            })
            .collect();
        views.sort_by_key(|view| view.id);
        Ok(views)
    }
}
