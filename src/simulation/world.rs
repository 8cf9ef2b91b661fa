//! The city world: owns the compiled map, the occupancy grid, every
//! agent, and the tick scheduler that drives them.
//!
//! One `CityWorld` is one independent simulation instance; nothing lives
//! in statics, so tests can run as many worlds side by side as they like.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;

use super::car::{Car, CarUpdateResult};
use super::error::ConfigError;
use super::grid::MultiGrid;
use super::light::TrafficLight;
use super::map::{CityMap, DirectionTable, StaticCell};
use super::spawner::Spawner;
use super::types::{
    CarId, DestinationId, Direction, LightId, ObstacleId, Occupant, Position, RoadId, SimId,
};

/// Summary returned by a completed tick
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepSummary {
    pub step_index: u64,
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldStats {
    pub cars_spawned: usize,
    pub cars_arrived: usize,
}

/// An agent eligible for activation in a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentId {
    Light(LightId),
    Car(CarId),
}

impl AgentId {
    fn order_key(self) -> (u8, usize) {
        match self {
            AgentId::Light(LightId(SimId(n))) => (0, n),
            AgentId::Car(CarId(SimId(n))) => (1, n),
        }
    }
}

/// The main simulation world
pub struct CityWorld {
    /// Static cell classifications and the travel graph
    pub map: CityMap,

    /// Multi-occupancy space shared by all placed entities
    pub grid: MultiGrid,

    /// All active cars
    pub cars: HashMap<CarId, Car>,

    /// All traffic lights
    pub lights: HashMap<LightId, TrafficLight>,

    /// Destination cells cars can be assigned to
    pub destinations: Vec<Position>,

    /// False once every spawn point was found occupied in one pass
    pub running: bool,

    /// Run counters
    pub stats: WorldStats,

    spawner: Spawner,
    step_count: u64,
    next_id: usize,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl CityWorld {
    /// Build a world from a map source and its direction table
    pub fn new(map_source: &str, table: &DirectionTable) -> Result<Self, ConfigError> {
        Self::new_internal(map_source, table, None)
    }

    /// Build a world with a seeded RNG for reproducible runs
    pub fn new_seeded(
        map_source: &str,
        table: &DirectionTable,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::new_internal(map_source, table, Some(StdRng::seed_from_u64(seed)))
    }

    fn new_internal(
        map_source: &str,
        table: &DirectionTable,
        rng: Option<StdRng>,
    ) -> Result<Self, ConfigError> {
        let map = CityMap::compile(map_source, table)?;
        let mut grid = MultiGrid::new(map.width(), map.height());
        let mut next_id = 0usize;

        for (position, cell) in map.cells() {
            let occupant = match cell {
                StaticCell::Road { .. } => Occupant::Road(RoadId(SimId(next_id))),
                StaticCell::Destination => Occupant::Destination(DestinationId(SimId(next_id))),
                StaticCell::Obstacle => Occupant::Obstacle(ObstacleId(SimId(next_id))),
                // Lights are placed below, together with their state.
                StaticCell::TrafficLight { .. } => continue,
            };
            next_id += 1;
            grid.place(occupant, *position);
        }

        let mut lights = HashMap::new();
        for spec in map.light_specs() {
            let id = LightId(SimId(next_id));
            next_id += 1;
            grid.place(Occupant::TrafficLight(id), spec.position);
            lights.insert(
                id,
                TrafficLight::new(id, spec.position, spec.period, spec.initially_green),
            );
        }

        let destinations = map.destinations().to_vec();
        let spawner = Spawner::new(map.width(), map.height());

        let mut world = Self {
            map,
            grid,
            cars: HashMap::new(),
            lights,
            destinations,
            running: true,
            stats: WorldStats::default(),
            spawner,
            step_count: 0,
            next_id,
            rng,
        };

        // The perimeter is seeded with a first wave before the clock runs.
        world.spawn_cars();
        Ok(world)
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn spawn_interval(&self) -> u64 {
        self.spawner.interval()
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    /// Shuffle a slice in place, using seeded RNG if available
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        match &mut self.rng {
            Some(rng) => slice.shuffle(rng),
            None => slice.shuffle(&mut rand::rng()),
        }
    }

    /// Main simulation tick
    ///
    /// Advances the clock, activates every agent exactly once in a fresh
    /// random order, then runs the spawner on its cadence. Activations
    /// are strictly sequential: each one sees the grid as mutated by the
    /// agents activated before it in the same tick.
    pub fn tick(&mut self) -> StepSummary {
        self.step_count += 1;

        // Sorting pins down the pre-shuffle order (the agent maps iterate
        // in arbitrary order), so seeded runs reproduce exactly.
        let mut agents: Vec<AgentId> = self
            .lights
            .keys()
            .copied()
            .map(AgentId::Light)
            .chain(self.cars.keys().copied().map(AgentId::Car))
            .collect();
        agents.sort_by_key(|agent| agent.order_key());
        self.shuffle(&mut agents);

        for agent in agents {
            match agent {
                AgentId::Light(id) => {
                    let step_count = self.step_count;
                    if let Some(light) = self.lights.get_mut(&id) {
                        light.activate(step_count);
                    }
                }
                AgentId::Car(id) => {
                    let Some(mut car) = self.cars.remove(&id) else {
                        continue;
                    };
                    match car.activate(&self.map, self.map.graph(), &mut self.grid, &self.lights)
                    {
                        CarUpdateResult::Continue => {
                            self.cars.insert(id, car);
                        }
                        CarUpdateResult::Arrived => {
                            self.grid.remove(Occupant::Car(id));
                            self.stats.cars_arrived += 1;
                            info!("car {:?} reached its destination at {}", id, car.position);
                        }
                    }
                }
            }
        }

        if self.spawner.is_due(self.step_count) {
            self.spawn_cars();
        }

        StepSummary {
            step_index: self.step_count,
        }
    }

    /// Spawn a car at every free entry point
    ///
    /// An entry is blocked by a car or an obstacle sitting on it. When
    /// every entry is blocked in the same pass the whole simulation is
    /// declared finished: the perimeter deadlock cannot resolve itself.
    fn spawn_cars(&mut self) {
        let destinations = self.destinations.clone();
        let entries = self.spawner.entries().to_vec();
        let mut all_blocked = true;

        for (entry, initial_direction) in entries {
            let occupied = self
                .grid
                .contents(entry)
                .iter()
                .any(|occupant| matches!(occupant, Occupant::Car(_) | Occupant::Obstacle(_)));
            if occupied {
                continue;
            }
            all_blocked = false;

            let id = CarId(self.next_sim_id());
            let mut car = Car::new(id, entry, Some(initial_direction));
            car.destination = self.choose_random(&destinations).copied();
            debug!(
                "spawned car {:?} at {} heading {:?} toward {:?}",
                id, entry, initial_direction, car.destination
            );
            self.grid.place(Occupant::Car(id), entry);
            self.cars.insert(id, car);
            self.stats.cars_spawned += 1;
        }

        if all_blocked {
            info!("every spawn point is occupied; flagging the simulation as finished");
            self.running = false;
        }
    }

    /// Log a summary of the world state
    pub fn log_summary(&self) {
        let green = self.lights.values().filter(|l| l.is_green()).count();
        info!("=== step {} ===", self.step_count);
        info!("Active cars: {}", self.cars.len());
        info!("Total cars spawned: {}", self.stats.cars_spawned);
        info!("Total cars arrived: {}", self.stats.cars_arrived);
        info!("Traffic lights: {} ({} green)", self.lights.len(), green);
        info!("Running: {}", self.running);
    }

    /// Render the current grid as text, top row first
    ///
    /// Legend: C car, G/R light by state, # obstacle, D destination,
    /// arrows for one-way roads, + for multi-direction roads.
    pub fn render_map(&self) -> String {
        let mut lines = Vec::with_capacity(self.map.height() as usize);
        for y in (0..self.map.height()).rev() {
            let mut line = String::with_capacity(self.map.width() as usize);
            for x in 0..self.map.width() {
                line.push(self.cell_symbol(Position::new(x, y)));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    fn cell_symbol(&self, position: Position) -> char {
        let contents = self.grid.contents(position);
        if contents.iter().any(|occupant| occupant.is_car()) {
            return 'C';
        }
        if let Some(light_id) = contents.iter().find_map(|occupant| occupant.as_light()) {
            return match self.lights.get(&light_id) {
                Some(light) if light.is_green() => 'G',
                _ => 'R',
            };
        }
        match self.map.cell(position) {
            Some(StaticCell::Obstacle) => '#',
            Some(StaticCell::Destination) => 'D',
            Some(StaticCell::Road { directions }) => match directions.as_slice() {
                [Direction::Up] => '^',
                [Direction::Down] => 'v',
                [Direction::Left] => '<',
                [Direction::Right] => '>',
                _ => '+',
            },
            Some(StaticCell::TrafficLight { .. }) | None => ' ',
        }
    }
}
