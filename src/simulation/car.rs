//! Car agent: route following and blocked-traffic recovery
//!
//! Cars follow breadth-first routes over the travel graph and resolve
//! congestion with a two-stage policy: after a short wait behind another
//! car they try a lane change, after a long one they reroute around the
//! blocking cell. Waiting at a red light is different: it never counts
//! toward the blocked threshold, because the light will open on its own.

use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use super::graph::RouteGraph;
use super::grid::MultiGrid;
use super::light::TrafficLight;
use super::map::CityMap;
use super::types::{
    CarId, Direction, LightId, Occupant, Position, LANE_CHANGE_AFTER, REROUTE_AFTER,
};

/// Observable phase of a car's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CarState {
    /// No usable route; the car sits still
    Idle,
    /// Advancing along a computed route
    Following,
    /// The next route cell is held by a car or a red light
    Blocked,
    /// Blocked long enough that a detour was just computed
    ReroutingPending,
    /// Reached its destination; removed from the world
    Arrived,
}

/// Result of one activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarUpdateResult {
    Continue,
    Arrived,
}

/// A car navigating the grid
#[derive(Debug, Clone)]
pub struct Car {
    pub id: CarId,
    pub position: Position,
    pub destination: Option<Position>,
    /// Route to the destination; the head is always the current position
    pub path: Vec<Position>,
    pub direction: Option<Direction>,
    pub state: CarState,
    blocked_ticks: u32,
    avoided_node: Option<Position>,
}

impl Car {
    pub fn new(id: CarId, position: Position, direction: Option<Direction>) -> Self {
        Self {
            id,
            position,
            destination: None,
            path: Vec::new(),
            direction,
            state: CarState::Idle,
            blocked_ticks: 0,
            avoided_node: None,
        }
    }

    /// Ticks spent waiting behind another car
    pub fn blocked_ticks(&self) -> u32 {
        self.blocked_ticks
    }

    /// Cell excluded from the last reroute, if any
    pub fn avoided_node(&self) -> Option<Position> {
        self.avoided_node
    }

    /// Run one activation of the movement state machine
    ///
    /// Occupancy is read from the grid as it stands right now, not from a
    /// tick-start snapshot: a car activated earlier this tick may already
    /// have vacated or taken a cell this car is looking at.
    pub fn activate(
        &mut self,
        map: &CityMap,
        graph: &RouteGraph,
        grid: &mut MultiGrid,
        lights: &HashMap<LightId, TrafficLight>,
    ) -> CarUpdateResult {
        if self.destination == Some(self.position) {
            debug!("car {:?} arrived at {}", self.id, self.position);
            self.state = CarState::Arrived;
            return CarUpdateResult::Arrived;
        }

        if self.path.len() < 2 {
            self.recompute_path(graph, None);
            if self.path.len() < 2 {
                self.state = CarState::Idle;
                return CarUpdateResult::Continue;
            }
        }

        let next = self.path[1];
        let (car_ahead, red_light) = {
            let contents = grid.contents(next);
            let car_ahead = contents.iter().any(|occupant| occupant.is_car());
            let red_light = contents
                .iter()
                .find_map(|occupant| occupant.as_light())
                .and_then(|light_id| lights.get(&light_id))
                .is_some_and(|light| !light.is_green());
            (car_ahead, red_light)
        };

        if car_ahead {
            self.blocked_ticks += 1;
            let cars_nearby = grid
                .neighborhood(next, true, false)
                .into_iter()
                .filter(|cell| grid.contents(*cell).iter().any(|occupant| occupant.is_car()))
                .count();
            debug!(
                "car {:?} blocked at {} by a car on {} ({} ticks, {} cars nearby)",
                self.id, self.position, next, self.blocked_ticks, cars_nearby
            );

            if self.blocked_ticks >= LANE_CHANGE_AFTER && self.try_lane_change(next, map, graph, grid)
            {
                self.state = CarState::Following;
                return CarUpdateResult::Continue;
            }

            if self.blocked_ticks >= REROUTE_AFTER {
                debug!("car {:?} rerouting around {}", self.id, next);
                self.avoided_node = Some(next);
                self.recompute_path(graph, self.avoided_node);
                self.blocked_ticks = 0;
                self.state = CarState::ReroutingPending;
                return CarUpdateResult::Continue;
            }

            self.state = CarState::Blocked;
            return CarUpdateResult::Continue;
        }

        // Free to move as far as other cars are concerned.
        self.blocked_ticks = 0;

        if red_light {
            debug!("car {:?} waiting on red light at {}", self.id, next);
            self.state = CarState::Blocked;
            return CarUpdateResult::Continue;
        }

        if let Some(direction) = Direction::of_travel(self.position, next) {
            self.direction = Some(direction);
        }
        grid.relocate(Occupant::Car(self.id), next);
        debug!("car {:?} advanced from {} to {}", self.id, self.position, next);
        self.position = next;
        self.path.remove(0);
        self.state = CarState::Following;
        CarUpdateResult::Continue
    }

    fn recompute_path(&mut self, graph: &RouteGraph, avoid: Option<Position>) {
        let Some(destination) = self.destination else {
            debug!("car {:?} has no destination assigned", self.id);
            self.path.clear();
            return;
        };

        match graph.shortest_path(self.position, destination, avoid) {
            Some(path) => {
                debug!(
                    "car {:?} routed from {} to {} in {} hops",
                    self.id,
                    self.position,
                    destination,
                    path.len().saturating_sub(1)
                );
                self.path = path;
            }
            None => {
                debug!(
                    "car {:?} found no route from {} to {}",
                    self.id, self.position, destination
                );
                self.path.clear();
            }
        }
    }

    /// Try to sidestep into a parallel lane next to the blocked cell
    ///
    /// Candidates are the four orthogonal neighbors of the blocked cell,
    /// scanned in a fixed order. A candidate must be inside the grid,
    /// free of any car, obstacle, destination, or light occupant, and be
    /// a road running in the car's current travel direction. At most one
    /// lane change happens per activation, in place of normal movement.
    fn try_lane_change(
        &mut self,
        blocked: Position,
        map: &CityMap,
        graph: &RouteGraph,
        grid: &mut MultiGrid,
    ) -> bool {
        let Some(direction) = self.direction else {
            return false;
        };

        let candidates = [
            Position::new(blocked.x, blocked.y + 1),
            Position::new(blocked.x, blocked.y - 1),
            Position::new(blocked.x + 1, blocked.y),
            Position::new(blocked.x - 1, blocked.y),
        ];

        for lateral in candidates {
            if !lateral.in_bounds(map.width(), map.height()) {
                continue;
            }
            let occupied = grid
                .contents(lateral)
                .iter()
                .any(|occupant| !matches!(occupant, Occupant::Road(_)));
            if occupied || !map.road_allows(lateral, direction) {
                continue;
            }

            debug!("car {:?} changed lane from {} to {}", self.id, self.position, lateral);
            grid.relocate(Occupant::Car(self.id), lateral);
            self.position = lateral;
            self.recompute_path(graph, None);
            return true;
        }

        false
    }
}
