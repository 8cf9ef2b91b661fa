//! Core types for the city simulation
//!
//! Grid coordinates, travel directions, and the id newtypes shared by
//! every component.

use serde::Serialize;
use std::fmt;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SimId(pub usize);

/// A wrapper type for car IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CarId(pub SimId);

/// A wrapper type for traffic light IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LightId(pub SimId);

/// A wrapper type for road cell IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RoadId(pub SimId);

/// A wrapper type for destination cell IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DestinationId(pub SimId);

/// A wrapper type for obstacle cell IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObstacleId(pub SimId);

/// A cell coordinate on the bounded, non-wrapping city grid
///
/// y increases upward: row 0 of a map file is the row with the maximum y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell one step away in `direction`. May leave the grid; callers
    /// validate with [`Position::in_bounds`].
    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn in_bounds(self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.x < width && self.y >= 0 && self.y < height
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Travel direction of a road lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit delta in "y grows upward" coordinates
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Parse a direction token from the map dictionary
    pub fn from_token(token: &str) -> Option<Direction> {
        match token {
            "Up" => Some(Direction::Up),
            "Down" => Some(Direction::Down),
            "Left" => Some(Direction::Left),
            "Right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Direction of travel implied by a hop from `from` to `to`
    ///
    /// Graph edges can span gaps in sparse maps, so the hop is not
    /// necessarily a unit step; the x axis wins ties like the original
    /// movement code.
    pub fn of_travel(from: Position, to: Position) -> Option<Direction> {
        if to.x > from.x {
            Some(Direction::Right)
        } else if to.x < from.x {
            Some(Direction::Left)
        } else if to.y > from.y {
            Some(Direction::Up)
        } else if to.y < from.y {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

/// Everything that can occupy a grid cell
///
/// Tagged ids rather than a trait hierarchy: the five occupant kinds are
/// flat behaviors and the step logic dispatches with a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    Road(RoadId),
    Destination(DestinationId),
    TrafficLight(LightId),
    Obstacle(ObstacleId),
    Car(CarId),
}

impl Occupant {
    pub fn is_car(self) -> bool {
        matches!(self, Occupant::Car(_))
    }

    pub fn as_car(self) -> Option<CarId> {
        match self {
            Occupant::Car(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_light(self) -> Option<LightId> {
        match self {
            Occupant::TrafficLight(id) => Some(id),
            _ => None,
        }
    }
}

/// Consecutive blocked ticks before a car tries a lane change
pub const LANE_CHANGE_AFTER: u32 = 2;

/// Consecutive blocked ticks before a car reroutes around the blocker
pub const REROUTE_AFTER: u32 = 10;

/// Default number of ticks between spawner runs
pub const DEFAULT_SPAWN_INTERVAL: u64 = 2;
