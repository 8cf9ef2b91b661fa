//! Map compiler
//!
//! Parses an ASCII city map plus a character classification table into
//! the immutable static cell map and the directed reachability graph.
//! Compilation is a pure function of its inputs: no hidden state, so the
//! walking and inheritance rules are unit-testable in isolation.

use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::error::ConfigError;
use super::graph::RouteGraph;
use super::types::{Direction, Position};

/// What a map character compiles to, before placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellSpec {
    Road { directions: Vec<Direction> },
    TrafficLight { period: u64, initially_green: bool },
    Destination,
    Obstacle,
}

/// Character classification table, loaded from a JSON object
///
/// Values are one direction token, a list of tokens (multi-direction
/// road), a positive integer (traffic-light toggle period), or the
/// strings `"Destination"` / `"Obstacle"`. A lowercase traffic-light
/// character starts green, an uppercase one red.
#[derive(Debug, Clone, Default)]
pub struct DirectionTable {
    entries: HashMap<char, CellSpec>,
}

impl DirectionTable {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let root: HashMap<String, Value> = serde_json::from_str(source)?;
        let mut entries = HashMap::new();

        for (key, value) in root {
            let mut chars = key.chars();
            let symbol = match (chars.next(), chars.next()) {
                (Some(symbol), None) => symbol,
                _ => return Err(ConfigError::TableKey { key }),
            };
            entries.insert(symbol, Self::parse_entry(symbol, &value)?);
        }

        Ok(Self { entries })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    fn parse_entry(symbol: char, value: &Value) -> Result<CellSpec, ConfigError> {
        match value {
            Value::String(token) if token == "Destination" => Ok(CellSpec::Destination),
            Value::String(token) if token == "Obstacle" => Ok(CellSpec::Obstacle),
            Value::String(token) => {
                let direction = Direction::from_token(token).ok_or_else(|| {
                    ConfigError::DirectionToken {
                        symbol,
                        token: token.clone(),
                    }
                })?;
                Ok(CellSpec::Road {
                    directions: vec![direction],
                })
            }
            Value::Array(tokens) if !tokens.is_empty() => {
                let mut directions = Vec::with_capacity(tokens.len());
                for token in tokens {
                    let token = token.as_str().ok_or(ConfigError::TableEntry { symbol })?;
                    let direction = Direction::from_token(token).ok_or_else(|| {
                        ConfigError::DirectionToken {
                            symbol,
                            token: token.to_string(),
                        }
                    })?;
                    directions.push(direction);
                }
                Ok(CellSpec::Road { directions })
            }
            Value::Number(period) => {
                let period = period
                    .as_u64()
                    .filter(|p| *p > 0)
                    .ok_or(ConfigError::LightPeriod { symbol })?;
                Ok(CellSpec::TrafficLight {
                    period,
                    initially_green: symbol.is_lowercase(),
                })
            }
            _ => Err(ConfigError::TableEntry { symbol }),
        }
    }

    pub fn get(&self, symbol: char) -> Option<&CellSpec> {
        self.entries.get(&symbol)
    }
}

/// Immutable classification of one compiled grid cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticCell {
    Road { directions: Vec<Direction> },
    Destination,
    TrafficLight { directions: Vec<Direction> },
    Obstacle,
}

/// Compile-time description of one traffic light
#[derive(Debug, Clone)]
pub struct LightSpec {
    pub position: Position,
    pub period: u64,
    pub initially_green: bool,
}

/// The compiled static map: cell classifications plus the travel graph
#[derive(Debug, Clone)]
pub struct CityMap {
    width: i32,
    height: i32,
    cells: Vec<(Position, StaticCell)>,
    cell_index: HashMap<Position, usize>,
    graph: RouteGraph,
    light_specs: Vec<LightSpec>,
    destinations: Vec<Position>,
}

impl CityMap {
    /// Compile a rectangular character grid against a classification table
    ///
    /// Row 0 of the source is the top of the grid (maximum y). Characters
    /// absent from the table are skipped: they produce no cell and no
    /// graph entry, which is how sparse maps are expressed.
    pub fn compile(source: &str, table: &DirectionTable) -> Result<Self, ConfigError> {
        let rows: Vec<Vec<char>> = source
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().collect())
            .collect();

        if rows.is_empty() || rows[0].is_empty() {
            return Err(ConfigError::EmptyMap);
        }

        let width = rows[0].len();
        for (row, chars) in rows.iter().enumerate() {
            if chars.len() != width {
                return Err(ConfigError::RaggedMap {
                    row,
                    len: chars.len(),
                    expected: width,
                });
            }
        }

        let height = rows.len() as i32;
        let width = width as i32;

        // Pass 1: classify every known character, in scan order.
        let mut specs: HashMap<Position, CellSpec> = HashMap::new();
        let mut scan_order: Vec<Position> = Vec::new();
        for (r, chars) in rows.iter().enumerate() {
            for (c, symbol) in chars.iter().enumerate() {
                let position = Position::new(c as i32, height - 1 - r as i32);
                let Some(spec) = table.get(*symbol) else {
                    continue;
                };
                specs.insert(position, spec.clone());
                scan_order.push(position);
            }
        }

        // Pass 2: traffic lights inherit the directions their directional
        // road neighbors travel into them with.
        let mut inherited: HashMap<Position, Vec<Direction>> = HashMap::new();
        for position in &scan_order {
            if !matches!(specs.get(position), Some(CellSpec::TrafficLight { .. })) {
                continue;
            }
            let mut directions = Vec::new();
            for approach in Direction::ALL {
                let neighbor = position.step(approach);
                if let Some(CellSpec::Road {
                    directions: neighbor_directions,
                }) = specs.get(&neighbor)
                {
                    for &travel in neighbor_directions {
                        if neighbor.step(travel) == *position {
                            directions.push(travel);
                        }
                    }
                }
            }
            inherited.insert(*position, directions);
        }

        // Pass 3: nodes for every non-obstacle cell, then edges by walking
        // outward in each allowed direction.
        let mut graph = RouteGraph::new();
        for position in &scan_order {
            if !matches!(specs.get(position), Some(CellSpec::Obstacle)) {
                graph.add_node(*position);
            }
        }

        let mut cells = Vec::with_capacity(scan_order.len());
        let mut cell_index = HashMap::with_capacity(scan_order.len());
        let mut light_specs = Vec::new();
        let mut destinations = Vec::new();

        for position in &scan_order {
            let spec = &specs[position];
            let walk_directions: &[Direction] = match spec {
                CellSpec::Road { directions } => directions,
                CellSpec::TrafficLight { .. } => &inherited[position],
                CellSpec::Destination | CellSpec::Obstacle => &[],
            };

            for &direction in walk_directions {
                if let Some(target) = walk(*position, direction, width, height, &specs) {
                    graph.add_edge(*position, target);
                }
            }

            let cell = match spec {
                CellSpec::Road { directions } => StaticCell::Road {
                    directions: directions.clone(),
                },
                CellSpec::TrafficLight {
                    period,
                    initially_green,
                } => {
                    light_specs.push(LightSpec {
                        position: *position,
                        period: *period,
                        initially_green: *initially_green,
                    });
                    StaticCell::TrafficLight {
                        directions: inherited[position].clone(),
                    }
                }
                CellSpec::Destination => {
                    destinations.push(*position);
                    StaticCell::Destination
                }
                CellSpec::Obstacle => StaticCell::Obstacle,
            };

            cell_index.insert(*position, cells.len());
            cells.push((*position, cell));
        }

        debug!(
            "compiled {}x{} map: {} cells, {} graph nodes, {} edges, {} lights, {} destinations",
            width,
            height,
            cells.len(),
            graph.node_count(),
            graph.edge_count(),
            light_specs.len(),
            destinations.len()
        );

        Ok(Self {
            width,
            height,
            cells,
            cell_index,
            graph,
            light_specs,
            destinations,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell(&self, position: Position) -> Option<&StaticCell> {
        self.cell_index
            .get(&position)
            .map(|&index| &self.cells[index].1)
    }

    /// Compiled cells in map scan order (top row first, left to right)
    pub fn cells(&self) -> &[(Position, StaticCell)] {
        &self.cells
    }

    pub fn graph(&self) -> &RouteGraph {
        &self.graph
    }

    pub fn light_specs(&self) -> &[LightSpec] {
        &self.light_specs
    }

    pub fn destinations(&self) -> &[Position] {
        &self.destinations
    }

    /// True when the cell is a road whose lanes include `direction`
    pub fn road_allows(&self, position: Position, direction: Direction) -> bool {
        match self.cell(position) {
            Some(StaticCell::Road { directions }) => directions.contains(&direction),
            _ => false,
        }
    }
}

/// Walk outward from a cell until something graph-bearing is found
///
/// Bounds or an obstacle end the walk with no edge; a traffic light or
/// any other compiled cell ends it with an edge. Unmapped characters are
/// stepped over.
fn walk(
    from: Position,
    direction: Direction,
    width: i32,
    height: i32,
    specs: &HashMap<Position, CellSpec>,
) -> Option<Position> {
    let mut cursor = from;
    loop {
        cursor = cursor.step(direction);
        if !cursor.in_bounds(width, height) {
            return None;
        }
        match specs.get(&cursor) {
            Some(CellSpec::Obstacle) => return None,
            Some(_) => return Some(cursor),
            None => continue,
        }
    }
}

/// Read a map source file, mapping IO failures to `ConfigError`
pub fn load_map_source<P: AsRef<Path>>(path: P) -> Result<String, ConfigError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
