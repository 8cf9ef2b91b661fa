//! Multi-occupancy world grid
//!
//! Static cells and cars alike are placed into per-cell occupant lists,
//! and every occupant's position is tracked so relocation and removal
//! stay O(1) relative to cell occupancy. The grid does not enforce
//! bounds on placement; callers validate against width/height first,
//! mirroring the compiler's own bounds checks. Neighborhood queries do
//! clip to the grid because out-of-bounds cells cannot be occupied.

use std::collections::HashMap;

use super::types::{Occupant, Position};

/// A bounded 2D space where each cell holds any number of occupants
#[derive(Debug, Clone)]
pub struct MultiGrid {
    width: i32,
    height: i32,
    cells: Vec<Vec<Occupant>>,
    positions: HashMap<Occupant, Position>,
}

impl MultiGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let cell_count = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            cells: vec![Vec::new(); cell_count],
            positions: HashMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, position: Position) -> usize {
        debug_assert!(position.in_bounds(self.width, self.height));
        (position.y * self.width + position.x) as usize
    }

    /// Put a new occupant into a cell
    pub fn place(&mut self, occupant: Occupant, position: Position) {
        debug_assert!(!self.positions.contains_key(&occupant));
        let index = self.index(position);
        self.cells[index].push(occupant);
        self.positions.insert(occupant, position);
    }

    /// Take an occupant off the grid, returning where it was
    pub fn remove(&mut self, occupant: Occupant) -> Option<Position> {
        let position = self.positions.remove(&occupant)?;
        let index = self.index(position);
        self.cells[index].retain(|resident| *resident != occupant);
        Some(position)
    }

    /// Move a placed occupant to a new cell and update its stored position
    pub fn relocate(&mut self, occupant: Occupant, new_position: Position) {
        if let Some(old_position) = self.positions.get(&occupant).copied() {
            let old_index = self.index(old_position);
            self.cells[old_index].retain(|resident| *resident != occupant);
        }
        let index = self.index(new_position);
        self.cells[index].push(occupant);
        self.positions.insert(occupant, new_position);
    }

    /// Everything currently in a cell; empty for out-of-bounds positions
    pub fn contents(&self, position: Position) -> &[Occupant] {
        if !position.in_bounds(self.width, self.height) {
            return &[];
        }
        let index = (position.y * self.width + position.x) as usize;
        &self.cells[index]
    }

    pub fn position_of(&self, occupant: Occupant) -> Option<Position> {
        self.positions.get(&occupant).copied()
    }

    /// All placed occupants with their positions, in no particular order
    pub fn occupants(&self) -> impl Iterator<Item = (Occupant, Position)> + '_ {
        self.positions.iter().map(|(o, p)| (*o, *p))
    }

    /// In-bounds positions surrounding a cell
    pub fn neighborhood(
        &self,
        position: Position,
        include_diagonals: bool,
        include_center: bool,
    ) -> Vec<Position> {
        let mut out = Vec::with_capacity(9);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 && !include_center {
                    continue;
                }
                if !include_diagonals && dx != 0 && dy != 0 {
                    continue;
                }
                let neighbor = Position::new(position.x + dx, position.y + dy);
                if neighbor.in_bounds(self.width, self.height) {
                    out.push(neighbor);
                }
            }
        }
        out
    }
}
