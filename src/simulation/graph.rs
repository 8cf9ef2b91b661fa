//! Directed travel graph over map positions
//!
//! A thin wrapper around a petgraph `DiGraph` keyed by grid position,
//! plus the breadth-first route search the cars use. Edges are inserted
//! by the map compiler in scan order, and route search explores
//! successors in that same order so ties are broken deterministically.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

use super::types::Position;

/// Directed reachability graph over legal travel hops
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    graph: DiGraph<Position, ()>,
    nodes: HashMap<Position, NodeIndex>,
}

impl RouteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a position as a graph node. Idempotent.
    pub fn add_node(&mut self, position: Position) {
        if self.nodes.contains_key(&position) {
            return;
        }
        let index = self.graph.add_node(position);
        self.nodes.insert(position, index);
    }

    /// Add a directed travel hop. Both endpoints must already be nodes.
    pub fn add_edge(&mut self, from: Position, to: Position) {
        let (Some(&a), Some(&b)) = (self.nodes.get(&from), self.nodes.get(&to)) else {
            return;
        };
        self.graph.add_edge(a, b, ());
    }

    pub fn contains(&self, position: Position) -> bool {
        self.nodes.contains_key(&position)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Successors of a position in edge insertion order
    ///
    /// petgraph iterates adjacency in reverse insertion order; undo that
    /// so route search sees the compiler's order.
    pub fn successors(&self, position: Position) -> Vec<Position> {
        let Some(&index) = self.nodes.get(&position) else {
            return Vec::new();
        };
        let mut out: Vec<Position> = self
            .graph
            .neighbors(index)
            .map(|n| self.graph[n])
            .collect();
        out.reverse();
        out
    }

    /// Shortest path by hop count from `start` to `goal`, start first
    ///
    /// Plain FIFO breadth-first search; the first path found wins, so
    /// equal-length routes are decided by successor order. `avoid` is
    /// never expanded into, which makes the goal unreachable when it is
    /// the avoided node itself.
    pub fn shortest_path(
        &self,
        start: Position,
        goal: Position,
        avoid: Option<Position>,
    ) -> Option<Vec<Position>> {
        if start == goal {
            return Some(vec![start]);
        }

        let mut visited: HashSet<Position> = HashSet::new();
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut frontier: VecDeque<Position> = VecDeque::new();
        visited.insert(start);
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            for next in self.successors(current) {
                if visited.contains(&next) || Some(next) == avoid {
                    continue;
                }
                visited.insert(next);
                came_from.insert(next, current);
                if next == goal {
                    let mut path = vec![goal];
                    let mut cursor = goal;
                    while let Some(&previous) = came_from.get(&cursor) {
                        path.push(previous);
                        cursor = previous;
                    }
                    path.reverse();
                    return Some(path);
                }
                frontier.push_back(next);
            }
        }

        None
    }
}
