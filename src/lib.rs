//! City Traffic Simulation Library
//!
//! A tick-based traffic simulation over an ASCII city map: roads carry
//! directional flow, traffic lights gate intersections, and cars route
//! themselves from the grid corners to their destinations. The engine is
//! strictly single-threaded; `interface` is the surface an external
//! transport layer drives.

pub mod interface;
pub mod simulation;
