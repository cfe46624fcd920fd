//! Self-Organizing Map (SOM) on a square lattice.
//!
//! Training is online and sequential. Every teacher triggers three steps in
//! order:
//!
//! - **BMU search**: the node whose prototype is nearest to the teacher (lattice.rs)
//! - **Schedule**: learning rate and neighbourhood radius for the step (schedule.rs)
//! - **Update**: Gaussian-weighted pull of every prototype toward the teacher (lattice.rs)
//!
//! Grid positions and flat node indices are related by the raster-order
//! mapping in grid.rs.

pub mod grid;
mod lattice;
pub mod schedule;

pub use lattice::Lattice;
pub use schedule::{Schedule, INITIAL_LEARNING_RATE};
