//! # somlattice - Online Self-Organizing Maps
//!
//! A Self-Organizing Map (Kohonen map) learns an `N x N` lattice of prototype
//! vectors from an ordered set of input vectors ("teachers"). After training,
//! neighbouring lattice nodes hold similar prototypes, so the map is a
//! topology-preserving 2D picture of the input space.
//!
//! ## Training
//!
//! Each teacher, in sequence order, goes through:
//!
//! 1. **BMU search**: the node whose prototype is nearest (Euclidean).
//! 2. **Schedule**: learning rate `0.1 · e^(-t/h)` and neighbourhood radius
//!    `N/2 · e^(-t/h)`, where `t` is the teacher's position in the pass and
//!    `h = n_teacher / 4`.
//! 3. **Update**: every prototype moves toward the teacher by
//!    `rate · exp(-d² / 2σ²)`, `d` being its grid distance to the BMU.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use somlattice::{Lattice, LatticeConfig};
//!
//! let teachers = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
//! let mut lattice = Lattice::new(&teachers, &LatticeConfig::new(20, Some(10)))?;
//!
//! for _ in 0..100 {
//!     lattice.train();
//! }
//!
//! let (row, col) = lattice.best_matching_unit(&[0.5, 0.9, 0.1])?;
//! somlattice::render::save_png(lattice.nodes(), lattice.dimension(), 16, "map.png")?;
//! ```
//!
//! ## Architecture
//!
//! - [`som`] - Lattice, grid topology and decay schedules
//! - [`render`] - RGB images of three-channel maps
//! - [`config`] - Serializable configuration
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod render;
pub mod som;

// Re-export commonly used types
pub use config::{Config, LatticeConfig, RenderConfig};
pub use error::{Result, SomError};
pub use som::{Lattice, Schedule};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default grid dimension.
pub const DEFAULT_DIMENSION: usize = 20;
