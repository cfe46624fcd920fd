//! Configuration for lattice training and rendering.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration used by the command-line harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lattice configuration.
    pub lattice: LatticeConfig,

    /// Image rendering configuration.
    pub render: RenderConfig,

    /// Number of training passes over the teacher sequence.
    /// Zero leaves the lattice at its initial state.
    /// Default: 1.
    pub passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lattice: LatticeConfig::default(),
            render: RenderConfig::default(),
            passes: 1,
        }
    }
}

impl Config {
    /// Loads a configuration from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Lattice configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// Grid dimension (grid is dim x dim).
    /// Default: 20.
    pub dimension: usize,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            dimension: crate::DEFAULT_DIMENSION,
            seed: None,
        }
    }
}

impl LatticeConfig {
    /// Creates a configuration for an `dimension x dimension` lattice.
    pub fn new(dimension: usize, seed: Option<u64>) -> Self {
        Self { dimension, seed }
    }

    /// Returns the total number of nodes in the lattice.
    #[inline]
    pub fn total_nodes(&self) -> usize {
        self.dimension * self.dimension
    }
}

/// Image rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pixel edge length of one node.
    /// Default: 16.
    pub scale: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { scale: 16 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lattice.dimension, 20);
        assert_eq!(config.lattice.total_nodes(), 400);
        assert!(config.lattice.seed.is_none());
        assert_eq!(config.render.scale, 16);
        assert_eq!(config.passes, 1);
    }

    #[test]
    fn test_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{ "lattice": { "dimension": 4, "seed": 7 } }"#).unwrap();
        assert_eq!(config.lattice.dimension, 4);
        assert_eq!(config.lattice.seed, Some(7));
        assert_eq!(config.render.scale, 16);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "passes": 0, "render": { "scale": 2 } }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.passes, 0);
        assert_eq!(config.render.scale, 2);
        assert_eq!(config.lattice.dimension, 20);
    }
}
