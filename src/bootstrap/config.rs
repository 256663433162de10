//! Bootstrap run configuration
//!
//! Loaded from a JSON file (every field optional) and overridden from the
//! command line.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::model::ResidualOptions;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_ITERATIONS: usize = 1000;
pub const MAX_ITERATIONS: usize = 100_000;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Treatment of reconstructed cells that come out negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeCellPolicy {
    /// Use the reconstructed value as is
    #[default]
    Keep,
    /// Clamp to zero before re-projecting
    Floor,
    /// Report the iteration as failed
    Reject,
}

impl FromStr for NegativeCellPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "floor" => Ok(Self::Floor),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown negative cell policy: {}", other)),
        }
    }
}

/// Configuration for a bootstrap run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Base seed; iteration k draws from a stream seeded with `seed + k`
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of resampling iterations
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    #[serde(default)]
    pub residuals: ResidualOptions,

    #[serde(default)]
    pub negative_cells: NegativeCellPolicy,

    /// Replace projected future payments with Gamma draws (mean m,
    /// variance phi * m)
    #[serde(default)]
    pub process_variance: bool,

    /// Run iterations on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,

    /// Keep per-iteration draws and triangles for replay
    #[serde(default = "default_true")]
    pub keep_records: bool,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_true() -> bool {
    true
}

fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            iterations: DEFAULT_ITERATIONS,
            residuals: ResidualOptions::default(),
            negative_cells: NegativeCellPolicy::Keep,
            process_variance: false,
            parallel: false,
            keep_records: true,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl BootstrapConfig {
    /// Small run for spot checks and demonstrations
    pub fn quick() -> Self {
        Self {
            iterations: 100,
            ..Default::default()
        }
    }

    /// Large parallel run without per-iteration records
    pub fn full() -> Self {
        Self {
            iterations: 10_000,
            parallel: true,
            keep_records: false,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Load a config from a JSON file
    pub fn from_json_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ConfigError::Iterations {
                found: self.iterations,
                max: MAX_ITERATIONS,
            });
        }
        if self.histogram_bins == 0 {
            return Err(ConfigError::HistogramBins);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BootstrapConfig::from_json_str(
            r#"{"iterations": 250, "negative_cells": "floor", "residuals": {"center": true}}"#,
        )
        .unwrap();
        assert_eq!(config.iterations, 250);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.negative_cells, NegativeCellPolicy::Floor);
        assert!(config.residuals.center);
        assert!(config.residuals.dof_adjustment);
        assert!(config.keep_records);
        assert_eq!(config.histogram_bins, DEFAULT_HISTOGRAM_BINS);
    }

    #[test]
    fn test_validation() {
        assert!(BootstrapConfig::default().validate().is_ok());
        assert!(matches!(
            BootstrapConfig::default().with_iterations(0).validate(),
            Err(ConfigError::Iterations { found: 0, .. })
        ));
        assert!(matches!(
            BootstrapConfig::from_json_str(r#"{"histogram_bins": 0}"#),
            Err(ConfigError::HistogramBins)
        ));
        assert!(matches!(
            BootstrapConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_presets() {
        assert_eq!(BootstrapConfig::quick().iterations, 100);
        let full = BootstrapConfig::full();
        assert!(full.parallel);
        assert!(!full.keep_records);
        assert!(full.validate().is_ok());
    }
}
