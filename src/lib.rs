//! ODP Bootstrap - stochastic loss reserving on claims development triangles
//!
//! This library provides:
//! - Triangle loading from CSV and built-in sample datasets
//! - Volume-weighted chain-ladder projection
//! - Over-dispersed Poisson fit with Pearson residual pool
//! - Seeded residual bootstrap, sequential or on the rayon pool
//! - Reserve distribution statistics, replay cursor and run reports

pub mod bootstrap;
pub mod distribution;
pub mod error;
pub mod model;
pub mod replay;
pub mod report;
pub mod triangle;

// Re-export commonly used types
pub use bootstrap::{
    BootstrapConfig, BootstrapEngine, BootstrapRun, IterationRecord, NegativeCellPolicy,
};
pub use distribution::{DistributionSummary, ReserveDistribution};
pub use model::{ChainLadder, OdpFit, ResidualOptions};
pub use replay::{PlaybackState, ReplayCursor, StepMode};
pub use triangle::{SampleDataset, Triangle, TriangleKind};
