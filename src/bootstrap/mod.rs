//! ODP residual bootstrap
//!
//! - `config`: run settings and negative-cell policy
//! - `resample`: residual draws and synthetic triangle re-projection
//! - `record`: per-iteration output kept for replay
//! - `engine`: seeded, optionally parallel iteration driver

mod config;
mod engine;
mod record;
mod resample;

pub use config::{
    BootstrapConfig, NegativeCellPolicy, DEFAULT_HISTOGRAM_BINS, DEFAULT_ITERATIONS, DEFAULT_SEED,
    MAX_ITERATIONS,
};
pub use engine::{BootstrapEngine, BootstrapRun};
pub use record::{IterationOutcome, IterationRecord, SampledCell};
pub use resample::Resampler;
