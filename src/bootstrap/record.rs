//! Per-iteration output of the resampler

use serde::{Deserialize, Serialize};

use crate::error::IterationError;
use crate::triangle::Triangle;

/// One residual drawn for one cell of the synthetic triangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledCell {
    /// Position in the draw order (row-major over populated cells)
    pub sequence: usize,
    pub origin: usize,
    pub development: usize,
    /// Fitted incremental value of the target cell
    pub fitted: f64,
    /// Adjusted residual that was drawn
    pub residual: f64,
    /// Pool index of the drawn residual
    pub pool_index: usize,
    /// Cell the drawn residual was originally computed for
    pub source_origin: usize,
    pub source_development: usize,
    /// Value placed in the synthetic triangle
    pub value: f64,
}

impl SampledCell {
    /// fitted + residual * sqrt(fitted), before any negative-cell treatment
    pub fn reconstructed(&self) -> f64 {
        self.fitted + self.residual * self.fitted.sqrt()
    }
}

/// Everything produced by one resampling iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub samples: Vec<SampledCell>,
    /// Synthetic incremental triangle
    pub incremental: Triangle,
    /// Synthetic cumulative triangle that was re-projected
    pub cumulative: Triangle,
    /// Cells whose reconstructed value was below zero
    pub negative_cells: usize,
    pub reserve: f64,
}

impl IterationRecord {
    pub fn cell_count(&self) -> usize {
        self.samples.len()
    }

    /// Draws made up to and including `frame`
    pub fn revealed(&self, frame: usize) -> &[SampledCell] {
        let end = (frame + 1).min(self.samples.len());
        &self.samples[..end]
    }
}

pub type IterationOutcome = Result<IterationRecord, IterationError>;
