//! Residual resampling and synthetic triangle reconstruction
//!
//! The random source is always passed in by the caller. The resampler keeps
//! no RNG state of its own, so a run is reproducible from its seeds alone.

use rand::Rng;
use rand_distr::{Distribution, Gamma};

use super::config::{BootstrapConfig, NegativeCellPolicy};
use super::record::{IterationOutcome, IterationRecord, SampledCell};
use crate::error::IterationError;
use crate::model::{ChainLadder, OdpFit};
use crate::triangle::TriangleKind;

/// Relative tolerance when checking replayed fitted values against the fit
const FITTED_TOLERANCE: f64 = 1e-9;

/// Draws residuals and re-projects synthetic triangles against a fixed fit
#[derive(Debug, Clone, Copy)]
pub struct Resampler<'a> {
    fit: &'a OdpFit,
    negative_cells: NegativeCellPolicy,
    process_variance: bool,
}

impl<'a> Resampler<'a> {
    pub fn new(fit: &'a OdpFit, config: &BootstrapConfig) -> Self {
        Self {
            fit,
            negative_cells: config.negative_cells,
            process_variance: config.process_variance,
        }
    }

    /// Draw one residual per populated cell, uniformly with replacement
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SampledCell> {
        let pool = self.fit.pool();
        self.fit
            .fitted_incremental()
            .populated_cells()
            .enumerate()
            .map(|(sequence, (origin, development, fitted))| {
                let pool_index = rng.random_range(0..pool.len());
                let entry = &pool.entries()[pool_index];
                SampledCell {
                    sequence,
                    origin,
                    development,
                    fitted,
                    residual: entry.adjusted,
                    pool_index,
                    source_origin: entry.origin,
                    source_development: entry.development,
                    value: fitted + entry.adjusted * fitted.sqrt(),
                }
            })
            .collect()
    }

    /// Run one complete iteration: draw, reconstruct, re-project
    pub fn run_iteration<R: Rng + ?Sized>(
        &self,
        iteration: usize,
        rng: &mut R,
    ) -> IterationOutcome {
        let samples = self.draw(rng);
        self.project(iteration, samples, Some(rng))
    }

    /// Re-project previously persisted draws without any randomness
    ///
    /// Reproduces the recorded reserve exactly when process variance is off;
    /// with process variance on, the expected future payments are used.
    pub fn replay(&self, iteration: usize, samples: &[SampledCell]) -> IterationOutcome {
        let samples = samples
            .iter()
            .map(|s| SampledCell {
                value: s.reconstructed(),
                ..s.clone()
            })
            .collect();
        self.project::<rand_chacha::ChaCha20Rng>(iteration, samples, None)
    }

    fn project<R: Rng + ?Sized>(
        &self,
        iteration: usize,
        mut samples: Vec<SampledCell>,
        rng: Option<&mut R>,
    ) -> IterationOutcome {
        let fitted = self.fit.fitted_incremental();
        let expected = fitted.populated_count();
        if samples.len() != expected {
            return Err(IterationError::DrawCountMismatch {
                iteration,
                expected,
                found: samples.len(),
            });
        }

        // With the count matched and no duplicates, every cell is covered once
        let mut filled: Vec<Vec<bool>> =
            fitted.rows().iter().map(|r| vec![false; r.len()]).collect();
        for sample in &samples {
            let (origin, development) = (sample.origin, sample.development);
            let unknown = IterationError::UnknownCell {
                iteration,
                origin,
                development,
            };
            let expected_fitted = fitted.get(origin, development).ok_or(unknown)?;
            let seen = &mut filled[origin][development];
            if *seen {
                return Err(IterationError::DuplicateCell {
                    iteration,
                    origin,
                    development,
                });
            }
            *seen = true;

            let tolerance = FITTED_TOLERANCE * expected_fitted.abs();
            let fitted_matches = (sample.fitted - expected_fitted).abs() <= tolerance;
            if !fitted_matches {
                return Err(IterationError::FittedMismatch {
                    iteration,
                    origin,
                    development,
                    expected: expected_fitted,
                    found: sample.fitted,
                });
            }
        }

        let negative_cells = samples.iter().filter(|s| s.value < 0.0).count();
        if negative_cells > 0 {
            match self.negative_cells {
                NegativeCellPolicy::Keep => {}
                NegativeCellPolicy::Floor => {
                    for sample in samples.iter_mut().filter(|s| s.value < 0.0) {
                        sample.value = 0.0;
                    }
                }
                NegativeCellPolicy::Reject => {
                    return Err(IterationError::NegativeCells {
                        iteration,
                        count: negative_cells,
                    });
                }
            }
            log::debug!(
                "iteration {}: {} negative reconstructed cells ({:?})",
                iteration,
                negative_cells,
                self.negative_cells
            );
        }

        let mut rows: Vec<Vec<f64>> = fitted.rows().iter().map(|r| vec![0.0; r.len()]).collect();
        for sample in &samples {
            rows[sample.origin][sample.development] = sample.value;
        }

        let incremental = fitted.with_rows(TriangleKind::Incremental, rows);
        let cumulative = incremental.to_cumulative();

        let model = ChainLadder::fit(&cumulative)
            .map_err(|source| IterationError::Projection { iteration, source })?;

        let reserve = match rng {
            Some(rng) if self.process_variance => self.simulate_future(&model, rng),
            _ => model.reserve(),
        };

        log::debug!("iteration {}: reserve {:.2}", iteration, reserve);

        Ok(IterationRecord {
            iteration,
            samples,
            incremental,
            cumulative,
            negative_cells,
            reserve,
        })
    }

    /// Sum of future payments drawn from Gamma(mean m, variance phi * m)
    fn simulate_future<R: Rng + ?Sized>(&self, model: &ChainLadder, rng: &mut R) -> f64 {
        let phi = self.fit.pool().scale_parameter();
        model
            .future_incrementals()
            .into_iter()
            .map(|(_, _, mean)| process_draw(mean, phi, rng))
            .sum()
    }
}

/// One future payment with process variance
///
/// Non-positive expected payments contribute nothing. With a zero scale
/// parameter the expected payment is returned unchanged.
fn process_draw<R: Rng + ?Sized>(mean: f64, phi: f64, rng: &mut R) -> f64 {
    if mean <= 0.0 {
        return 0.0;
    }
    if phi <= 0.0 {
        return mean;
    }
    match Gamma::new(mean / phi, phi) {
        Ok(gamma) => gamma.sample(rng),
        Err(_) => mean,
    }
}
