//! Bootstrap engine: fits the base model once, then runs the iterations
//!
//! Iteration `k` draws from its own ChaCha20 stream seeded with `seed + k`.
//! Results therefore do not depend on whether the run is sequential or on
//! the rayon pool, and any single iteration can be regenerated on its own.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use std::time::Instant;

use super::config::BootstrapConfig;
use super::record::{IterationOutcome, IterationRecord};
use super::resample::Resampler;
use crate::distribution::ReserveDistribution;
use crate::error::{BootstrapError, IterationError};
use crate::model::OdpFit;
use crate::triangle::Triangle;

/// Bootstrap engine holding a validated config and the base fit
#[derive(Debug, Clone)]
pub struct BootstrapEngine {
    config: BootstrapConfig,
    fit: OdpFit,
}

/// Collected results of a bootstrap run
#[derive(Debug, Clone)]
pub struct BootstrapRun {
    /// Iterations attempted
    pub iterations: usize,
    /// Successful iterations in order; empty when `keep_records` is off
    pub records: Vec<IterationRecord>,
    pub failures: Vec<IterationError>,
    /// Reserves of the successful iterations, in iteration order
    pub distribution: ReserveDistribution,
}

impl BootstrapRun {
    fn collect(iterations: usize, outcomes: Vec<IterationOutcome>, keep_records: bool) -> Self {
        let mut run = Self {
            iterations,
            records: Vec::new(),
            failures: Vec::new(),
            distribution: ReserveDistribution::new(),
        };
        for outcome in outcomes {
            match outcome {
                Ok(record) => {
                    run.distribution.push(record.reserve);
                    if keep_records {
                        run.records.push(record);
                    }
                }
                Err(err) => {
                    log::warn!("{}", err);
                    run.failures.push(err);
                }
            }
        }
        run
    }

    pub fn successful(&self) -> usize {
        self.distribution.count()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn reserves(&self) -> &[f64] {
        self.distribution.samples()
    }
}

impl BootstrapEngine {
    /// Validate the config and fit the base model
    pub fn new(triangle: &Triangle, config: BootstrapConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        let fit = OdpFit::fit(triangle, config.residuals)?;
        Ok(Self { config, fit })
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn fit(&self) -> &OdpFit {
        &self.fit
    }

    pub fn resampler(&self) -> Resampler<'_> {
        Resampler::new(&self.fit, &self.config)
    }

    /// Reserve of the base chain-ladder projection
    pub fn base_reserve(&self) -> f64 {
        self.fit.base_reserve()
    }

    /// Random stream for iteration `k`
    pub fn iteration_rng(&self, iteration: usize) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(self.config.seed.wrapping_add(iteration as u64))
    }

    /// Run iteration `k` on its own stream
    pub fn run_iteration(&self, iteration: usize) -> IterationOutcome {
        let mut rng = self.iteration_rng(iteration);
        self.resampler().run_iteration(iteration, &mut rng)
    }

    /// Run the configured number of iterations
    pub fn run(&self) -> BootstrapRun {
        self.run_n(self.config.iterations)
    }

    pub fn run_n(&self, iterations: usize) -> BootstrapRun {
        let start = Instant::now();
        let outcomes: Vec<IterationOutcome> = if self.config.parallel {
            (0..iterations)
                .into_par_iter()
                .map(|k| self.run_iteration(k))
                .collect()
        } else {
            (0..iterations).map(|k| self.run_iteration(k)).collect()
        };

        let run = BootstrapRun::collect(iterations, outcomes, self.config.keep_records);
        log::info!(
            "bootstrap: {} iterations ({} failed) in {:?}",
            iterations,
            run.failed(),
            start.elapsed()
        );
        run
    }

    /// Run sequentially from one caller-supplied stream
    pub fn run_with_rng<R: Rng + ?Sized>(&self, iterations: usize, rng: &mut R) -> BootstrapRun {
        let resampler = self.resampler();
        let outcomes = (0..iterations)
            .map(|k| resampler.run_iteration(k, rng))
            .collect();
        BootstrapRun::collect(iterations, outcomes, self.config.keep_records)
    }

    /// Re-project a stored record from its draws
    pub fn replay(&self, record: &IterationRecord) -> IterationOutcome {
        self.resampler().replay(record.iteration, &record.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::NegativeCellPolicy;
    use crate::triangle::{samples, SampleDataset, TriangleKind};

    fn engine(config: BootstrapConfig) -> BootstrapEngine {
        BootstrapEngine::new(&samples::genins(), config).unwrap()
    }

    #[test]
    fn test_same_seed_same_distribution() {
        let config = BootstrapConfig::default().with_iterations(25);
        let a = engine(config.clone()).run();
        let b = engine(config).run();
        assert_eq!(a.reserves(), b.reserves());
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = engine(BootstrapConfig::default().with_iterations(40)).run();
        let parallel = engine(BootstrapConfig {
            parallel: true,
            ..BootstrapConfig::default().with_iterations(40)
        })
        .run();
        assert_eq!(sequential.reserves(), parallel.reserves());
        assert_eq!(sequential.records, parallel.records);
    }

    #[test]
    fn test_run_counts_and_order() {
        let run = engine(BootstrapConfig::default().with_iterations(30)).run();
        assert_eq!(run.iterations, 30);
        assert_eq!(run.successful(), 30);
        assert_eq!(run.failed(), 0);
        for (k, record) in run.records.iter().enumerate() {
            assert_eq!(record.iteration, k);
            assert_eq!(run.reserves()[k], record.reserve);
        }
    }

    #[test]
    fn test_single_iteration_matches_run() {
        let e = engine(BootstrapConfig::default().with_iterations(10));
        let run = e.run();
        let seventh = e.run_iteration(7).unwrap();
        assert_eq!(seventh, run.records[7]);
        assert_eq!(e.replay(&run.records[7]).unwrap(), run.records[7]);
    }

    #[test]
    fn test_mean_near_base_reserve() {
        let e = engine(BootstrapConfig::default().with_iterations(200));
        let run = e.run();
        let mean = run.distribution.mean().unwrap();
        let base = e.base_reserve();
        assert!(((mean - base) / base).abs() < 0.1, "mean {} base {}", mean, base);
        assert!(run.distribution.std_dev().unwrap() > 0.0);
    }

    #[test]
    fn test_run_with_rng_is_reproducible() {
        let e = engine(BootstrapConfig::default());
        let a = e.run_with_rng(15, &mut ChaCha20Rng::seed_from_u64(1));
        let b = e.run_with_rng(15, &mut ChaCha20Rng::seed_from_u64(1));
        assert_eq!(a.reserves(), b.reserves());
        assert_eq!(a.successful(), 15);
    }

    #[test]
    fn test_records_can_be_dropped() {
        let run = engine(BootstrapConfig {
            keep_records: false,
            ..BootstrapConfig::default().with_iterations(12)
        })
        .run();
        assert!(run.records.is_empty());
        assert_eq!(run.successful(), 12);
    }

    #[test]
    fn test_rejected_iterations_are_collected() {
        let e = BootstrapEngine::new(
            &samples::raa(),
            BootstrapConfig {
                negative_cells: NegativeCellPolicy::Reject,
                ..BootstrapConfig::default().with_iterations(30)
            },
        )
        .unwrap();
        let run = e.run();
        assert!(run.failed() > 0);
        assert_eq!(run.successful() + run.failed(), 30);
        assert_eq!(run.records.len(), run.successful());
        assert!(run
            .failures
            .iter()
            .all(|f| matches!(f, IterationError::NegativeCells { .. })));
    }

    #[test]
    fn test_non_square_triangle_runs() {
        let first_seven = samples::genins().rows()[..7].to_vec();
        let tri = Triangle::from_rows(TriangleKind::Cumulative, first_seven).unwrap();
        let e = BootstrapEngine::new(&tri, BootstrapConfig::default().with_iterations(20)).unwrap();

        assert_eq!(e.fit().pool().len(), 49);
        assert_eq!(e.fit().pool().degrees_of_freedom(), 40);

        let run = e.run();
        assert_eq!(run.iterations, 20);
        assert_eq!(run.successful() + run.failed(), 20);
        for record in &run.records {
            assert_eq!(record.samples.len(), 49);
            assert_eq!(e.replay(record).unwrap(), *record);
        }
    }

    #[test]
    fn test_sample_datasets_run() {
        for dataset in [SampleDataset::UkMotor, SampleDataset::Abc] {
            let tri = dataset.triangle();
            let cells = tri.populated_count();
            let e = BootstrapEngine::new(&tri, BootstrapConfig::default().with_iterations(10))
                .unwrap();
            assert_eq!(e.fit().pool().len(), cells);
            assert_eq!(e.fit().pool().degrees_of_freedom(), cells - (tri.n_developments() - 1));
            let run = e.run();
            assert_eq!(run.successful() + run.failed(), 10);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = BootstrapConfig::default().with_iterations(0);
        let err = BootstrapEngine::new(&samples::genins(), config).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }
}
