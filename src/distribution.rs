//! Running distribution of bootstrap reserve estimates
//!
//! Keeps every sample so percentiles and histograms can be recomputed at any
//! point, alongside a Welford accumulator for the running mean and variance.

use serde::Serialize;

/// Summary statistics of the reserve distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub max: f64,
}

/// Equal-width histogram; `edges` has one more element than `counts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Growing collection of reserve estimates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReserveDistribution {
    samples: Vec<f64>,
    mean: f64,
    m2: f64,
}

impl ReserveDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let mut dist = Self::new();
        dist.extend(samples);
        dist
    }

    /// Add one reserve estimate
    pub fn push(&mut self, reserve: f64) {
        self.samples.push(reserve);
        let n = self.samples.len() as f64;
        let delta = reserve - self.mean;
        self.mean += delta / n;
        self.m2 += delta * (reserve - self.mean);
    }

    pub fn extend(&mut self, reserves: impl IntoIterator<Item = f64>) {
        for reserve in reserves {
            self.push(reserve);
        }
    }

    /// Rebuild the running moments from the stored samples
    pub fn recompute(&mut self) {
        let n = self.samples.len();
        if n == 0 {
            self.mean = 0.0;
            self.m2 = 0.0;
            return;
        }
        self.mean = self.samples.iter().sum::<f64>() / n as f64;
        self.m2 = self.samples.iter().map(|x| (x - self.mean).powi(2)).sum();
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in insertion order
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn mean(&self) -> Option<f64> {
        (!self.is_empty()).then_some(self.mean)
    }

    /// Population variance (divides by n)
    pub fn variance(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.m2 / self.samples.len() as f64)
    }

    /// Population standard deviation (divides by n)
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Sample standard deviation (divides by n - 1)
    pub fn sample_std_dev(&self) -> Option<f64> {
        let n = self.samples.len();
        (n > 1).then(|| (self.m2 / (n - 1) as f64).sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    /// Linear-interpolated percentile, `p` in 0..=100
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(interpolate(&self.sorted(), p))
    }

    /// Equal-width histogram over [min, max]
    pub fn histogram(&self, bins: usize) -> Option<Histogram> {
        let (min, max) = (self.min()?, self.max()?);
        if bins == 0 {
            return None;
        }

        let width = (max - min) / bins as f64;
        let edges = (0..=bins).map(|i| min + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for &x in &self.samples {
            let bin = if width > 0.0 {
                (((x - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }

        Some(Histogram { edges, counts })
    }

    pub fn summary(&self) -> Option<DistributionSummary> {
        if self.is_empty() {
            return None;
        }
        let sorted = self.sorted();
        Some(DistributionSummary {
            count: sorted.len(),
            mean: self.mean,
            std_dev: (self.m2 / sorted.len() as f64).sqrt(),
            min: sorted[0],
            p5: interpolate(&sorted, 5.0),
            p25: interpolate(&sorted, 25.0),
            p50: interpolate(&sorted, 50.0),
            p75: interpolate(&sorted, 75.0),
            p95: interpolate(&sorted, 95.0),
            max: sorted[sorted.len() - 1],
        })
    }
}

fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let h = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
