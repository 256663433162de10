//! Pearson residual pool
//!
//! The pool is built once from the base fit and is read-only afterwards;
//! every resampling iteration draws from the same entries.

use serde::{Deserialize, Serialize};

/// Residuals with absolute value below this are treated as structural zeros
/// (the corner cells of a chain-ladder fit reproduce the data exactly)
pub const ZERO_RESIDUAL_TOLERANCE: f64 = 1e-8;

/// How the residual pool is derived from the raw Pearson residuals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualOptions {
    /// Scale residuals by sqrt(n / (n - p))
    pub dof_adjustment: bool,

    /// Drop zero residuals from the pool before sampling
    pub exclude_zero: bool,

    /// Shift adjusted residuals so their mean is zero
    pub center: bool,
}

impl Default for ResidualOptions {
    fn default() -> Self {
        Self {
            dof_adjustment: true,
            exclude_zero: false,
            center: false,
        }
    }
}

/// One residual together with the cell it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolEntry {
    pub origin: usize,
    pub development: usize,
    /// Observed incremental value
    pub actual: f64,
    /// Model-fitted incremental value
    pub fitted: f64,
    /// (actual - fitted) / sqrt(fitted)
    pub residual: f64,
    /// Residual after degrees-of-freedom scaling and centering; this is
    /// what resampling draws
    pub adjusted: f64,
}

/// Immutable multiset of residuals to resample from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualPool {
    entries: Vec<PoolEntry>,
    parameters: usize,
    degrees_of_freedom: usize,
    adjustment: f64,
    scale_parameter: f64,
}

impl ResidualPool {
    /// Build the pool from `(origin, development, actual, fitted)` cells
    ///
    /// `parameters` is the number of estimated development factors. When the
    /// pool would leave no degrees of freedom the pool size is returned as
    /// the error.
    pub(crate) fn build(
        cells: impl IntoIterator<Item = (usize, usize, f64, f64)>,
        parameters: usize,
        options: &ResidualOptions,
    ) -> Result<Self, usize> {
        let mut entries: Vec<PoolEntry> = cells
            .into_iter()
            .map(|(origin, development, actual, fitted)| {
                let residual = (actual - fitted) / fitted.sqrt();
                PoolEntry {
                    origin,
                    development,
                    actual,
                    fitted,
                    residual,
                    adjusted: residual,
                }
            })
            .filter(|e| !options.exclude_zero || e.residual.abs() >= ZERO_RESIDUAL_TOLERANCE)
            .collect();

        let n = entries.len();
        if n <= parameters {
            return Err(n);
        }
        let degrees_of_freedom = n - parameters;

        let adjustment = if options.dof_adjustment {
            (n as f64 / degrees_of_freedom as f64).sqrt()
        } else {
            1.0
        };
        for entry in &mut entries {
            entry.adjusted = entry.residual * adjustment;
        }

        if options.center {
            let mean = entries.iter().map(|e| e.adjusted).sum::<f64>() / n as f64;
            for entry in &mut entries {
                entry.adjusted -= mean;
            }
        }

        let sum_of_squares: f64 = entries.iter().map(|e| e.residual * e.residual).sum();
        let scale_parameter = sum_of_squares / degrees_of_freedom as f64;

        Ok(Self {
            entries,
            parameters,
            degrees_of_freedom,
            adjustment,
            scale_parameter,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PoolEntry> {
        self.entries.get(index)
    }

    /// Number of estimated development factors
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    pub fn degrees_of_freedom(&self) -> usize {
        self.degrees_of_freedom
    }

    /// Multiplier applied to the unscaled residuals
    pub fn adjustment(&self) -> f64 {
        self.adjustment
    }

    /// ODP dispersion estimate: sum of squared unscaled residuals / df
    pub fn scale_parameter(&self) -> f64 {
        self.scale_parameter
    }

    pub fn mean_adjusted(&self) -> f64 {
        self.entries.iter().map(|e| e.adjusted).sum::<f64>() / self.entries.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cells() -> Vec<(usize, usize, f64, f64)> {
        vec![
            (0, 0, 110.0, 100.0),
            (0, 1, 40.0, 50.0),
            (1, 0, 100.0, 100.0),
            (2, 0, 125.0, 100.0),
        ]
    }

    #[test]
    fn test_residual_formula_and_adjustment() {
        let pool = ResidualPool::build(cells(), 1, &ResidualOptions::default()).unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.degrees_of_freedom(), 3);

        let first = &pool.entries()[0];
        assert_relative_eq!(first.residual, 1.0, max_relative = 1e-12);
        assert_relative_eq!(first.adjusted, (4.0f64 / 3.0).sqrt(), max_relative = 1e-12);
        let second = &pool.entries()[1];
        assert_relative_eq!(second.residual, -10.0 / 50.0f64.sqrt(), max_relative = 1e-12);

        // phi = (1 + 2 + 0 + 6.25) / 3
        assert_relative_eq!(pool.scale_parameter(), 9.25 / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn test_exclude_zero_and_center() {
        let options = ResidualOptions {
            dof_adjustment: false,
            exclude_zero: true,
            center: true,
        };
        let pool = ResidualPool::build(cells(), 1, &options).unwrap();
        assert_eq!(pool.len(), 3);
        assert!(pool.entries().iter().all(|e| e.origin != 1));
        assert_eq!(pool.adjustment(), 1.0);
        assert!(pool.mean_adjusted().abs() < 1e-12);
    }

    #[test]
    fn test_too_few_cells() {
        assert_eq!(ResidualPool::build(cells(), 4, &ResidualOptions::default()), Err(4));
    }
}
