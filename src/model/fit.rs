//! Base model fit and residual extraction
//!
//! Runs once per session. Everything it produces is read-only afterwards and
//! shared by all resampling iterations.

use crate::error::FitError;
use crate::triangle::{Triangle, TriangleKind};

use super::chainladder::ChainLadder;
use super::residuals::{ResidualOptions, ResidualPool};

/// Result of fitting the chain ladder to the observed triangle
#[derive(Debug, Clone)]
pub struct OdpFit {
    cumulative: Triangle,
    actual_incremental: Triangle,
    fitted_incremental: Triangle,
    residuals: Triangle,
    pool: ResidualPool,
    model: ChainLadder,
    options: ResidualOptions,
}

impl OdpFit {
    /// Fit the base model and build the residual pool
    ///
    /// Fails before any resampling could start if the data contains negative
    /// cumulative amounts, the projection cannot be estimated, a fitted
    /// incremental value is not strictly positive, or there are too few cells
    /// for the number of estimated factors.
    pub fn fit(triangle: &Triangle, options: ResidualOptions) -> Result<Self, FitError> {
        let cumulative = triangle.to_cumulative();

        if let Some((origin, development, value)) =
            cumulative.populated_cells().find(|&(_, _, v)| v < 0.0)
        {
            return Err(FitError::NegativeValue {
                origin,
                development,
                value,
            });
        }

        let model = ChainLadder::fit(&cumulative)?;

        let fitted_cumulative = cumulative.with_rows(
            TriangleKind::Cumulative,
            model.fitted_cumulative_rows(),
        );
        let fitted_incremental = fitted_cumulative.to_incremental();

        if let Some((origin, development, value)) =
            fitted_incremental.populated_cells().find(|&(_, _, v)| !v.is_finite() || v <= 0.0)
        {
            return Err(FitError::NonPositiveFitted {
                origin,
                development,
                value,
            });
        }

        let actual_incremental = cumulative.to_incremental();

        let residual_rows = actual_incremental
            .rows()
            .iter()
            .zip(fitted_incremental.rows())
            .map(|(actual, fitted)| {
                actual
                    .iter()
                    .zip(fitted)
                    .map(|(a, m)| (a - m) / m.sqrt())
                    .collect()
            })
            .collect();
        let residuals = cumulative.with_rows(TriangleKind::Incremental, residual_rows);

        let parameters = cumulative.n_developments() - 1;
        let cells = actual_incremental
            .populated_cells()
            .zip(fitted_incremental.populated_cells())
            .map(|((origin, development, actual), (_, _, fitted))| {
                (origin, development, actual, fitted)
            });
        let pool = ResidualPool::build(cells, parameters, &options)
            .map_err(|cells| FitError::InsufficientData { cells, parameters })?;

        log::info!(
            "fitted {}x{} triangle: base reserve {:.2}, {} residuals, df {}, phi {:.4}",
            cumulative.n_origins(),
            cumulative.n_developments(),
            model.reserve(),
            pool.len(),
            pool.degrees_of_freedom(),
            pool.scale_parameter()
        );

        Ok(Self {
            cumulative,
            actual_incremental,
            fitted_incremental,
            residuals,
            pool,
            model,
            options,
        })
    }

    /// Observed cumulative triangle
    pub fn cumulative(&self) -> &Triangle {
        &self.cumulative
    }

    pub fn actual_incremental(&self) -> &Triangle {
        &self.actual_incremental
    }

    /// Model-implied incremental values, same shape as the observed triangle
    pub fn fitted_incremental(&self) -> &Triangle {
        &self.fitted_incremental
    }

    /// Unscaled Pearson residual for every populated cell
    pub fn residuals(&self) -> &Triangle {
        &self.residuals
    }

    pub fn pool(&self) -> &ResidualPool {
        &self.pool
    }

    /// Chain ladder fitted to the observed data
    pub fn model(&self) -> &ChainLadder {
        &self.model
    }

    pub fn options(&self) -> &ResidualOptions {
        &self.options
    }

    /// Deterministic reserve of the base model
    pub fn base_reserve(&self) -> f64 {
        self.model.reserve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangle::samples;
    use approx::assert_relative_eq;

    #[test]
    fn test_genins_fit() {
        let fit = OdpFit::fit(&samples::genins(), ResidualOptions::default()).unwrap();

        assert!(fit.fitted_incremental().populated_cells().all(|(_, _, v)| v > 0.0));
        assert_eq!(fit.pool().len(), fit.cumulative().populated_count());
        assert_eq!(fit.pool().len(), 55);
        assert_eq!(fit.pool().degrees_of_freedom(), 46);
        assert_relative_eq!(fit.pool().adjustment(), (55.0f64 / 46.0).sqrt(), max_relative = 1e-12);
        assert_relative_eq!(fit.pool().scale_parameter(), 41_166.283, max_relative = 1e-6);
        assert_relative_eq!(fit.residuals().get(0, 0).unwrap(), 168.926149, max_relative = 1e-7);
        assert_relative_eq!(fit.base_reserve(), 18_680_855.61, max_relative = 1e-9);
    }

    #[test]
    fn test_fitted_rows_sum_to_latest() {
        let fit = OdpFit::fit(&samples::raa(), ResidualOptions::default()).unwrap();
        let latest = fit.cumulative().latest_diagonal();
        for (origin, row) in fit.fitted_incremental().rows().iter().enumerate() {
            assert_relative_eq!(row.iter().sum::<f64>(), latest[origin], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_exclude_zero_drops_corner_cells() {
        let options = ResidualOptions {
            exclude_zero: true,
            ..ResidualOptions::default()
        };
        let fit = OdpFit::fit(&samples::genins(), options).unwrap();
        // First-origin last cell and last-origin first cell fit exactly
        assert_eq!(fit.pool().len(), 53);
        assert_eq!(fit.pool().degrees_of_freedom(), 44);
    }

    #[test]
    fn test_fit_rejects_negative_data() {
        let tri = Triangle::from_rows(
            TriangleKind::Cumulative,
            vec![vec![10.0, 12.0, 13.0], vec![-1.0, 3.0], vec![4.0]],
        )
        .unwrap();
        assert_eq!(
            OdpFit::fit(&tri, ResidualOptions::default()).unwrap_err(),
            FitError::NegativeValue { origin: 1, development: 0, value: -1.0 }
        );
    }

    #[test]
    fn test_fit_rejects_non_positive_fitted() {
        // Flat second development gives a zero fitted increment
        let tri = Triangle::from_rows(
            TriangleKind::Cumulative,
            vec![vec![10.0, 10.0, 12.0], vec![20.0, 20.0], vec![30.0]],
        )
        .unwrap();
        assert!(matches!(
            OdpFit::fit(&tri, ResidualOptions::default()).unwrap_err(),
            FitError::NonPositiveFitted { development: 1, .. }
        ));
    }

    #[test]
    fn test_fit_rejects_zero_development_factor() {
        // The second column falls to zero, so the first factor is zero and
        // no positive fitted value exists before it
        let tri = Triangle::from_rows(TriangleKind::Cumulative, vec![vec![10.0, 0.0], vec![5.0]])
            .unwrap();
        assert_eq!(
            OdpFit::fit(&tri, ResidualOptions::default()).unwrap_err(),
            FitError::NonPositiveFitted { origin: 0, development: 0, value: 0.0 }
        );
    }

    #[test]
    fn test_non_square_fit() {
        // First seven GenIns origins: more development periods than origins
        let genins = samples::genins();
        let tri = Triangle::from_rows(TriangleKind::Cumulative, genins.rows()[..7].to_vec())
            .unwrap();
        assert_eq!((tri.n_origins(), tri.n_developments()), (7, 10));

        let fit = OdpFit::fit(&tri, ResidualOptions::default()).unwrap();
        assert!(fit.fitted_incremental().populated_cells().all(|(_, _, v)| v > 0.0));
        assert_eq!(fit.pool().len(), 49);
        assert_eq!(fit.pool().parameters(), 9);
        assert_eq!(fit.pool().degrees_of_freedom(), 40);
        assert_relative_eq!(fit.pool().scale_parameter(), 44_991.6014, max_relative = 1e-7);
        assert_relative_eq!(fit.base_reserve(), 5_855_771.642, max_relative = 1e-9);
    }

    #[test]
    fn test_fit_rejects_insufficient_data() {
        let tri = Triangle::from_rows(
            TriangleKind::Cumulative,
            vec![vec![10.0, 15.0, 16.0], vec![20.0]],
        )
        .unwrap();
        // 4 cells, 2 factors: fine; with zero exclusion the corners vanish
        let options = ResidualOptions {
            exclude_zero: true,
            ..ResidualOptions::default()
        };
        assert!(matches!(
            OdpFit::fit(&tri, options).unwrap_err(),
            FitError::InsufficientData { parameters: 2, .. }
        ));
    }
}
