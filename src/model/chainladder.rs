//! Volume-weighted chain-ladder projection

use serde::Serialize;

use crate::error::ProjectionError;
use crate::triangle::{Triangle, TriangleKind};

/// Age-to-age and age-to-ultimate factor for one development step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevelopmentFactor {
    /// Step label, e.g. "12-24"
    pub period: String,
    pub ldf: f64,
    pub cdf: f64,
}

/// Fitted chain-ladder model
///
/// No tail factor is applied: the last development period is treated as
/// ultimate.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLadder {
    /// Age-to-age factors, one per development step (length n_dev - 1)
    ldf: Vec<f64>,
    /// Age-to-ultimate factors by development period (length n_dev)
    cdf: Vec<f64>,
    latest: Vec<f64>,
    latest_index: Vec<usize>,
    n_developments: usize,
}

impl ChainLadder {
    /// Fit the model to a triangle (incremental input is cumulated first)
    pub fn fit(triangle: &Triangle) -> Result<Self, ProjectionError> {
        let converted;
        let cumulative = match triangle.kind() {
            TriangleKind::Cumulative => triangle,
            TriangleKind::Incremental => {
                converted = triangle.to_cumulative();
                &converted
            }
        };

        let n_dev = cumulative.n_developments();
        if n_dev < 2 {
            return Err(ProjectionError::InsufficientDevelopment { found: n_dev });
        }

        let mut ldf = Vec::with_capacity(n_dev - 1);
        for j in 0..n_dev - 1 {
            let (numerator, denominator) = cumulative
                .rows()
                .iter()
                .filter(|row| row.len() > j + 1)
                .fold((0.0, 0.0), |(num, den), row| (num + row[j + 1], den + row[j]));

            if denominator <= 0.0 {
                return Err(ProjectionError::NonPositiveVolume {
                    development: j,
                    volume: denominator,
                });
            }
            ldf.push(numerator / denominator);
        }

        let mut cdf = vec![1.0; n_dev];
        for j in (0..n_dev - 1).rev() {
            cdf[j] = cdf[j + 1] * ldf[j];
        }

        let model = Self {
            ldf,
            cdf,
            latest: cumulative.latest_diagonal(),
            latest_index: (0..cumulative.n_origins())
                .map(|i| cumulative.latest_index(i))
                .collect(),
            n_developments: n_dev,
        };

        if !model.reserve().is_finite() {
            return Err(ProjectionError::NonFiniteReserve);
        }
        Ok(model)
    }

    pub fn ldf(&self) -> &[f64] {
        &self.ldf
    }

    pub fn cdf(&self) -> &[f64] {
        &self.cdf
    }

    pub fn latest(&self) -> &[f64] {
        &self.latest
    }

    /// Projected ultimate per origin
    pub fn ultimates(&self) -> Vec<f64> {
        self.latest
            .iter()
            .zip(&self.latest_index)
            .map(|(&latest, &j)| latest * self.cdf[j])
            .collect()
    }

    /// Outstanding reserve (ultimate − latest) per origin
    pub fn reserves_by_origin(&self) -> Vec<f64> {
        self.ultimates()
            .iter()
            .zip(&self.latest)
            .map(|(ult, latest)| ult - latest)
            .collect()
    }

    /// Total outstanding reserve
    pub fn reserve(&self) -> f64 {
        self.reserves_by_origin().iter().sum()
    }

    /// Model-implied cumulative values for the populated cells
    ///
    /// Each row is back-filled from its latest diagonal value by dividing
    /// through the age-to-age factors, so the latest diagonal is reproduced
    /// exactly. Cells before a zero factor have no implied value and are
    /// left at zero.
    pub fn fitted_cumulative_rows(&self) -> Vec<Vec<f64>> {
        self.latest
            .iter()
            .zip(&self.latest_index)
            .map(|(&latest, &last)| {
                let mut row = vec![0.0; last + 1];
                row[last] = latest;
                for j in (0..last).rev() {
                    if self.ldf[j] == 0.0 {
                        break;
                    }
                    row[j] = row[j + 1] / self.ldf[j];
                }
                row
            })
            .collect()
    }

    /// Projected incremental amounts beyond the latest diagonal as
    /// `(origin, development, amount)`; they sum to the total reserve
    pub fn future_incrementals(&self) -> Vec<(usize, usize, f64)> {
        let mut cells = Vec::new();
        for (origin, (&latest, &last)) in self.latest.iter().zip(&self.latest_index).enumerate() {
            let mut cumulative = latest;
            for development in last + 1..self.n_developments {
                let next = cumulative * self.ldf[development - 1];
                cells.push((origin, development, next - cumulative));
                cumulative = next;
            }
        }
        cells
    }

    /// LDF/CDF table labelled with the triangle's development periods
    pub fn factor_table(&self, labels: &[String]) -> Vec<DevelopmentFactor> {
        self.ldf
            .iter()
            .enumerate()
            .map(|(j, &ldf)| DevelopmentFactor {
                period: match (labels.get(j), labels.get(j + 1)) {
                    (Some(from), Some(to)) => format!("{}-{}", from, to),
                    _ => format!("{}-{}", j + 1, j + 2),
                },
                ldf,
                cdf: self.cdf[j],
            })
            .collect()
    }
}
