//! Loss development triangle storage

use serde::{Deserialize, Serialize};

use crate::error::TriangleError;

/// Whether cell values accumulate across development periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriangleKind {
    Cumulative,
    Incremental,
}

/// Origin × development table of loss amounts
///
/// Each origin row is populated as a contiguous prefix starting at
/// development 0, so a row is stored as a plain vector and the last element
/// is the latest diagonal value for that origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTriangle")]
pub struct Triangle {
    kind: TriangleKind,
    origin_labels: Vec<String>,
    development_labels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

/// Unchecked wire form; deserialized triangles are validated through
/// [`Triangle::new`]
#[derive(Deserialize)]
struct RawTriangle {
    kind: TriangleKind,
    origin_labels: Vec<String>,
    development_labels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TryFrom<RawTriangle> for Triangle {
    type Error = TriangleError;

    fn try_from(raw: RawTriangle) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.origin_labels, raw.development_labels, raw.rows)
    }
}

impl Triangle {
    /// Create a triangle from ragged rows
    pub fn new(
        kind: TriangleKind,
        origin_labels: Vec<String>,
        development_labels: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, TriangleError> {
        if rows.is_empty() {
            return Err(TriangleError::Empty);
        }
        if origin_labels.len() != rows.len() {
            return Err(TriangleError::OriginLabelMismatch {
                expected: rows.len(),
                found: origin_labels.len(),
            });
        }

        for (origin, row) in rows.iter().enumerate() {
            if row.is_empty() {
                return Err(TriangleError::EmptyRow { origin });
            }
            if row.len() > development_labels.len() {
                return Err(TriangleError::RowTooLong {
                    origin,
                    cells: row.len(),
                    developments: development_labels.len(),
                });
            }
            if let Some((development, &value)) =
                row.iter().enumerate().find(|(_, v)| !v.is_finite())
            {
                return Err(TriangleError::NonFinite {
                    origin,
                    development,
                    value,
                });
            }
        }

        Ok(Self {
            kind,
            origin_labels,
            development_labels,
            rows,
        })
    }

    /// Create a triangle labelled 1..=n on both axes
    pub fn from_rows(kind: TriangleKind, rows: Vec<Vec<f64>>) -> Result<Self, TriangleError> {
        let n_dev = rows.iter().map(Vec::len).max().unwrap_or(0);
        let origin_labels = (1..=rows.len()).map(|i| i.to_string()).collect();
        let development_labels = (1..=n_dev).map(|j| j.to_string()).collect();
        Self::new(kind, origin_labels, development_labels, rows)
    }

    /// Create a triangle from `(origin, development, value)` cells
    ///
    /// Cells may arrive in any order but every origin must end up populated
    /// from development 0 without gaps.
    pub fn from_cells<I>(
        kind: TriangleKind,
        origin_labels: Vec<String>,
        development_labels: Vec<String>,
        cells: I,
    ) -> Result<Self, TriangleError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let n_origin = origin_labels.len();
        let n_dev = development_labels.len();
        let mut grid = vec![vec![None; n_dev]; n_origin];

        for (origin, development, value) in cells {
            if origin >= n_origin || development >= n_dev {
                return Err(TriangleError::OutOfRange {
                    origin,
                    development,
                });
            }
            let slot = &mut grid[origin][development];
            if slot.is_some() {
                return Err(TriangleError::DuplicateCell {
                    origin,
                    development,
                });
            }
            *slot = Some(value);
        }

        let mut rows = Vec::with_capacity(n_origin);
        for (origin, cells) in grid.into_iter().enumerate() {
            let populated = cells.iter().take_while(|c| c.is_some()).count();
            if let Some(development) = cells[populated..].iter().position(Option::is_some) {
                return Err(TriangleError::NonContiguousRow {
                    origin,
                    development: populated + development,
                });
            }
            rows.push(cells.into_iter().flatten().collect());
        }

        Self::new(kind, origin_labels, development_labels, rows)
    }

    /// Assemble a triangle from data already known to be well formed
    pub(crate) fn from_parts(
        kind: TriangleKind,
        origin_labels: Vec<String>,
        development_labels: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert!(
            Self::new(kind, origin_labels.clone(), development_labels.clone(), rows.clone()).is_ok()
        );
        Self {
            kind,
            origin_labels,
            development_labels,
            rows,
        }
    }

    /// Same labels, new values. Row lengths must match `self`.
    pub(crate) fn with_rows(&self, kind: TriangleKind, rows: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(rows.len(), self.rows.len());
        debug_assert!(rows.iter().zip(&self.rows).all(|(a, b)| a.len() == b.len()));
        Self {
            kind,
            origin_labels: self.origin_labels.clone(),
            development_labels: self.development_labels.clone(),
            rows,
        }
    }

    pub fn kind(&self) -> TriangleKind {
        self.kind
    }

    pub fn n_origins(&self) -> usize {
        self.rows.len()
    }

    pub fn n_developments(&self) -> usize {
        self.development_labels.len()
    }

    pub fn origin_labels(&self) -> &[String] {
        &self.origin_labels
    }

    pub fn development_labels(&self) -> &[String] {
        &self.development_labels
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Populated values of one origin
    pub fn row(&self, origin: usize) -> &[f64] {
        &self.rows[origin]
    }

    pub fn get(&self, origin: usize, development: usize) -> Option<f64> {
        self.rows.get(origin)?.get(development).copied()
    }

    pub fn is_populated(&self, origin: usize, development: usize) -> bool {
        self.get(origin, development).is_some()
    }

    /// Development index of the latest diagonal cell for an origin
    pub fn latest_index(&self, origin: usize) -> usize {
        self.rows[origin].len() - 1
    }

    /// Latest observed value per origin
    pub fn latest_diagonal(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row[row.len() - 1])
            .collect()
    }

    /// All populated cells in row-major order
    pub fn populated_cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(origin, row)| {
            row.iter()
                .enumerate()
                .map(move |(development, &value)| (origin, development, value))
        })
    }

    pub fn populated_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Convert to incremental values (no-op copy if already incremental)
    pub fn to_incremental(&self) -> Self {
        match self.kind {
            TriangleKind::Incremental => self.clone(),
            TriangleKind::Cumulative => {
                let rows = self
                    .rows
                    .iter()
                    .map(|row| {
                        let mut prev = 0.0;
                        row.iter()
                            .map(|&c| {
                                let inc = c - prev;
                                prev = c;
                                inc
                            })
                            .collect()
                    })
                    .collect();
                self.with_rows(TriangleKind::Incremental, rows)
            }
        }
    }

    /// Convert to cumulative values (no-op copy if already cumulative)
    pub fn to_cumulative(&self) -> Self {
        match self.kind {
            TriangleKind::Cumulative => self.clone(),
            TriangleKind::Incremental => {
                let rows = self
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .scan(0.0, |sum, &inc| {
                                *sum += inc;
                                Some(*sum)
                            })
                            .collect()
                    })
                    .collect();
                self.with_rows(TriangleKind::Cumulative, rows)
            }
        }
    }
}
