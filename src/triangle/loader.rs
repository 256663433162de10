//! Load triangles from CSV
//!
//! Two layouts are supported:
//! - **long**: one row per cell, columns `origin,development,value`
//! - **wide**: one row per origin, first column the origin label, remaining
//!   columns one per development period (header gives the labels); blank
//!   cells are unpopulated

use csv::{Reader, ReaderBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use super::{Triangle, TriangleKind};
use crate::error::LoadError;

/// Column layout of a triangle CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    Long,
    Wide,
}

impl FromStr for CsvLayout {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(CsvLayout::Long),
            "wide" => Ok(CsvLayout::Wide),
            other => Err(LoadError::Parse {
                line: 0,
                message: format!("unknown CSV layout: {}", other),
            }),
        }
    }
}

/// Raw CSV row for the long layout
#[derive(Debug, serde::Deserialize)]
struct LongRow {
    #[serde(alias = "Origin", alias = "origin_period")]
    origin: String,
    #[serde(alias = "Development", alias = "dev", alias = "development_period")]
    development: String,
    #[serde(alias = "Value", alias = "amount")]
    value: f64,
}

/// Load a triangle from a CSV file
///
/// `kind` states whether the file holds cumulative or incremental amounts;
/// the returned triangle is always cumulative.
pub fn load_triangle<P: AsRef<Path>>(
    path: P,
    layout: CsvLayout,
    kind: TriangleKind,
) -> Result<Triangle, LoadError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| LoadError::io(format!("opening {}", path.display()), e))?;
    load_triangle_from_reader(file, layout, kind)
}

/// Load a triangle from any reader (e.g., string buffer, network stream)
pub fn load_triangle_from_reader<R: Read>(
    reader: R,
    layout: CsvLayout,
    kind: TriangleKind,
) -> Result<Triangle, LoadError> {
    let triangle = match layout {
        CsvLayout::Long => read_long(Reader::from_reader(reader), kind)?,
        CsvLayout::Wide => read_wide(
            ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(reader),
            kind,
        )?,
    };
    log::debug!(
        "loaded {}x{} triangle with {} populated cells",
        triangle.n_origins(),
        triangle.n_developments(),
        triangle.populated_count()
    );
    Ok(triangle.to_cumulative())
}

fn read_long<R: Read>(mut reader: Reader<R>, kind: TriangleKind) -> Result<Triangle, LoadError> {
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: LongRow = result?;
        rows.push(row);
    }

    let origin_labels = ordered_labels(rows.iter().map(|r| r.origin.trim()));
    let development_labels = ordered_labels(rows.iter().map(|r| r.development.trim()));
    let origin_index = index_of(&origin_labels);
    let development_index = index_of(&development_labels);

    let cells: Vec<_> = rows
        .iter()
        .map(|r| {
            (
                origin_index[r.origin.trim()],
                development_index[r.development.trim()],
                r.value,
            )
        })
        .collect();

    Ok(Triangle::from_cells(kind, origin_labels, development_labels, cells)?)
}

fn read_wide<R: Read>(mut reader: Reader<R>, kind: TriangleKind) -> Result<Triangle, LoadError> {
    let headers = reader.headers()?.clone();
    let development_labels: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut origin_labels = Vec::new();
    let mut cells = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(str::is_empty) {
            continue;
        }

        let origin = origin_labels.len();
        origin_labels.push(record[0].to_string());

        for (development, field) in record.iter().skip(1).enumerate() {
            if field.is_empty() {
                continue;
            }
            let value: f64 = field.parse().map_err(|_| LoadError::Parse {
                line,
                message: format!("cannot parse '{}' as a number", field),
            })?;
            cells.push((origin, development, value));
        }
    }

    Ok(Triangle::from_cells(kind, origin_labels, development_labels, cells)?)
}

/// Distinct labels, numerically sorted when every label is a number,
/// otherwise in order of first appearance
fn ordered_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for label in labels {
        if !distinct.iter().any(|l| l == label) {
            distinct.push(label.to_string());
        }
    }

    let numeric: Option<Vec<f64>> = distinct.iter().map(|l| l.parse().ok()).collect();
    if let Some(keys) = numeric {
        let mut keyed: Vec<_> = keys.into_iter().zip(distinct).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        distinct = keyed.into_iter().map(|(_, label)| label).collect();
    }
    distinct
}

fn index_of(labels: &[String]) -> HashMap<&str, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriangleError;

    #[test]
    fn test_load_long_layout_sorts_numeric_labels() {
        let data = "origin,development,value\n\
                    2021,12,120\n\
                    2020,24,150\n\
                    2020,12,100\n";
        let tri =
            load_triangle_from_reader(data.as_bytes(), CsvLayout::Long, TriangleKind::Cumulative)
                .unwrap();
        assert_eq!(tri.origin_labels(), &["2020", "2021"]);
        assert_eq!(tri.development_labels(), &["12", "24"]);
        assert_eq!(tri.row(0), &[100.0, 150.0]);
        assert_eq!(tri.row(1), &[120.0]);
    }

    #[test]
    fn test_load_wide_incremental() {
        let data = "origin,1,2,3\n\
                    A,100,50,25\n\
                    B,110,58,\n\
                    C,120,,\n";
        let tri =
            load_triangle_from_reader(data.as_bytes(), CsvLayout::Wide, TriangleKind::Incremental)
                .unwrap();
        assert_eq!(tri.kind(), TriangleKind::Cumulative);
        assert_eq!(tri.origin_labels(), &["A", "B", "C"]);
        assert_eq!(tri.row(0), &[100.0, 150.0, 175.0]);
        assert_eq!(tri.row(1), &[110.0, 168.0]);
        assert_eq!(tri.row(2), &[120.0]);
    }

    #[test]
    fn test_wide_rejects_bad_numbers_and_gaps() {
        let data = "origin,1,2\nA,100,abc\n";
        let err =
            load_triangle_from_reader(data.as_bytes(), CsvLayout::Wide, TriangleKind::Cumulative)
                .unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 2, .. }), "{err:?}");

        let data = "origin,1,2,3\nA,100,,25\n";
        let err =
            load_triangle_from_reader(data.as_bytes(), CsvLayout::Wide, TriangleKind::Cumulative)
                .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Triangle(TriangleError::NonContiguousRow { origin: 0, development: 2 })
        ));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("Wide".parse::<CsvLayout>().unwrap(), CsvLayout::Wide);
        assert!("diagonal".parse::<CsvLayout>().is_err());
    }
}
