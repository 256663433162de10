//! Run outputs: JSON summary report, reserves CSV, iteration NDJSON
//!
//! Writers take any `io::Write` so callers decide where output goes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{BufRead, Write};

use crate::bootstrap::{BootstrapConfig, BootstrapEngine, BootstrapRun, IterationRecord};
use crate::distribution::{DistributionSummary, Histogram};
use crate::error::ReportError;
use crate::model::DevelopmentFactor;
use crate::triangle::Triangle;

/// Shape of the input triangle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriangleMetadata {
    pub origins: usize,
    pub developments: usize,
    pub populated_cells: usize,
    pub origin_labels: Vec<String>,
    pub development_labels: Vec<String>,
}

impl TriangleMetadata {
    pub fn of(triangle: &Triangle) -> Self {
        Self {
            origins: triangle.n_origins(),
            developments: triangle.n_developments(),
            populated_cells: triangle.populated_count(),
            origin_labels: triangle.origin_labels().to_vec(),
            development_labels: triangle.development_labels().to_vec(),
        }
    }
}

/// Base projection for one origin period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginReserve {
    pub origin: String,
    pub latest: f64,
    pub ultimate: f64,
    pub reserve: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualSummary {
    pub pool_size: usize,
    pub degrees_of_freedom: usize,
    pub adjustment: f64,
    pub scale_parameter: f64,
}

/// Summary of a complete bootstrap run
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub generated_at: DateTime<Utc>,
    /// Sample dataset name or input path
    pub source: String,
    pub triangle: TriangleMetadata,
    pub config: BootstrapConfig,
    pub base_reserve: f64,
    pub origins: Vec<OriginReserve>,
    pub factors: Vec<DevelopmentFactor>,
    pub residuals: ResidualSummary,
    pub iterations: usize,
    pub successful: usize,
    pub failed: usize,
    pub summary: Option<DistributionSummary>,
    pub histogram: Option<Histogram>,
}

impl BootstrapReport {
    pub fn build(source: impl Into<String>, engine: &BootstrapEngine, run: &BootstrapRun) -> Self {
        let fit = engine.fit();
        let triangle = fit.cumulative();
        let model = fit.model();
        let pool = fit.pool();

        let origins = triangle
            .origin_labels()
            .iter()
            .zip(model.latest())
            .zip(model.ultimates())
            .map(|((origin, &latest), ultimate)| OriginReserve {
                origin: origin.clone(),
                latest,
                ultimate,
                reserve: ultimate - latest,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            source: source.into(),
            triangle: TriangleMetadata::of(triangle),
            config: engine.config().clone(),
            base_reserve: engine.base_reserve(),
            origins,
            factors: model.factor_table(triangle.development_labels()),
            residuals: ResidualSummary {
                pool_size: pool.len(),
                degrees_of_freedom: pool.degrees_of_freedom(),
                adjustment: pool.adjustment(),
                scale_parameter: pool.scale_parameter(),
            },
            iterations: run.iterations,
            successful: run.successful(),
            failed: run.failed(),
            summary: run.distribution.summary(),
            histogram: run.distribution.histogram(engine.config().histogram_bins),
        }
    }
}

pub fn write_report_json<W: Write>(writer: W, report: &BootstrapReport) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

#[derive(Serialize)]
struct ReserveRow {
    iteration: usize,
    reserve: f64,
}

/// One row per successful iteration: `iteration,reserve`
pub fn write_reserves_csv<W: Write>(writer: W, run: &BootstrapRun) -> Result<(), ReportError> {
    let failed: HashSet<usize> = run.failures.iter().map(|f| f.iteration()).collect();
    let mut csv = csv::Writer::from_writer(writer);
    let successful = (0..run.iterations).filter(|k| !failed.contains(k));
    for (iteration, &reserve) in successful.zip(run.reserves()) {
        csv.serialize(ReserveRow { iteration, reserve })?;
    }
    csv.flush()
        .map_err(|e| ReportError::io("flushing reserves CSV", e))?;
    Ok(())
}

/// One JSON object per line, one line per record
pub fn write_records_ndjson<W: Write>(
    mut writer: W,
    records: &[IterationRecord],
) -> Result<(), ReportError> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer
            .write_all(b"\n")
            .map_err(|e| ReportError::io("writing iteration records", e))?;
    }
    writer
        .flush()
        .map_err(|e| ReportError::io("flushing iteration records", e))?;
    Ok(())
}

/// Read records written by [`write_records_ndjson`], skipping blank lines
pub fn read_records_ndjson<R: BufRead>(reader: R) -> Result<Vec<IterationRecord>, ReportError> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| ReportError::io("reading iteration records", e))?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::NegativeCellPolicy;
    use crate::triangle::samples;

    fn small_run() -> (BootstrapEngine, BootstrapRun) {
        let config = BootstrapConfig::default().with_iterations(5);
        let engine = BootstrapEngine::new(&samples::genins(), config).unwrap();
        let run = engine.run();
        (engine, run)
    }

    #[test]
    fn test_report_contents() {
        let (engine, run) = small_run();
        let report = BootstrapReport::build("genins", &engine, &run);

        assert_eq!(report.triangle.origins, 10);
        assert_eq!(report.triangle.populated_cells, 55);
        assert_eq!(report.factors.len(), 9);
        assert_eq!(report.factors[0].period, "12-24");
        assert_eq!(report.residuals.pool_size, 55);
        assert_eq!(report.residuals.degrees_of_freedom, 46);
        assert_eq!(report.successful, 5);
        assert_eq!(report.summary.as_ref().unwrap().count, 5);

        let by_origin: f64 = report.origins.iter().map(|o| o.reserve).sum();
        assert!((by_origin - report.base_reserve).abs() < 1e-6);

        let mut buf = Vec::new();
        write_report_json(&mut buf, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["source"], "genins");
        assert_eq!(value["config"]["iterations"], 5);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_reserves_csv_skips_failed_iterations() {
        let engine = BootstrapEngine::new(
            &samples::raa(),
            BootstrapConfig {
                negative_cells: NegativeCellPolicy::Reject,
                ..BootstrapConfig::default().with_iterations(20)
            },
        )
        .unwrap();
        let run = engine.run();

        let mut buf = Vec::new();
        write_reserves_csv(&mut buf, &run).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("iteration,reserve"));

        let iterations: Vec<usize> = lines
            .map(|l| l.split(',').next().unwrap().parse().unwrap())
            .collect();
        let expected: Vec<usize> = run.records.iter().map(|r| r.iteration).collect();
        assert_eq!(iterations, expected);
    }

    #[test]
    fn test_records_ndjson_round_trip_replays() {
        let (engine, run) = small_run();
        let mut buf = Vec::new();
        write_records_ndjson(&mut buf, &run.records).unwrap();
        assert_eq!(buf.iter().filter(|&&b| b == b'\n').count(), 5);

        let restored = read_records_ndjson(buf.as_slice()).unwrap();
        assert_eq!(restored.len(), 5);
        for (record, original) in restored.iter().zip(&run.records) {
            assert_eq!(record.iteration, original.iteration);
            assert_eq!(record.samples.len(), original.samples.len());
            let replayed = engine.replay(record).unwrap();
            assert!((replayed.reserve - original.reserve).abs() <= 1e-6 * original.reserve.abs());
        }
    }

    #[test]
    fn test_malformed_ndjson() {
        let err = read_records_ndjson("{\"iteration\": 0}\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
    }
}
