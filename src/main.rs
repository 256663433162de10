//! ODP Bootstrap CLI
//!
//! Fits the over-dispersed Poisson model to a claims triangle, runs the
//! residual bootstrap and prints a summary of the reserve distribution.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use odp_bootstrap::bootstrap::{BootstrapConfig, BootstrapEngine, NegativeCellPolicy};
use odp_bootstrap::report::{
    write_records_ndjson, write_report_json, write_reserves_csv, BootstrapReport,
};
use odp_bootstrap::triangle::{load_triangle, CsvLayout, SampleDataset, Triangle, TriangleKind};

#[derive(Debug, Parser)]
#[command(name = "odp-bootstrap", version, about = "ODP bootstrap of chain-ladder reserves")]
struct Args {
    /// Built-in sample triangle (genins, raa, ukmotor, abc)
    #[arg(long, default_value = "genins", conflicts_with = "triangle")]
    dataset: SampleDataset,

    /// Triangle CSV file instead of a sample dataset
    #[arg(long)]
    triangle: Option<PathBuf>,

    /// CSV layout: long (origin,development,value) or wide
    #[arg(long, default_value = "long")]
    layout: CsvLayout,

    /// CSV holds incremental rather than cumulative amounts
    #[arg(long)]
    incremental: bool,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    iterations: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Run iterations in parallel
    #[arg(long)]
    parallel: bool,

    /// Add Gamma process variance to projected future payments
    #[arg(long)]
    process_variance: bool,

    /// Negative reconstructed cells: keep, floor or reject
    #[arg(long)]
    negative_cells: Option<NegativeCellPolicy>,

    /// Histogram bin count
    #[arg(long)]
    bins: Option<usize>,

    /// Write the JSON report here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write per-iteration reserves as CSV here
    #[arg(long)]
    reserves_csv: Option<PathBuf>,

    /// Write per-iteration draws as NDJSON here
    #[arg(long)]
    records: Option<PathBuf>,

    /// Suppress the printed summary
    #[arg(long)]
    quiet: bool,
}

impl Args {
    fn load_config(&self) -> Result<BootstrapConfig> {
        let mut config = match &self.config {
            Some(path) => BootstrapConfig::from_json_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BootstrapConfig::default(),
        };
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(policy) = self.negative_cells {
            config.negative_cells = policy;
        }
        if let Some(bins) = self.bins {
            config.histogram_bins = bins;
        }
        config.parallel |= self.parallel;
        config.process_variance |= self.process_variance;
        config.keep_records |= self.records.is_some();
        Ok(config)
    }

    fn load_triangle(&self) -> Result<(String, Triangle)> {
        match &self.triangle {
            Some(path) => {
                let kind = if self.incremental {
                    TriangleKind::Incremental
                } else {
                    TriangleKind::Cumulative
                };
                let triangle = load_triangle(path, self.layout, kind)
                    .with_context(|| format!("loading triangle {}", path.display()))?;
                Ok((path.display().to_string(), triangle))
            }
            None => Ok((self.dataset.to_string(), self.dataset.triangle())),
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.load_config()?;
    let (source, triangle) = args.load_triangle()?;

    let engine = BootstrapEngine::new(&triangle, config).context("setting up bootstrap")?;
    let run = engine.run();
    let report = BootstrapReport::build(source, &engine, &run);

    if let Some(path) = &args.report {
        write_report_json(create(path)?, &report)
            .with_context(|| format!("writing report {}", path.display()))?;
    }
    if let Some(path) = &args.reserves_csv {
        write_reserves_csv(create(path)?, &run)
            .with_context(|| format!("writing reserves {}", path.display()))?;
    }
    if let Some(path) = &args.records {
        write_records_ndjson(create(path)?, &run.records)
            .with_context(|| format!("writing records {}", path.display()))?;
    }

    if args.quiet {
        return Ok(());
    }

    println!("ODP Bootstrap");
    println!("=============\n");
    println!("Source:        {}", report.source);
    println!(
        "Triangle:      {} origins x {} developments ({} cells)",
        report.triangle.origins, report.triangle.developments, report.triangle.populated_cells
    );
    let residuals = &report.residuals;
    println!(
        "Residuals:     {} in pool, df {}, phi {:.2}",
        residuals.pool_size, residuals.degrees_of_freedom, residuals.scale_parameter
    );
    println!("Base reserve:  {:.0}", report.base_reserve);
    println!(
        "Iterations:    {} ({} failed, seed {})",
        report.iterations, report.failed, report.config.seed
    );

    match &report.summary {
        Some(s) => {
            println!();
            println!("{:>8} {:>16}", "Stat", "Reserve");
            println!("{}", "-".repeat(25));
            for (name, value) in [
                ("mean", s.mean),
                ("std", s.std_dev),
                ("min", s.min),
                ("p5", s.p5),
                ("p25", s.p25),
                ("p50", s.p50),
                ("p75", s.p75),
                ("p95", s.p95),
                ("max", s.max),
            ] {
                println!("{:>8} {:>16.0}", name, value);
            }
            println!("\nCoefficient of variation: {:.3}", s.std_dev / s.mean);
        }
        None => println!("\nNo successful iterations"),
    }

    Ok(())
}
