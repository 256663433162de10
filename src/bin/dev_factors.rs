//! Print chain-ladder development factors and base reserves
//!
//! Usage: dev_factors [genins|raa|ukmotor|abc|path.csv] [--wide] [--incremental]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use odp_bootstrap::model::ChainLadder;
use odp_bootstrap::triangle::{load_triangle, CsvLayout, SampleDataset, TriangleKind};

#[derive(Debug, Parser)]
#[command(name = "dev_factors", about = "Chain-ladder factor table for a triangle")]
struct Args {
    /// Sample dataset name or path to a triangle CSV
    #[arg(default_value = "genins")]
    source: String,

    /// CSV is in wide layout (one row per origin)
    #[arg(long)]
    wide: bool,

    /// CSV holds incremental amounts
    #[arg(long)]
    incremental: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let triangle = match args.source.parse::<SampleDataset>() {
        Ok(dataset) => dataset.triangle(),
        Err(_) => {
            let path = PathBuf::from(&args.source);
            let layout = if args.wide { CsvLayout::Wide } else { CsvLayout::Long };
            let kind = if args.incremental {
                TriangleKind::Incremental
            } else {
                TriangleKind::Cumulative
            };
            load_triangle(&path, layout, kind)
                .with_context(|| format!("loading triangle {}", path.display()))?
        }
    };

    let model = ChainLadder::fit(&triangle).context("fitting chain ladder")?;

    println!("Development factors: {}", args.source);
    println!("{:>12} {:>10} {:>10}", "Period", "LDF", "CDF");
    println!("{}", "-".repeat(34));
    for factor in model.factor_table(triangle.development_labels()) {
        println!("{:>12} {:>10.4} {:>10.4}", factor.period, factor.ldf, factor.cdf);
    }

    println!();
    println!("{:>8} {:>14} {:>14} {:>14}", "Origin", "Latest", "Ultimate", "Reserve");
    println!("{}", "-".repeat(53));
    for ((origin, latest), ultimate) in triangle
        .origin_labels()
        .iter()
        .zip(model.latest())
        .zip(model.ultimates())
    {
        println!(
            "{:>8} {:>14.0} {:>14.0} {:>14.0}",
            origin,
            latest,
            ultimate,
            ultimate - latest
        );
    }
    println!("{}", "-".repeat(53));
    println!("{:>8} {:>44.0}", "Total", model.reserve());

    Ok(())
}
