//! Batch runner: compute price errors year by year and persist one
//! parquet file per year.
//!
//! ```text
//! compute_price_errors <start_year> <end_year> <output_dir> [csv_cache_dir]
//! ```
//!
//! With a CSV cache directory the runner reads AEMO-shaped extracts
//! (`DISPATCHPRICE.csv`, `P5MIN.csv`, `PREDISPATCH.csv`); without one it
//! falls back to deterministic synthetic data, which is useful for
//! exercising the pipeline end to end.

use nem_data::{AnalysisWindow, CsvCacheProvider, PriceDataProvider, SyntheticProvider};
use price_error::store::compute_yearly;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("Usage: compute_price_errors <start_year> <end_year> <output_dir> [csv_cache_dir]");
    process::exit(1);
}

fn parse_year(arg: Option<String>) -> i32 {
    match arg.and_then(|a| a.parse::<i32>().ok()) {
        Some(year) => year,
        None => usage(),
    }
}

fn run<P: PriceDataProvider>(
    provider: &P,
    window: &AnalysisWindow,
    output_dir: &Path,
) -> price_error::error::Result<Vec<PathBuf>> {
    compute_yearly(provider, window, output_dir)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let start_year = parse_year(args.next());
    let end_year = parse_year(args.next());
    let output_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => usage(),
    };
    let cache_dir = args.next().map(PathBuf::from);

    if end_year < start_year {
        usage();
    }
    let window = match AnalysisWindow::parse(
        &format!("{}/01/01 00:00:00", start_year),
        &format!("{}/01/01 00:00:00", end_year + 1),
    ) {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Invalid analysis window: {}", e);
            process::exit(1);
        }
    };

    let result = match cache_dir {
        Some(dir) => run(&CsvCacheProvider::new(dir), &window, &output_dir),
        None => run(&SyntheticProvider::new(0), &window, &output_dir),
    };

    match result {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Price error calculation failed: {}", e);
            process::exit(1);
        }
    }
}
