//! Columnar persistence of the aligned price error table.
//!
//! One parquet file per analysis year, named `price-error-<year>.parquet`.
//! A year whose file already exists is skipped, so multi-year batch runs
//! are cheap to resume. Consumers union all yearly files in a directory
//! for multi-year analysis.

use crate::align::{calculate_price_error, PriceError};
use crate::error::{AlignmentError, Result};
use chrono::{DateTime, Duration};
use nem_data::{AnalysisWindow, PriceDataProvider};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "price-error-";
const FILE_SUFFIX: &str = ".parquet";

/// File name for one analysis year: `price-error-<year>.parquet`.
pub fn year_file_name(year: i32) -> String {
    format!("{}{}{}", FILE_PREFIX, year, FILE_SUFFIX)
}

/// Convert aligned rows to the stored column layout: `forecasted_time`
/// and `ahead_time` as epoch/duration milliseconds, `REGIONID` as utf8,
/// `error` nullable.
pub fn to_dataframe(rows: &[PriceError]) -> Result<DataFrame> {
    let forecasted_times: Vec<i64> = rows
        .iter()
        .map(|r| r.forecasted_time.and_utc().timestamp_millis())
        .collect();
    let regions: Vec<&str> = rows.iter().map(|r| r.region.as_str()).collect();
    let ahead_times: Vec<i64> = rows.iter().map(|r| r.ahead_time.num_milliseconds()).collect();
    let errors: Vec<Option<f64>> = rows.iter().map(|r| r.error).collect();

    let df = DataFrame::new(vec![
        Series::new("forecasted_time", forecasted_times),
        Series::new("REGIONID", regions),
        Series::new("ahead_time", ahead_times),
        Series::new("error", errors),
    ])?;
    Ok(df)
}

/// Rebuild aligned rows from the stored column layout.
pub fn from_dataframe(df: &DataFrame) -> Result<Vec<PriceError>> {
    let forecasted_times = df.column("forecasted_time")?.i64()?;
    let regions = df.column("REGIONID")?.utf8()?;
    let ahead_times = df.column("ahead_time")?.i64()?;
    let errors = df.column("error")?.f64()?;

    let missing = |column: &str, i: usize| {
        AlignmentError::Polars(format!("null {} at row {}", column, i))
    };

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let millis = forecasted_times
            .get(i)
            .ok_or_else(|| missing("forecasted_time", i))?;
        let forecasted_time = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| missing("forecasted_time", i))?
            .naive_utc();
        rows.push(PriceError {
            forecasted_time,
            region: regions
                .get(i)
                .ok_or_else(|| missing("REGIONID", i))?
                .to_string(),
            ahead_time: Duration::milliseconds(
                ahead_times.get(i).ok_or_else(|| missing("ahead_time", i))?,
            ),
            error: errors.get(i),
        });
    }
    Ok(rows)
}

/// Write aligned rows to one parquet file.
pub fn write_price_errors<P: AsRef<Path>>(path: P, rows: &[PriceError]) -> Result<()> {
    let mut df = to_dataframe(rows)?;
    let file = File::create(path.as_ref())?;
    ParquetWriter::new(file).finish(&mut df)?;
    Ok(())
}

/// Read aligned rows from one parquet file.
pub fn read_price_errors<P: AsRef<Path>>(path: P) -> Result<Vec<PriceError>> {
    let file = File::open(path.as_ref())?;
    let df = ParquetReader::new(file).finish()?;
    from_dataframe(&df)
}

/// Union every `price-error-*.parquet` file in a directory, in file-name
/// order.
pub fn read_all_price_errors<P: AsRef<Path>>(dir: P) -> Result<Vec<PriceError>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut rows = Vec::new();
    for path in paths {
        rows.extend(read_price_errors(&path)?);
    }
    Ok(rows)
}

/// Compute and persist price errors for every calendar-year partition of
/// `window`, one parquet file per year under `output_dir`.
///
/// Years whose file already exists are skipped on the existence of the
/// file alone; contents are not verified. Returns the paths of all year
/// files, skipped or written.
pub fn compute_yearly<P: PriceDataProvider>(
    provider: &P,
    window: &AnalysisWindow,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut paths = Vec::new();
    for (year, partition) in window.year_partitions() {
        let path = output_dir.join(year_file_name(year));
        if path.exists() {
            tracing::info!(year, path = %path.display(), "price error file exists, skipping");
            paths.push(path);
            continue;
        }
        tracing::info!(year, window = %partition, "calculating price errors");
        let rows = calculate_price_error(provider, &partition)?;
        write_price_errors(&path, &rows)?;
        tracing::info!(year, rows = rows.len(), path = %path.display(), "wrote price errors");
        paths.push(path);
    }
    Ok(paths)
}
