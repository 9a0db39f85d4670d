//! CSV-cache data provider.
//!
//! Reads AEMO-shaped tables from a cache directory, one file per table:
//! `DISPATCHPRICE.csv` for actual prices, `P5MIN.csv` and
//! `PREDISPATCH.csv` for forecasts. Raw column names are mapped to the
//! canonical model here, so the rest of the pipeline never sees the
//! per-table naming differences.

use crate::provider::{PriceDataProvider, RunWindow};
use crate::{
    ActualPrice, AnalysisWindow, ForecastPrice, ForecastType, MarketDataError, Result,
    DATETIME_FORMAT,
};
use chrono::NaiveDateTime;
use csv::StringRecord;
use std::fs::File;
use std::path::PathBuf;

const ACTUAL_FILE: &str = "DISPATCHPRICE.csv";

/// Provider reading cached AEMO CSV extracts from a directory.
#[derive(Debug, Clone)]
pub struct CsvCacheProvider {
    cache_dir: PathBuf,
}

/// Header positions for one open table, resolved by column name. The
/// intervention column is optional: some PREDISPATCH price extracts do not
/// carry it, and its absence must not be an error.
struct TableColumns {
    run_time: Option<usize>,
    time: usize,
    region: usize,
    price: usize,
    intervention: Option<usize>,
}

impl CsvCacheProvider {
    pub fn new<P: Into<PathBuf>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn open(&self, file_name: &str) -> Result<csv::Reader<File>> {
        let path = self.cache_dir.join(file_name);
        let file = File::open(&path).map_err(|e| {
            MarketDataError::DataLoad(format!("cannot open {}: {}", path.display(), e))
        })?;
        Ok(csv::Reader::from_reader(file))
    }

    fn resolve_columns(
        headers: &StringRecord,
        run_column: Option<&str>,
        time_column: &str,
        path_hint: &str,
    ) -> Result<TableColumns> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                MarketDataError::DataLoad(format!("{}: missing column {}", path_hint, name))
            })
        };
        Ok(TableColumns {
            run_time: match run_column {
                Some(name) => Some(require(name)?),
                None => None,
            },
            time: require(time_column)?,
            region: require("REGIONID")?,
            price: require("RRP")?,
            intervention: find("INTERVENTION"),
        })
    }
}

fn parse_datetime(field: &str, line: usize) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(field.trim(), DATETIME_FORMAT)
        .map_err(|e| MarketDataError::DataLoad(format!("line {}: bad datetime '{}': {}", line, field, e)))
}

fn parse_price(field: &str, line: usize) -> Result<f64> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|e| MarketDataError::DataLoad(format!("line {}: bad price '{}': {}", line, field, e)))
}

fn intervention_flag(record: &StringRecord, index: Option<usize>) -> Option<bool> {
    index
        .and_then(|i| record.get(i))
        .map(|v| v.trim() != "0" && !v.trim().is_empty())
}

impl PriceDataProvider for CsvCacheProvider {
    fn actual_prices(&self, window: &AnalysisWindow) -> Result<Vec<ActualPrice>> {
        let mut reader = self.open(ACTUAL_FILE)?;
        let columns =
            Self::resolve_columns(reader.headers()?, None, "SETTLEMENTDATE", ACTUAL_FILE)?;

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let line = i + 2;
            let settlement_time = parse_datetime(&record[columns.time], line)?;
            if !window.contains(settlement_time) {
                continue;
            }
            // One canonical price per interval: intervention re-runs are
            // not the settled price
            if intervention_flag(&record, columns.intervention) == Some(true) {
                continue;
            }
            rows.push(ActualPrice {
                settlement_time,
                region: record[columns.region].trim().to_string(),
                price: parse_price(&record[columns.price], line)?,
            });
        }
        tracing::debug!(rows = rows.len(), window = %window, "loaded actual prices");
        Ok(rows)
    }

    fn forecast_prices(
        &self,
        forecast_type: ForecastType,
        run_window: &RunWindow,
        window: &AnalysisWindow,
    ) -> Result<Vec<ForecastPrice>> {
        let (file_name, run_column, time_column) = match forecast_type {
            ForecastType::P5min => ("P5MIN.csv", "RUN_DATETIME", "INTERVAL_DATETIME"),
            ForecastType::Predispatch => ("PREDISPATCH.csv", "PREDISPATCH_RUN_DATETIME", "DATETIME"),
        };
        let mut reader = self.open(file_name)?;
        let columns =
            Self::resolve_columns(reader.headers()?, Some(run_column), time_column, file_name)?;
        let run_index = columns.run_time.unwrap_or(columns.time);

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let line = i + 2;
            let run_time = parse_datetime(&record[run_index], line)?;
            let forecasted_time = parse_datetime(&record[columns.time], line)?;
            if !run_window.contains(run_time) || !window.contains(forecasted_time) {
                continue;
            }
            rows.push(ForecastPrice {
                run_time,
                forecasted_time,
                region: record[columns.region].trim().to_string(),
                price: parse_price(&record[columns.price], line)?,
                intervention: intervention_flag(&record, columns.intervention),
            });
        }
        tracing::debug!(
            rows = rows.len(),
            forecast_type = %forecast_type,
            "loaded forecast prices"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn window() -> AnalysisWindow {
        AnalysisWindow::parse("2021/06/01 00:00:00", "2021/06/02 00:00:00").unwrap()
    }

    #[test]
    fn test_actuals_filter_intervention_and_window() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            ACTUAL_FILE,
            "SETTLEMENTDATE,REGIONID,RRP,INTERVENTION\n\
             2021/06/01 12:00:00,NSW1,65.0,0\n\
             2021/06/01 12:00:00,NSW1,99.0,1\n\
             2021/06/03 12:00:00,NSW1,70.0,0\n",
        );
        let provider = CsvCacheProvider::new(dir.path());
        let rows = provider.actual_prices(&window()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, 65.0);
    }

    #[test]
    fn test_predispatch_without_intervention_column() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "PREDISPATCH.csv",
            "PREDISPATCH_RUN_DATETIME,DATETIME,REGIONID,RRP\n\
             2021/06/01 11:30:00,2021/06/01 12:00:00,NSW1,62.5\n",
        );
        let provider = CsvCacheProvider::new(dir.path());
        let runs = ForecastType::Predispatch.run_window_for(&window());
        let rows = provider
            .forecast_prices(ForecastType::Predispatch, &runs, &window())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].intervention, None);
        assert_eq!(rows[0].price, 62.5);
    }

    #[test]
    fn test_p5min_keeps_intervention_flag() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "P5MIN.csv",
            "RUN_DATETIME,INTERVAL_DATETIME,REGIONID,RRP,INTERVENTION\n\
             2021/06/01 11:55:00,2021/06/01 12:00:00,NSW1,60.0,0\n\
             2021/06/01 11:55:00,2021/06/01 12:05:00,NSW1,61.0,1\n",
        );
        let provider = CsvCacheProvider::new(dir.path());
        let runs = ForecastType::P5min.run_window_for(&window());
        let rows = provider
            .forecast_prices(ForecastType::P5min, &runs, &window())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].intervention, Some(false));
        assert_eq!(rows[1].intervention, Some(true));
    }

    #[test]
    fn test_window_outside_data_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            ACTUAL_FILE,
            "SETTLEMENTDATE,REGIONID,RRP\n\
             2019/06/01 12:00:00,NSW1,65.0\n",
        );
        let provider = CsvCacheProvider::new(dir.path());
        let rows = provider.actual_prices(&window()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvCacheProvider::new(dir.path());
        let result = provider.actual_prices(&window());
        assert!(matches!(result, Err(MarketDataError::DataLoad(_))));
    }
}
