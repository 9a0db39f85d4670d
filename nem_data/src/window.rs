//! Analysis windows: half-open time ranges over which price errors are
//! computed, with per-year partitioning for batch runs.

use crate::{MarketDataError, Result, DATETIME_FORMAT};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// A half-open `[start, end)` analysis window in market time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl AnalysisWindow {
    /// Create a window, validating that `start < end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start >= end {
            return Err(MarketDataError::InvalidWindow(format!(
                "start ({}) must precede end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a window from `YYYY/mm/dd HH:MM:SS` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = NaiveDateTime::parse_from_str(start, DATETIME_FORMAT)
            .map_err(|e| MarketDataError::InvalidWindow(format!("start '{}': {}", start, e)))?;
        let end = NaiveDateTime::parse_from_str(end, DATETIME_FORMAT)
            .map_err(|e| MarketDataError::InvalidWindow(format!("end '{}': {}", end, e)))?;
        Self::new(start, end)
    }

    /// A full calendar year as a window.
    pub fn calendar_year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| MarketDataError::InvalidWindow(format!("invalid year {}", year)))?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| MarketDataError::InvalidWindow(format!("invalid year {}", year)))?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
            .ok_or_else(|| MarketDataError::InvalidWindow(format!("invalid year {}", year + 1)))?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| MarketDataError::InvalidWindow(format!("invalid year {}", year + 1)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whether `t` falls inside the half-open range.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    /// The same window with its start moved earlier by `by`. Used to fetch
    /// actual prices for forecasts targeting the first intervals of the
    /// window.
    pub fn extended_back(&self, by: Duration) -> Self {
        Self {
            start: self.start - by,
            end: self.end,
        }
    }

    /// Split the window on calendar-year boundaries, clamping the first
    /// and last partitions. Each partition is an independent batch unit.
    pub fn year_partitions(&self) -> Vec<(i32, AnalysisWindow)> {
        let mut partitions = Vec::new();
        for year in self.start.year()..=self.end.year() {
            let year_start = NaiveDate::from_ymd_opt(year, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(self.start);
            let year_end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(self.end);
            let start = self.start.max(year_start);
            let end = self.end.min(year_end);
            if start < end {
                partitions.push((year, AnalysisWindow { start, end }));
            }
        }
        partitions
    }
}

impl std::fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(DATETIME_FORMAT),
            self.end.format(DATETIME_FORMAT)
        )
    }
}
