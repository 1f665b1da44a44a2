//! Output format abstraction.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tickbars_aggregate::{OhlcField, OutputSeries, SyntheticBar};

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// CSV format.
    #[default]
    Csv,
    /// JSON array format.
    Json,
    /// Newline-delimited JSON format.
    Ndjson,
    /// Apache Parquet format.
    Parquet,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Parquet => "parquet",
        }
    }

    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Json, Self::Ndjson, Self::Parquet]
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "parquet" | "pq" => Ok(Self::Parquet),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors that can occur during formatting.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Unknown output format.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Output series and chart timestamps disagree in length.
    #[error("Series has {series} rows but {timestamps} timestamps were given")]
    LengthMismatch {
        /// Rows in the output series.
        series: usize,
        /// Timestamps supplied.
        timestamps: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow/Parquet error.
    #[error("Parquet error: {0}")]
    Parquet(String),
}

/// One chart index of the projected output series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRow {
    /// Open time of the chart bar.
    pub timestamp: DateTime<Utc>,
    /// Chart index.
    pub index: usize,
    /// Projected open, if written.
    pub open: Option<f64>,
    /// Projected high, if written.
    pub high: Option<f64>,
    /// Projected low, if written.
    pub low: Option<f64>,
    /// Projected close, if written.
    pub close: Option<f64>,
}

/// Pairs chart timestamps with the projected output values.
///
/// Rows past the end of the written series are emitted with every value
/// unset.
///
/// # Errors
///
/// Returns [`FormatError::LengthMismatch`] if the series holds more rows
/// than there are timestamps.
pub fn series_rows(
    timestamps: &[DateTime<Utc>],
    series: &OutputSeries,
) -> Result<Vec<SeriesRow>, FormatError> {
    if series.len() > timestamps.len() {
        return Err(FormatError::LengthMismatch {
            series: series.len(),
            timestamps: timestamps.len(),
        });
    }
    Ok(timestamps
        .iter()
        .enumerate()
        .map(|(index, &timestamp)| SeriesRow {
            timestamp,
            index,
            open: series.get(OhlcField::Open, index),
            high: series.get(OhlcField::High, index),
            low: series.get(OhlcField::Low, index),
            close: series.get(OhlcField::Close, index),
        })
        .collect())
}

/// Trait for output formatters.
pub trait Formatter: Send + Sync {
    /// Writes synthetic bars to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_bars<W: Write + Send>(
        &self,
        bars: &[SyntheticBar],
        writer: W,
    ) -> Result<(), FormatError>;

    /// Writes projected output series rows to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_series<W: Write + Send>(
        &self,
        rows: &[SeriesRow],
        writer: W,
    ) -> Result<(), FormatError>;

    /// Returns the file extension for this format.
    fn extension(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use tickbars_aggregate::OutputSink;

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Ndjson);
        assert_eq!("pq".parse::<OutputFormat>().unwrap(), OutputFormat::Parquet);
        assert!("xlsx".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Ndjson.to_string(), "ndjson");
    }

    #[test]
    fn test_series_rows() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let times: Vec<_> = (0..3).map(|i| start + TimeDelta::seconds(i)).collect();
        let mut series = OutputSeries::default();
        series.set(OhlcField::High, 1, 1.5);

        let rows = series_rows(&times, &series).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].high, Some(1.5));
        assert_eq!(rows[1].open, None);
        assert_eq!(rows[2].high, None);
        assert_eq!(rows[2].timestamp, times[2]);

        assert!(matches!(
            series_rows(&times[..1], &series),
            Err(FormatError::LengthMismatch {
                series: 2,
                timestamps: 1
            })
        ));
    }
}
