//! Bar file loading.
//!
//! Files are CSV with a header naming `timestamp`, `open`, `high`, `low`
//! and `close` columns in any order. Timestamps are RFC 3339 or integer
//! milliseconds since the Unix epoch.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use futures::StreamExt;
use std::path::Path;
use std::str::FromStr;
use tickbars_lib::prelude::*;
use tokio::io::AsyncRead;

const COLUMNS: [&str; 5] = ["timestamp", "open", "high", "low", "close"];

/// Reads every bar of a CSV bar file.
pub(crate) async fn read_bars(path: &Path) -> Result<Vec<SourceBar>> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    parse_bars(file)
        .await
        .with_context(|| format!("Failed to read bars from {}", path.display()))
}

/// Parses bars from CSV text, indexing them by row.
pub(crate) async fn parse_bars<R>(reader: R) -> Result<Vec<SourceBar>>
where
    R: AsyncRead + Unpin + Send,
{
    let mut reader = AsyncReaderBuilder::new()
        .trim(Trim::All)
        .create_reader(reader);

    let headers = reader.headers().await?.clone();
    let positions = column_positions(&headers)?;

    let mut bars = Vec::new();
    let mut records = reader.records();
    while let Some(record) = records.next().await {
        let record = record?;
        let index = bars.len();
        let bar = parse_record(&record, &positions, index)
            .with_context(|| format!("Invalid bar on data row {}", index + 1))?;
        bars.push(bar);
    }

    tracing::debug!(bars = bars.len(), "parsed bar file");
    Ok(bars)
}

fn column_positions(headers: &StringRecord) -> Result<[usize; 5]> {
    let mut positions = [0; 5];
    for (slot, name) in positions.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("Missing '{name}' column"))?;
    }
    Ok(positions)
}

fn parse_record(record: &StringRecord, positions: &[usize; 5], index: usize) -> Result<SourceBar> {
    let field = |i: usize| {
        record
            .get(positions[i])
            .ok_or_else(|| anyhow!("Missing '{}' value", COLUMNS[i]))
    };
    let price = |i: usize| -> Result<Decimal> {
        let raw = field(i)?;
        Decimal::from_str(raw).with_context(|| format!("Invalid {} '{raw}'", COLUMNS[i]))
    };

    Ok(SourceBar::new(
        parse_timestamp(field(0)?)?,
        index,
        price(1)?,
        price(2)?,
        price(3)?,
        price(4)?,
    ))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| anyhow!("Timestamp out of range: {millis}"));
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(e) => bail!("Invalid timestamp '{raw}': {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_parse_bars() {
        let csv = "timestamp,open,high,low,close\n\
                   2024-01-15T12:00:00Z,1.1000,1.1010,1.0990,1.1005\n\
                   1705320060000, 1.1005, 1.1020, 1.1000, 1.1015\n";

        let bars = parse_bars(csv.as_bytes()).await.unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].index, 0);
        assert_eq!(bars[1].index, 1);
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
        );
        assert_eq!(
            bars[1].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 1, 0).unwrap()
        );
        assert_eq!(bars[1].high, Decimal::from_str("1.1020").unwrap());
    }

    #[tokio::test]
    async fn test_columns_in_any_order() {
        let csv = "Close,Low,High,Open,Timestamp\n4,1,5,2,0\n";
        let bars = parse_bars(csv.as_bytes()).await.unwrap();
        assert_eq!(bars[0].open, Decimal::from(2));
        assert_eq!(bars[0].close, Decimal::from(4));
    }

    #[tokio::test]
    async fn test_missing_column() {
        let csv = "timestamp,open,high,low\n0,1,1,1\n";
        let err = parse_bars(csv.as_bytes()).await.unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[tokio::test]
    async fn test_invalid_price() {
        let csv = "timestamp,open,high,low,close\n0,1,abc,1,1\n";
        assert!(parse_bars(csv.as_bytes()).await.is_err());
    }

    #[tokio::test]
    async fn test_read_bars_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        std::fs::write(&path, "timestamp,open,high,low,close\n0,1,2,0.5,1.5\n").unwrap();

        let bars = read_bars(&path).await.unwrap();
        assert_eq!(bars.len(), 1);
        assert!(read_bars(&dir.path().join("missing.csv")).await.is_err());
    }
}
