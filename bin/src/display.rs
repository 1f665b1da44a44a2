//! Display utilities and output formatting for the tickbars CLI.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tickbars_lib::prelude::*;
use tickbars_lib::{BarDrawing, SeriesRow};

/// Output format for bars and series.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Json,
    Ndjson,
    Parquet,
}

impl Format {
    /// Returns the file extension for this format.
    pub(crate) const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Parquet => "parquet",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

fn create(output: &Path) -> Result<BufWriter<File>> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    Ok(BufWriter::new(file))
}

/// Write synthetic bars to a file in the specified format.
pub(crate) fn write_bars(bars: &[SyntheticBar], output: &Path, format: Format) -> Result<()> {
    let writer = create(output)?;

    match format {
        Format::Csv => CsvFormatter::new().write_bars(bars, writer)?,
        Format::Json => JsonFormatter::new().write_bars(bars, writer)?,
        Format::Ndjson => JsonFormatter::ndjson().write_bars(bars, writer)?,
        Format::Parquet => {
            #[cfg(feature = "parquet")]
            {
                ParquetFormatter::new().write_bars(bars, writer)?;
            }
            #[cfg(not(feature = "parquet"))]
            {
                bail!("Parquet support not compiled in");
            }
        }
    }

    Ok(())
}

/// Write projected series rows to a file in the specified format.
pub(crate) fn write_series(rows: &[SeriesRow], output: &Path, format: Format) -> Result<()> {
    let writer = create(output)?;

    match format {
        Format::Csv => CsvFormatter::new().write_series(rows, writer)?,
        Format::Json => JsonFormatter::new().write_series(rows, writer)?,
        Format::Ndjson => JsonFormatter::ndjson().write_series(rows, writer)?,
        Format::Parquet => {
            #[cfg(feature = "parquet")]
            {
                ParquetFormatter::new().write_series(rows, writer)?;
            }
            #[cfg(not(feature = "parquet"))]
            {
                bail!("Parquet support not compiled in");
            }
        }
    }

    Ok(())
}

/// Write bar render descriptions as a JSON array.
pub(crate) fn write_drawings(drawings: &[BarDrawing], output: &Path) -> Result<()> {
    let writer = create(output)?;
    serde_json::to_writer_pretty(writer, drawings)
        .with_context(|| format!("Failed to write {}", output.display()))
}

/// Parse a `GRANULARITY=FILE` source argument.
pub(crate) fn parse_source(arg: &str) -> Result<(Granularity, &Path)> {
    let Some((name, path)) = arg.split_once('=') else {
        bail!("Invalid source '{arg}', expected GRANULARITY=FILE");
    };
    let granularity = name
        .parse::<Granularity>()
        .with_context(|| format!("Invalid source granularity '{name}'"))?;
    if path.is_empty() {
        bail!("Missing file for source '{name}'");
    }
    Ok((granularity, Path::new(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        let (granularity, path) = parse_source("Tick2=data/t2.csv").unwrap();
        assert_eq!(granularity.ticks(), 2);
        assert_eq!(path, Path::new("data/t2.csv"));

        assert!(parse_source("Tick2").is_err());
        assert!(parse_source("Minute1=m1.csv").is_err());
        assert!(parse_source("Tick2=").is_err());
    }
}
