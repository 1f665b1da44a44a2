//! Aggregate command implementation.
//!
//! This module loads a chart and optional source streams from bar files,
//! runs an aggregation session over every chart bar and writes the results.

use crate::config::{default_config_path, load_config};
use crate::display::{Format, parse_source, write_bars, write_drawings, write_series};
use crate::input::read_bars;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tickbars_lib::prelude::*;
use tickbars_lib::BarDrawing;

/// Arguments of the aggregate command.
pub(crate) struct AggregateArgs {
    pub(crate) chart: PathBuf,
    pub(crate) timeframe: String,
    pub(crate) size: Option<u32>,
    pub(crate) sources: Vec<String>,
    pub(crate) available_only: bool,
    pub(crate) config: Option<PathBuf>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) series: Option<PathBuf>,
    pub(crate) drawings: Option<PathBuf>,
    pub(crate) format: Format,
}

/// Build synthetic bars for a chart file.
pub(crate) async fn aggregate(args: AggregateArgs, quiet: bool) -> Result<()> {
    let default_config = default_config_path();
    let config = load_config(args.config.as_deref(), default_config.as_deref(), args.size)?;

    let chart_bars = read_bars(&args.chart).await?;
    let chart = VecSeries::new(args.timeframe.as_str(), chart_bars);

    let mut market = InMemoryMarket::new();
    for arg in &args.sources {
        let (granularity, path) = parse_source(arg)?;
        let bars = read_bars(path).await?;
        tracing::info!(%granularity, bars = bars.len(), path = %path.display(), "loaded source stream");
        market.insert(granularity, VecSeries::new(granularity.to_string(), bars));
    }

    let catalog = if args.available_only {
        market.granularities()
    } else {
        GranularityRegistry::global().available()
    };

    let mut session: AggregationSession<VecSeries, VecSeries> =
        AggregationSession::start(config, chart, catalog, &mut market).with_context(|| {
            format!(
                "Cannot build {}-tick bars from a {} chart",
                args.size.map_or_else(|| "configured".to_string(), |s| s.to_string()),
                args.timeframe
            )
        })?;

    let total = session.chart().len();
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} bars ({percent}%) {msg}")
                .expect("Invalid progress template")
                .progress_chars("=>-"),
        );
        pb.set_message(session.decision().to_string());
        pb
    };

    let mut outputs = OutputSeries::with_len(total);
    let mut drawings: Vec<BarDrawing> = Vec::new();
    for chart_index in 0..total {
        session
            .on_chart_bar(chart_index, &mut drawings, &mut outputs)
            .with_context(|| format!("Failed at chart bar {chart_index}"))?;
        progress.inc(1);
    }

    let timestamps = session.chart().timestamps();
    let bars = session.finish();
    progress.finish_with_message(format!("Built {} bars", bars.len()));

    let output = args.output.unwrap_or_else(|| {
        args.chart
            .with_extension(format!("bars.{}", args.format.extension()))
    });
    write_bars(bars.as_slice(), &output, args.format)?;

    if let Some(path) = &args.series {
        let rows = series_rows(&timestamps, &outputs)?;
        write_series(&rows, path, args.format)?;
    }

    if let Some(path) = &args.drawings {
        write_drawings(&drawings, path)?;
    }

    if !quiet {
        println!("Output written to: {}", output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_chart(path: &Path, count: usize, step_secs: usize) {
        let mut csv = String::from("timestamp,open,high,low,close\n");
        for i in 0..count {
            let open = 100 + i;
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                i * step_secs * 1000,
                open,
                open + 2,
                open - 1,
                open + 1
            ));
        }
        std::fs::write(path, csv).unwrap();
    }

    fn args(chart: PathBuf, timeframe: &str, size: u32) -> AggregateArgs {
        AggregateArgs {
            chart,
            timeframe: timeframe.to_string(),
            size: Some(size),
            sources: Vec::new(),
            available_only: false,
            config: None,
            output: None,
            series: None,
            drawings: None,
            format: Format::Csv,
        }
    }

    #[tokio::test]
    async fn test_aggregate_chart_file() {
        let dir = tempfile::tempdir().unwrap();
        let chart = dir.path().join("chart.csv");
        write_chart(&chart, 6, 5);

        let mut args = args(chart, "Tick5", 10);
        args.series = Some(dir.path().join("series.csv"));
        args.drawings = Some(dir.path().join("drawings.json"));
        aggregate(args, true).await.unwrap();

        let bars = std::fs::read_to_string(dir.path().join("chart.bars.csv")).unwrap();
        assert_eq!(bars.lines().count(), 4);

        let series = std::fs::read_to_string(dir.path().join("series.csv")).unwrap();
        assert_eq!(series.lines().count(), 7);

        let drawings: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("drawings.json")).unwrap())
                .unwrap();
        assert!(!drawings.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_from_source_stream() {
        let dir = tempfile::tempdir().unwrap();
        let chart = dir.path().join("chart.csv");
        let ticks = dir.path().join("tick3.csv");
        write_chart(&chart, 4, 4);
        write_chart(&ticks, 6, 3);

        let mut args = args(chart, "Tick4", 6);
        args.sources = vec![format!("Tick3={}", ticks.display())];
        args.available_only = true;
        args.format = Format::Json;
        args.output = Some(dir.path().join("out.json"));
        aggregate(args, true).await.unwrap();

        let bars: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap())
                .unwrap();
        assert_eq!(bars.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_aggregate_rejects_larger_chart() {
        let dir = tempfile::tempdir().unwrap();
        let chart = dir.path().join("chart.csv");
        write_chart(&chart, 3, 10);

        let result = aggregate(args(chart, "Tick10", 7), true).await;
        assert!(result.is_err());
    }
}
