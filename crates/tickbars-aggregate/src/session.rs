//! Aggregation session attached to one chart.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickbars_types::{
    ConfigurationError, Granularity, GranularityCatalog, PreconditionViolation, Result,
    SourceBar, TickbarsError,
};

use crate::{
    AggregationState, BarAccumulator, BarHandle, BarIndex, BarPainter, Decision, DrawStyle,
    MarketData, OutputFlags, OutputSink, Projector, RenderSink, Resolver, SourceSeries, Step,
    SyntheticBar,
};

/// User-facing session parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Requested synthetic bar size in ticks.
    pub size_in_ticks: u32,
    /// Output series to write.
    #[serde(default)]
    pub outputs: OutputFlags,
    /// Render style.
    #[serde(default)]
    pub style: DrawStyle,
}

impl SessionConfig {
    /// Creates a configuration with default outputs and style.
    #[must_use]
    pub fn new(size_in_ticks: u32) -> Self {
        Self {
            size_in_ticks,
            outputs: OutputFlags::default(),
            style: DrawStyle::default(),
        }
    }

    /// Sets the enabled output series.
    #[must_use]
    pub const fn with_outputs(mut self, outputs: OutputFlags) -> Self {
        self.outputs = outputs;
        self
    }

    /// Sets the render style.
    #[must_use]
    pub const fn with_style(mut self, style: DrawStyle) -> Self {
        self.style = style;
        self
    }
}

/// Outcome of a chart bar notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartStep {
    /// The chart bar maps to the source bar processed last. Nothing was
    /// folded; the chart bar was given the open bar's values.
    Duplicate,
    /// The chart already has the requested size; its bar was copied to the outputs.
    PassedThrough,
    /// No source bar opens at or before the chart bar.
    Unmapped,
    /// Source bars were folded.
    Updated {
        /// The open synthetic bar.
        bar: BarHandle,
        /// Bars sealed while folding, oldest first.
        sealed: Vec<BarHandle>,
        /// Number of source bars folded.
        folded: usize,
    },
}

#[derive(Debug)]
enum Mode<S> {
    Passthrough,
    Aggregate {
        /// Requested stream; `None` when the chart itself is folded.
        source: Option<S>,
        accumulator: BarAccumulator,
        painter: BarPainter,
    },
}

/// Builds synthetic bars for one chart.
///
/// `C` is the chart series the host notifies about; `S` is the stream
/// requested from market data when the chart cannot be folded directly.
#[derive(Debug)]
pub struct AggregationSession<C, S> {
    config: SessionConfig,
    chart: C,
    chart_granularity: Granularity,
    decision: Decision,
    projector: Projector,
    mode: Mode<S>,
    last_chart_index: Option<usize>,
}

impl<C: SourceSeries, S: SourceSeries> AggregationSession<C, S> {
    /// Starts a session over `chart`.
    ///
    /// # Errors
    ///
    /// - [`TickbarsError::Configuration`] if the size is zero, the chart is
    ///   not a tick chart, or no catalog granularity fits.
    /// - [`TickbarsError::SizeMismatch`] if the chart's bars are larger than
    ///   the requested size.
    /// - [`TickbarsError::InsufficientHistory`] if the requested stream is
    ///   empty or cannot be extended back to the chart's first bar.
    pub fn start<G, M>(config: SessionConfig, chart: C, catalog: G, market: &mut M) -> Result<Self>
    where
        G: GranularityCatalog,
        M: MarketData<Series = S>,
    {
        let desired = config.size_in_ticks;
        if desired == 0 {
            return Err(ConfigurationError::InvalidSize(desired).into());
        }

        let chart_granularity: Granularity = chart
            .timeframe()
            .parse()
            .map_err(|_| ConfigurationError::NotTickBased(chart.timeframe().to_string()))?;

        if chart_granularity.ticks() > desired {
            return Err(TickbarsError::SizeMismatch {
                desired,
                current: chart_granularity,
            });
        }

        let decision = Resolver::new(catalog).resolve(desired, chart_granularity)?;

        let mode = match decision {
            Decision::UseDirectly => Mode::Passthrough,
            Decision::AggregateFromCurrent { ratio } => Mode::Aggregate {
                source: None,
                accumulator: BarAccumulator::new(ratio),
                painter: BarPainter::new(config.style),
            },
            Decision::RequestFinerStream {
                granularity, ratio, ..
            } => {
                let mut series = market.series(granularity)?;
                align_history(&chart, &mut series, granularity)?;
                Mode::Aggregate {
                    source: Some(series),
                    accumulator: BarAccumulator::new(ratio),
                    painter: BarPainter::new(config.style),
                }
            }
        };

        tracing::info!(
            chart = %chart_granularity,
            desired_ticks = desired,
            %decision,
            "aggregation session started"
        );

        Ok(Self {
            projector: Projector::new(config.outputs),
            config,
            chart,
            chart_granularity,
            decision,
            mode,
            last_chart_index: None,
        })
    }

    /// Handles a notification that the chart bar at `chart_index` opened or changed.
    ///
    /// Every source bar after the last folded one, up to the bar that maps
    /// to the chart bar, is folded. The open bar is projected onto the chart
    /// indices it spans and drawn, together with any bar sealed on the way.
    ///
    /// # Errors
    ///
    /// Returns [`TickbarsError::Precondition`] if the chart bar does not
    /// exist, maps to a source bar before the last folded one, or a folded
    /// source bar is rejected. Bars folded before the rejected one stay folded.
    pub fn on_chart_bar<R, O>(
        &mut self,
        chart_index: usize,
        render: &mut R,
        outputs: &mut O,
    ) -> Result<ChartStep>
    where
        R: RenderSink + ?Sized,
        O: OutputSink + ?Sized,
    {
        let chart_bar = self
            .chart
            .get(chart_index)
            .ok_or(PreconditionViolation::MissingBar(chart_index))?;

        let Mode::Aggregate {
            source,
            accumulator,
            painter,
        } = &mut self.mode
        else {
            self.projector
                .project_source(&chart_bar, chart_index, outputs);
            self.last_chart_index = Some(chart_index);
            return Ok(ChartStep::PassedThrough);
        };
        let source = source.as_ref();

        let target = match source {
            Some(series) => match series.index_by_time(chart_bar.timestamp) {
                Some(index) => index,
                None => {
                    tracing::trace!(chart_index, "chart bar precedes the source stream");
                    return Ok(ChartStep::Unmapped);
                }
            },
            None => chart_index,
        };

        let last = accumulator.state().last_index;
        if last == Some(target) {
            let bars = accumulator.index();
            if let Some(bar) = bars.find_by_source_index(target).and_then(|h| bars.get(h)) {
                self.projector.project(bar, chart_index..=chart_index, outputs);
            }
            self.last_chart_index = Some(chart_index);
            return Ok(ChartStep::Duplicate);
        }
        if let Some(last) = last
            && target < last
        {
            return Err(PreconditionViolation::IndexRegression {
                index: target,
                last,
            }
            .into());
        }

        let mut sealed = Vec::new();
        let mut folded = 0;
        for index in last.map_or(target, |last| last + 1)..=target {
            let bar = source_bar(&self.chart, source, index)?;
            if let Step::Sealed { sealed: handle, .. } = accumulator.on_new_source_bar(&bar)? {
                sealed.push(handle);
            }
            folded += 1;
        }
        self.last_chart_index = Some(chart_index);

        let bars = accumulator.index();
        let direct = source.is_none();
        for bar in sealed.iter().filter_map(|&handle| bars.get(handle)) {
            let range = sealed_through(&self.chart, source, bar, chart_index)
                .and_then(|through| chart_span(&self.chart, bar, direct, through));
            if let Some(range) = range {
                self.projector.project(bar, range, outputs);
            }
            render.draw_bar(&painter.describe(bar));
        }

        let Some((handle, bar)) = bars.open_bar() else {
            return Ok(ChartStep::Unmapped);
        };
        if let Some(range) = chart_span(&self.chart, bar, direct, chart_index) {
            self.projector.project(bar, range, outputs);
        }
        render.draw_bar(&painter.describe(bar));

        tracing::trace!(chart_index, source_index = target, folded, "chart bar processed");
        Ok(ChartStep::Updated {
            bar: handle,
            sealed,
            folded,
        })
    }

    /// Notifies every chart bar after the last notified one, in order.
    ///
    /// Returns the number of notifications that changed the outputs.
    ///
    /// # Errors
    ///
    /// Stops at the first failing notification; see [`Self::on_chart_bar`].
    pub fn process_pending<R, O>(&mut self, render: &mut R, outputs: &mut O) -> Result<usize>
    where
        R: RenderSink + ?Sized,
        O: OutputSink + ?Sized,
    {
        let first = self.last_chart_index.map_or(0, |last| last + 1);
        let mut changed = 0;
        for chart_index in first..self.chart.len() {
            match self.on_chart_bar(chart_index, render, outputs)? {
                ChartStep::Updated { .. } | ChartStep::PassedThrough => changed += 1,
                ChartStep::Duplicate | ChartStep::Unmapped => {}
            }
        }
        Ok(changed)
    }

    /// Writes the values of the bar that covers `chart_index` again.
    ///
    /// Nothing is folded. Returns the bar's handle, or `None` in passthrough
    /// mode or when no synthetic bar covers the chart bar yet.
    ///
    /// # Errors
    ///
    /// Returns [`TickbarsError::Precondition`] if the chart bar does not exist.
    pub fn reproject<O>(&self, chart_index: usize, outputs: &mut O) -> Result<Option<BarHandle>>
    where
        O: OutputSink + ?Sized,
    {
        let chart_bar = self
            .chart
            .get(chart_index)
            .ok_or(PreconditionViolation::MissingBar(chart_index))?;

        let Mode::Aggregate {
            source,
            accumulator,
            ..
        } = &self.mode
        else {
            self.projector
                .project_source(&chart_bar, chart_index, outputs);
            return Ok(None);
        };

        let source_index = match source {
            Some(series) => series.index_by_time(chart_bar.timestamp),
            None => Some(chart_index),
        };
        let bars = accumulator.index();
        let handle = source_index.and_then(|index| bars.find_by_source_index(index));
        if let Some(bar) = handle.and_then(|h| bars.get(h)) {
            self.projector.project(bar, chart_index..=chart_index, outputs);
        }
        Ok(handle)
    }

    /// Returns the synthetic bar whose time span contains `timestamp`.
    #[must_use]
    pub fn covering(&self, timestamp: DateTime<Utc>) -> Option<&SyntheticBar> {
        let bars = self.bars()?;
        bars.find_covering(timestamp).and_then(|h| bars.get(h))
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns how the requested size is fed.
    #[must_use]
    pub const fn decision(&self) -> Decision {
        self.decision
    }

    /// Returns the granularity of the chart.
    #[must_use]
    pub const fn chart_granularity(&self) -> Granularity {
        self.chart_granularity
    }

    /// Returns the chart series.
    #[must_use]
    pub const fn chart(&self) -> &C {
        &self.chart
    }

    /// Returns the chart series for appending live bars.
    pub const fn chart_mut(&mut self) -> &mut C {
        &mut self.chart
    }

    /// Returns the requested source stream, if one was fetched.
    #[must_use]
    pub fn source(&self) -> Option<&S> {
        match &self.mode {
            Mode::Aggregate { source, .. } => source.as_ref(),
            Mode::Passthrough => None,
        }
    }

    /// Returns the requested source stream for appending live bars.
    pub fn source_mut(&mut self) -> Option<&mut S> {
        match &mut self.mode {
            Mode::Aggregate { source, .. } => source.as_mut(),
            Mode::Passthrough => None,
        }
    }

    /// Returns the synthetic bars, or `None` in passthrough mode.
    #[must_use]
    pub fn bars(&self) -> Option<&BarIndex> {
        match &self.mode {
            Mode::Aggregate { accumulator, .. } => Some(accumulator.index()),
            Mode::Passthrough => None,
        }
    }

    /// Returns the aggregation state, or `None` in passthrough mode.
    #[must_use]
    pub fn state(&self) -> Option<&AggregationState> {
        match &self.mode {
            Mode::Aggregate { accumulator, .. } => Some(accumulator.state()),
            Mode::Passthrough => None,
        }
    }

    /// Returns the chart object name suffix, or `None` in passthrough mode.
    #[must_use]
    pub fn object_suffix(&self) -> Option<&str> {
        match &self.mode {
            Mode::Aggregate { painter, .. } => Some(painter.suffix()),
            Mode::Passthrough => None,
        }
    }

    /// Ends the session, sealing the open bar and returning every bar.
    #[must_use]
    pub fn finish(self) -> BarIndex {
        match self.mode {
            Mode::Aggregate { accumulator, .. } => accumulator.finish(),
            Mode::Passthrough => BarIndex::new(),
        }
    }
}

/// Loads history into `series` until its first bar is not later than the chart's.
fn align_history<C, S>(chart: &C, series: &mut S, granularity: Granularity) -> Result<()>
where
    C: SourceSeries + ?Sized,
    S: SourceSeries + ?Sized,
{
    let Some(first) = series.open_time(0) else {
        return Err(TickbarsError::InsufficientHistory {
            granularity,
            detail: "the stream has no bars".to_string(),
        });
    };
    let Some(chart_first) = chart.open_time(0) else {
        return Ok(());
    };

    let mut first = first;
    while first > chart_first {
        let loaded = series.load_more_history();
        if loaded == 0 {
            return Err(TickbarsError::InsufficientHistory {
                granularity,
                detail: format!(
                    "history ends at {first}, after the chart's first bar at {chart_first}"
                ),
            });
        }
        tracing::debug!(%granularity, loaded, "loaded more history");
        first = series.open_time(0).unwrap_or(first);
    }
    Ok(())
}

fn source_bar<C, S>(chart: &C, source: Option<&S>, index: usize) -> Result<SourceBar>
where
    C: SourceSeries + ?Sized,
    S: SourceSeries + ?Sized,
{
    let bar = match source {
        Some(series) => series.get(index),
        None => chart.get(index),
    };
    Ok(bar
        .ok_or(PreconditionViolation::MissingBar(index))?
        .with_index(index))
}

/// First chart index below `end` whose bar opens at or after `time`, or `end`.
fn first_opening_at<C>(chart: &C, time: DateTime<Utc>, end: usize) -> usize
where
    C: SourceSeries + ?Sized,
{
    let (mut lo, mut hi) = (0, end);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if chart.open_time(mid).is_some_and(|t| t < time) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Last chart index, up to `chart_index`, that maps into the sealed `bar`.
///
/// A chart bar belongs to the sealed bar until the next source bar opens,
/// even when it opens after the sealed bar's last fold.
fn sealed_through<C, S>(
    chart: &C,
    source: Option<&S>,
    bar: &SyntheticBar,
    chart_index: usize,
) -> Option<usize>
where
    C: SourceSeries + ?Sized,
    S: SourceSeries + ?Sized,
{
    let Some(series) = source else {
        return Some(bar.source_index.min(chart_index));
    };
    match series.open_time(bar.source_index + 1) {
        Some(next) => first_opening_at(chart, next, chart_index + 1).checked_sub(1),
        None => Some(chart_index),
    }
}

/// Chart indices from the first one inside `bar` through `through`.
///
/// When the chart is folded directly its indices are the source indices.
/// Otherwise the first chart bar opening at or after the bar's start is used.
fn chart_span<C>(
    chart: &C,
    bar: &SyntheticBar,
    direct: bool,
    through: usize,
) -> Option<RangeInclusive<usize>>
where
    C: SourceSeries + ?Sized,
{
    let first = if direct {
        bar.first_source_index
    } else {
        first_opening_at(chart, bar.start_time, through + 1)
    };
    (first <= through).then(|| first..=through)
}
