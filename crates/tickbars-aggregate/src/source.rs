//! Source bar streams and the market data that supplies them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tickbars_types::{Granularity, Result, SourceBar};

/// A chronologically ordered bar stream owned by the host.
pub trait SourceSeries {
    /// Time frame name of the stream (e.g. `Tick5`).
    fn timeframe(&self) -> &str;

    /// Number of bars currently loaded.
    fn len(&self) -> usize;

    /// Returns true if no bar is loaded.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bar at `index`.
    fn get(&self, index: usize) -> Option<SourceBar>;

    /// Returns the open time of the bar at `index`.
    fn open_time(&self, index: usize) -> Option<DateTime<Utc>> {
        self.get(index).map(|bar| bar.timestamp)
    }

    /// Returns the index of the latest bar whose open time is not after `timestamp`.
    fn index_by_time(&self, timestamp: DateTime<Utc>) -> Option<usize>;

    /// Loads older bars in front of the stream, returning how many were added.
    ///
    /// Zero means the history is exhausted. Loaded bars shift the positions
    /// of every existing bar.
    fn load_more_history(&mut self) -> usize;
}

impl<S: SourceSeries + ?Sized> SourceSeries for Box<S> {
    fn timeframe(&self) -> &str {
        (**self).timeframe()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<SourceBar> {
        (**self).get(index)
    }

    fn open_time(&self, index: usize) -> Option<DateTime<Utc>> {
        (**self).open_time(index)
    }

    fn index_by_time(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        (**self).index_by_time(timestamp)
    }

    fn load_more_history(&mut self) -> usize {
        (**self).load_more_history()
    }
}

/// Supplier of bar streams by granularity.
pub trait MarketData {
    /// Stream type handed out.
    type Series: SourceSeries;

    /// Returns the stream of `granularity` bars for the session's symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be obtained.
    fn series(&mut self, granularity: Granularity) -> Result<Self::Series>;
}

/// In-memory bar stream.
///
/// Bars handed in are re-indexed to their position. Older bars can be held
/// back and revealed in chunks through [`SourceSeries::load_more_history`].
#[derive(Debug, Clone, Default)]
pub struct VecSeries {
    timeframe: String,
    bars: Vec<SourceBar>,
    history: Vec<SourceBar>,
    chunk: usize,
}

impl VecSeries {
    /// Creates a stream of `bars`, which must be in chronological order.
    #[must_use]
    pub fn new(timeframe: impl Into<String>, bars: impl IntoIterator<Item = SourceBar>) -> Self {
        let mut series = Self {
            timeframe: timeframe.into(),
            bars: bars.into_iter().collect(),
            history: Vec::new(),
            chunk: 0,
        };
        series.reindex();
        series
    }

    /// Holds back `older` bars, revealed `chunk` bars at a time (newest first).
    #[must_use]
    pub fn with_history(mut self, older: Vec<SourceBar>, chunk: usize) -> Self {
        self.history = older;
        self.chunk = chunk.max(1);
        self
    }

    /// Appends a bar at the end of the stream, returning its index.
    pub fn push(&mut self, bar: SourceBar) -> usize {
        let index = self.bars.len();
        self.bars.push(bar.with_index(index));
        index
    }

    /// Returns the loaded bars.
    #[must_use]
    pub fn bars(&self) -> &[SourceBar] {
        &self.bars
    }

    /// Returns the open time of every loaded bar.
    #[must_use]
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|bar| bar.timestamp).collect()
    }

    fn reindex(&mut self) {
        for (index, bar) in self.bars.iter_mut().enumerate() {
            bar.index = index;
        }
    }
}

impl SourceSeries for VecSeries {
    fn timeframe(&self) -> &str {
        &self.timeframe
    }

    fn len(&self) -> usize {
        self.bars.len()
    }

    fn get(&self, index: usize) -> Option<SourceBar> {
        self.bars.get(index).copied()
    }

    fn index_by_time(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.bars
            .partition_point(|bar| bar.timestamp <= timestamp)
            .checked_sub(1)
    }

    fn load_more_history(&mut self) -> usize {
        let take = self.chunk.min(self.history.len());
        if take == 0 {
            return 0;
        }
        let older = self.history.split_off(self.history.len() - take);
        self.bars.splice(0..0, older);
        self.reindex();
        take
    }
}

/// In-memory market data keyed by granularity.
///
/// Unknown granularities yield an empty stream.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarket {
    streams: HashMap<Granularity, VecSeries>,
}

impl InMemoryMarket {
    /// Creates an empty market.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the stream for `granularity`.
    #[must_use]
    pub fn with_series(mut self, granularity: Granularity, series: VecSeries) -> Self {
        self.insert(granularity, series);
        self
    }

    /// Registers or replaces the stream for `granularity`.
    pub fn insert(&mut self, granularity: Granularity, series: VecSeries) {
        self.streams.insert(granularity, series);
    }

    /// Returns the granularities that have a stream.
    #[must_use]
    pub fn granularities(&self) -> Vec<Granularity> {
        let mut available: Vec<_> = self.streams.keys().copied().collect();
        available.sort_unstable();
        available
    }
}

impl MarketData for InMemoryMarket {
    type Series = VecSeries;

    fn series(&mut self, granularity: Granularity) -> Result<VecSeries> {
        Ok(self
            .streams
            .get(&granularity)
            .cloned()
            .unwrap_or_else(|| VecSeries::new(granularity.to_string(), [])))
    }
}
