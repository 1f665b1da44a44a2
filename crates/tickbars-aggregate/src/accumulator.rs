//! Streaming source-bar-to-synthetic-bar folding.

use chrono::{DateTime, Utc};
use tickbars_types::{PreconditionViolation, SourceBar};

use crate::{BarHandle, BarIndex, SyntheticBar};

/// Per-session aggregation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationState {
    /// Handle of the open synthetic bar.
    pub open_bar: Option<BarHandle>,
    /// Source bars folded into the open bar so far.
    pub bar_number: u32,
    /// Source bars per synthetic bar.
    pub ratio: u32,
    /// Index of the last processed source bar.
    pub last_index: Option<usize>,
    /// Timestamp of the last processed source bar.
    pub last_time: Option<DateTime<Utc>>,
}

/// Outcome of feeding one source bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The bar was already processed; nothing changed.
    Duplicate,
    /// The bar was folded into the open bar (opening it if there was none).
    Mutated(BarHandle),
    /// The previous bar was sealed and the source bar opened a new one.
    Sealed {
        /// The bar that was just sealed.
        sealed: BarHandle,
        /// The newly opened bar.
        opened: BarHandle,
    },
}

impl Step {
    /// Returns the bar that is open after this step, if it changed.
    #[must_use]
    pub const fn open_bar(&self) -> Option<BarHandle> {
        match self {
            Self::Duplicate => None,
            Self::Mutated(handle) | Self::Sealed { opened: handle, .. } => Some(*handle),
        }
    }
}

/// Folds a stream of source bars into synthetic bars of `ratio` source bars each.
///
/// A new bar opens at the previous bar's close (or the first source bar's
/// open) and every source bar's high, low and close are folded into it.
/// Once `ratio` source bars have been folded, the next source bar seals
/// the bar and opens the following one.
#[derive(Debug, Clone)]
pub struct BarAccumulator {
    state: AggregationState,
    index: BarIndex,
    current: Option<SyntheticBar>,
}

impl BarAccumulator {
    /// Creates an accumulator folding `ratio` source bars per synthetic bar.
    ///
    /// A ratio of zero is treated as one.
    #[must_use]
    pub fn new(ratio: u32) -> Self {
        Self {
            state: AggregationState {
                open_bar: None,
                bar_number: 0,
                ratio: ratio.max(1),
                last_index: None,
                last_time: None,
            },
            index: BarIndex::new(),
            current: None,
        }
    }

    /// Returns the aggregation state.
    #[must_use]
    pub const fn state(&self) -> &AggregationState {
        &self.state
    }

    /// Returns the source bars per synthetic bar.
    #[must_use]
    pub const fn ratio(&self) -> u32 {
        self.state.ratio
    }

    /// Returns the index of all synthetic bars built so far.
    #[must_use]
    pub const fn index(&self) -> &BarIndex {
        &self.index
    }

    /// Returns the open synthetic bar.
    #[must_use]
    pub const fn open_bar(&self) -> Option<&SyntheticBar> {
        self.current.as_ref()
    }

    /// Processes a source bar.
    ///
    /// Re-delivering the last processed index is a no-op returning
    /// [`Step::Duplicate`].
    ///
    /// # Errors
    ///
    /// Returns a [`PreconditionViolation`] for an index or timestamp older
    /// than the last processed bar, or for inconsistent OHLC values. The
    /// state is left unchanged.
    pub fn on_new_source_bar(&mut self, bar: &SourceBar) -> Result<Step, PreconditionViolation> {
        if let Some(last) = self.state.last_index {
            if bar.index == last {
                tracing::trace!(index = bar.index, "duplicate source bar ignored");
                return Ok(Step::Duplicate);
            }
            if bar.index < last {
                return Err(PreconditionViolation::IndexRegression {
                    index: bar.index,
                    last,
                });
            }
        }
        if let Some(last) = self.state.last_time
            && bar.timestamp < last
        {
            return Err(PreconditionViolation::TimeRegression {
                timestamp: bar.timestamp,
                last,
            });
        }
        bar.validate()?;

        let step = match self.current.take() {
            Some(mut current) if self.state.bar_number < self.state.ratio => {
                self.state.bar_number += 1;
                current.fold(bar);
                let handle = self.index.append_or_update(current);
                self.current = Some(current);
                Step::Mutated(handle)
            }
            previous => {
                let open = previous.map_or(bar.open, |p| p.close);
                let sealed = self.index.seal();
                if let (Some(handle), Some(previous)) = (sealed, previous) {
                    tracing::debug!(
                        bar = %handle,
                        start = %previous.start_time,
                        end = %previous.end_time,
                        open = %previous.open,
                        high = %previous.high,
                        low = %previous.low,
                        close = %previous.close,
                        "sealed synthetic bar"
                    );
                }

                let mut fresh = SyntheticBar::open_at(bar, open);
                fresh.fold(bar);
                self.state.bar_number = 1;
                let opened = self.index.append_or_update(fresh);
                self.current = Some(fresh);

                match sealed {
                    Some(sealed) => Step::Sealed { sealed, opened },
                    None => Step::Mutated(opened),
                }
            }
        };

        tracing::trace!(
            index = bar.index,
            bar_number = self.state.bar_number,
            "folded source bar"
        );
        self.state.open_bar = step.open_bar();
        self.state.last_index = Some(bar.index);
        self.state.last_time = Some(bar.timestamp);
        Ok(step)
    }

    /// Finishes aggregation, sealing the open bar and returning every bar.
    #[must_use]
    pub fn finish(mut self) -> BarIndex {
        self.index.seal();
        self.index
    }
}
