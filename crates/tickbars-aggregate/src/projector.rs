//! Projection of synthetic bars onto the chart's index.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tickbars_types::SourceBar;

use crate::{SyntheticBar, price_to_f64};

/// One of the four output series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OhlcField {
    /// Open price.
    Open,
    /// High price.
    High,
    /// Low price.
    Low,
    /// Close price.
    Close,
}

impl OhlcField {
    /// Returns all fields in OHLC order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Open, Self::High, Self::Low, Self::Close]
    }

    /// Returns the field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for OhlcField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which output series are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFlags {
    /// Write the open series.
    pub open: bool,
    /// Write the high series.
    pub high: bool,
    /// Write the low series.
    pub low: bool,
    /// Write the close series.
    pub close: bool,
}

impl Default for OutputFlags {
    fn default() -> Self {
        Self::all()
    }
}

impl OutputFlags {
    /// Every series enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            open: true,
            high: true,
            low: true,
            close: true,
        }
    }

    /// Only `field` enabled.
    #[must_use]
    pub const fn only(field: OhlcField) -> Self {
        Self {
            open: matches!(field, OhlcField::Open),
            high: matches!(field, OhlcField::High),
            low: matches!(field, OhlcField::Low),
            close: matches!(field, OhlcField::Close),
        }
    }

    /// Returns true if `field` is written.
    #[must_use]
    pub const fn is_enabled(&self, field: OhlcField) -> bool {
        match field {
            OhlcField::Open => self.open,
            OhlcField::High => self.high,
            OhlcField::Low => self.low,
            OhlcField::Close => self.close,
        }
    }
}

/// Receiver of projected output values.
pub trait OutputSink {
    /// Sets `field` at `index` to `value`.
    fn set(&mut self, field: OhlcField, index: usize, value: f64);
}

/// Four growable output series; unset slots hold `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSeries {
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
}

impl OutputSeries {
    /// Creates series of `len` unset slots.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            open: vec![f64::NAN; len],
            high: vec![f64::NAN; len],
            low: vec![f64::NAN; len],
            close: vec![f64::NAN; len],
        }
    }

    /// Returns the raw values of one series.
    #[must_use]
    pub fn series(&self, field: OhlcField) -> &[f64] {
        match field {
            OhlcField::Open => &self.open,
            OhlcField::High => &self.high,
            OhlcField::Low => &self.low,
            OhlcField::Close => &self.close,
        }
    }

    /// Returns the value at `index`, or `None` if unset.
    #[must_use]
    pub fn get(&self, field: OhlcField, index: usize) -> Option<f64> {
        self.series(field)
            .get(index)
            .copied()
            .filter(|v| !v.is_nan())
    }

    /// Returns the length of the longest series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.open
            .len()
            .max(self.high.len())
            .max(self.low.len())
            .max(self.close.len())
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn series_mut(&mut self, field: OhlcField) -> &mut Vec<f64> {
        match field {
            OhlcField::Open => &mut self.open,
            OhlcField::High => &mut self.high,
            OhlcField::Low => &mut self.low,
            OhlcField::Close => &mut self.close,
        }
    }
}

impl OutputSink for OutputSeries {
    fn set(&mut self, field: OhlcField, index: usize, value: f64) {
        let series = self.series_mut(field);
        if series.len() <= index {
            series.resize(index + 1, f64::NAN);
        }
        series[index] = value;
    }
}

/// Writes bar values into the enabled output series.
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    flags: OutputFlags,
}

impl Projector {
    /// Creates a projector writing the series enabled in `flags`.
    #[must_use]
    pub const fn new(flags: OutputFlags) -> Self {
        Self { flags }
    }

    /// Writes `bar`'s values at every index of `target`.
    pub fn project<S: OutputSink + ?Sized>(
        &self,
        bar: &SyntheticBar,
        target: RangeInclusive<usize>,
        sink: &mut S,
    ) {
        self.write([bar.open, bar.high, bar.low, bar.close], target, sink);
    }

    /// Writes `bar`'s values at every index whose timestamp it covers.
    ///
    /// `target_times` must be sorted. Returns the projected index range, or
    /// `None` when no timestamp falls inside the bar.
    pub fn project_covering<S: OutputSink + ?Sized>(
        &self,
        bar: &SyntheticBar,
        target_times: &[DateTime<Utc>],
        sink: &mut S,
    ) -> Option<RangeInclusive<usize>> {
        let range = covering_range(bar, target_times)?;
        self.project(bar, range.clone(), sink);
        Some(range)
    }

    /// Writes a source bar's values unchanged at `index`.
    pub fn project_source<S: OutputSink + ?Sized>(
        &self,
        bar: &SourceBar,
        index: usize,
        sink: &mut S,
    ) {
        self.write([bar.open, bar.high, bar.low, bar.close], index..=index, sink);
    }

    fn write<S: OutputSink + ?Sized>(
        &self,
        ohlc: [Decimal; 4],
        target: RangeInclusive<usize>,
        sink: &mut S,
    ) {
        for (&field, value) in OhlcField::all().iter().zip(ohlc) {
            if !self.flags.is_enabled(field) {
                continue;
            }
            let value = price_to_f64(value);
            for index in target.clone() {
                sink.set(field, index, value);
            }
        }
    }
}

/// Returns the inclusive range of sorted `times` within `[bar.start_time, bar.end_time]`.
#[must_use]
pub fn covering_range(
    bar: &SyntheticBar,
    times: &[DateTime<Utc>],
) -> Option<RangeInclusive<usize>> {
    let first = times.partition_point(|t| *t < bar.start_time);
    let end = times.partition_point(|t| *t <= bar.end_time);
    (first < end).then(|| first..=end - 1)
}
