//! Synthetic OHLC bar.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tickbars_types::SourceBar;

/// One aggregated output bar built from a run of source bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticBar {
    /// Timestamp of the first folded source bar.
    pub start_time: DateTime<Utc>,
    /// Timestamp of the last folded source bar.
    pub end_time: DateTime<Utc>,
    /// Stream position of the first folded source bar.
    pub first_source_index: usize,
    /// Stream position of the last folded source bar.
    pub source_index: usize,
    /// Number of source bars folded in.
    pub fold_count: u32,
    /// Opening price (previous bar's close, or the first source open).
    pub open: Decimal,
    /// Highest price.
    pub high: Decimal,
    /// Lowest price.
    pub low: Decimal,
    /// Closing price (last source close).
    pub close: Decimal,
}

impl SyntheticBar {
    /// Opens an empty bar at `source`, priced flat at `open`.
    pub(crate) const fn open_at(source: &SourceBar, open: Decimal) -> Self {
        Self {
            start_time: source.timestamp,
            end_time: source.timestamp,
            first_source_index: source.index,
            source_index: source.index,
            fold_count: 0,
            open,
            high: open,
            low: open,
            close: open,
        }
    }

    /// Folds a source bar into this bar.
    pub(crate) fn fold(&mut self, source: &SourceBar) {
        self.close = source.close;
        self.high = self.high.max(source.high);
        self.low = self.low.min(source.low);
        self.end_time = source.timestamp;
        self.source_index = source.index;
        self.fold_count += 1;
    }

    /// Returns the midpoint between start and end time.
    #[must_use]
    pub fn center_time(&self) -> DateTime<Utc> {
        self.start_time + (self.end_time - self.start_time) / 2
    }

    /// Returns true if this is a bearish bar (drawn in bearish colors).
    #[must_use]
    pub fn is_bearish(&self) -> bool {
        self.open > self.close
    }
}

/// Converts a fixed-point price to the floating representation of output sinks.
#[must_use]
pub fn price_to_f64(price: Decimal) -> f64 {
    price.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn source(second: u32, index: usize, ohlc: [&str; 4]) -> SourceBar {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, second).unwrap();
        SourceBar::new(timestamp, index, d(ohlc[0]), d(ohlc[1]), d(ohlc[2]), d(ohlc[3]))
    }

    #[test]
    fn test_open_and_fold() {
        let first = source(0, 4, ["1.1000", "1.1050", "1.0980", "1.1020"]);
        let mut bar = SyntheticBar::open_at(&first, first.open);
        assert_eq!(bar.high, bar.open);
        assert_eq!(bar.fold_count, 0);

        bar.fold(&first);
        bar.fold(&source(30, 5, ["1.1020", "1.1070", "1.1010", "1.1060"]));

        assert_eq!(bar.open, d("1.1000"));
        assert_eq!(bar.high, d("1.1070"));
        assert_eq!(bar.low, d("1.0980"));
        assert_eq!(bar.close, d("1.1060"));
        assert_eq!(bar.first_source_index, 4);
        assert_eq!(bar.source_index, 5);
        assert_eq!(bar.fold_count, 2);
        assert_eq!(bar.end_time - bar.start_time, TimeDelta::seconds(30));
        assert_eq!(bar.center_time(), bar.start_time + TimeDelta::seconds(15));
    }

    #[test]
    fn test_bearish_only_when_open_above_close() {
        let first = source(0, 0, ["2", "4", "1", "3"]);
        let mut bar = SyntheticBar::open_at(&first, first.open);
        bar.fold(&first);
        assert!(!bar.is_bearish());

        bar.fold(&source(1, 1, ["3", "3", "1", "2"]));
        assert!(!bar.is_bearish());

        bar.fold(&source(2, 2, ["2", "2", "1", "1"]));
        assert!(bar.is_bearish());
    }

    #[test]
    fn test_price_to_f64() {
        assert!((price_to_f64(d("1.10005")) - 1.10005).abs() < 1e-12);
    }
}
