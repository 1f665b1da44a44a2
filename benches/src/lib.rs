//! Synthetic data for tickbars benchmarks.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tickbars_lib::{Decimal, SourceBar, VecSeries};

/// Generates `count` valid bars `step_ms` milliseconds apart.
///
/// Prices follow a deterministic zig-zag walk around 1.1000 with four
/// decimal places, so runs are reproducible.
#[must_use]
pub fn generate_bars(count: usize, step_ms: i64) -> Vec<SourceBar> {
    let start: DateTime<Utc> = Utc
        .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH);
    let mut price: i64 = 11_000;

    (0..count)
        .map(|i| {
            let step = ((i as i64 * 7919) % 9) - 4;
            let open = price;
            let close = open + step;
            let high = open.max(close) + (i as i64 % 3);
            let low = open.min(close) - (i as i64 % 2);
            price = close;

            SourceBar::new(
                start + TimeDelta::milliseconds(i as i64 * step_ms),
                i,
                Decimal::new(open, 4),
                Decimal::new(high, 4),
                Decimal::new(low, 4),
                Decimal::new(close, 4),
            )
        })
        .collect()
}

/// Builds an in-memory series of generated bars.
#[must_use]
pub fn generate_series(timeframe: &str, count: usize, step_ms: i64) -> VecSeries {
    VecSeries::new(timeframe, generate_bars(count, step_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_bars_are_valid() {
        let bars = generate_bars(500, 250);
        assert_eq!(bars.len(), 500);
        for pair in bars.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        assert!(bars.iter().all(|b| b.validate().is_ok()));
    }
}
