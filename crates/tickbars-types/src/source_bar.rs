//! Source bar representation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PreconditionViolation;

/// One OHLC record of an underlying bar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBar {
    /// Open time of the bar (UTC).
    pub timestamp: DateTime<Utc>,
    /// Position of the bar in its stream.
    pub index: usize,
    /// Opening price.
    pub open: Decimal,
    /// Highest price.
    pub high: Decimal,
    /// Lowest price.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
}

impl SourceBar {
    /// Creates a new source bar.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        index: usize,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            timestamp,
            index,
            open,
            high,
            low,
            close,
        }
    }

    /// Returns a copy of this bar at a different stream position.
    #[must_use]
    pub const fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Checks the OHLC relations `low <= open, close <= high`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionViolation::InvalidBar`] naming the failed relation.
    pub fn validate(&self) -> Result<(), PreconditionViolation> {
        let reason = if self.high < self.low {
            "high is below low"
        } else if self.open > self.high || self.close > self.high {
            "high is below open or close"
        } else if self.open < self.low || self.close < self.low {
            "low is above open or close"
        } else {
            return Ok(());
        };

        Err(PreconditionViolation::InvalidBar {
            index: self.index,
            reason,
        })
    }
}
