//! Error types for tickbars.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::Granularity;

/// Result type alias for tickbars operations.
pub type Result<T> = std::result::Result<T, TickbarsError>;

/// Errors that can occur while starting or driving an aggregation session.
#[derive(Error, Debug)]
pub enum TickbarsError {
    /// The session cannot be configured.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The requested bar size is smaller than the chart's granularity.
    #[error(
        "Size mismatch: chart granularity {current} is larger than the requested size of {desired} ticks"
    )]
    SizeMismatch {
        /// Requested synthetic bar size in ticks.
        desired: u32,
        /// Granularity of the chart the session is attached to.
        current: Granularity,
    },

    /// The source stream cannot supply enough history to align the first bar.
    #[error("Insufficient history for {granularity}: {detail}")]
    InsufficientHistory {
        /// Granularity of the source stream that fell short.
        granularity: Granularity,
        /// What was missing.
        detail: String,
    },

    /// A caller contract was violated while feeding source bars.
    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),
}

/// Reasons a session cannot be configured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The chart time frame is not a tick time frame.
    #[error("current chart is not a tick chart ({0}), please switch to a tick chart")]
    NotTickBased(String),

    /// The requested bar size is not a positive tick count.
    #[error("bar size must be a positive number of ticks, got {0}")]
    InvalidSize(u32),

    /// No granularity in the catalog can feed the requested size.
    #[error("couldn't find a granularity for a size of {desired} ticks")]
    NoGranularity {
        /// Requested synthetic bar size in ticks.
        desired: u32,
    },
}

/// Caller contract violations detected while folding source bars.
///
/// These never mutate the aggregation state; the offending bar is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    /// A source index lower than one already processed was delivered.
    #[error("source index {index} precedes the last processed index {last}")]
    IndexRegression {
        /// Delivered index.
        index: usize,
        /// Last processed index.
        last: usize,
    },

    /// A source bar older than the last folded bar was delivered.
    #[error("source bar at {timestamp} precedes the last folded bar at {last}")]
    TimeRegression {
        /// Delivered timestamp.
        timestamp: DateTime<Utc>,
        /// Timestamp of the last folded bar.
        last: DateTime<Utc>,
    },

    /// The source bar's OHLC values are inconsistent.
    #[error("invalid source bar at index {index}: {reason}")]
    InvalidBar {
        /// Index of the bar.
        index: usize,
        /// Which relation failed.
        reason: &'static str,
    },

    /// The source stream has no bar at the requested position.
    #[error("source stream has no bar at index {0}")]
    MissingBar(usize),
}
