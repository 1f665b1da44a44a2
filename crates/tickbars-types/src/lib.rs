//! Core types for the tickbars custom tick chart engine.
//!
//! This crate provides the fundamental data structures used throughout tickbars:
//!
//! - [`SourceBar`] - One OHLC record of an underlying bar stream
//! - [`Granularity`] - Tick-count size of the bars in a stream
//! - [`GranularityCatalog`] - Enumerable set of available granularities
//! - [`Color`] - ARGB color used in render descriptions
//! - [`TickbarsError`] - Session and I/O errors

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbars/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod color;
mod error;
mod granularity;
mod source_bar;

pub use color::{Color, ColorParseError};
pub use error::{ConfigurationError, PreconditionViolation, Result, TickbarsError};
pub use granularity::{Granularity, GranularityCatalog, GranularityParseError};
pub use source_bar::SourceBar;

/// Fixed-point price type used for every OHLC value.
pub use rust_decimal::Decimal;
