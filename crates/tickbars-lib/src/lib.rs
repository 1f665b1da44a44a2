//! Custom tick chart engine.
//!
//! This is a facade crate that re-exports functionality from the tickbars
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use tickbars_lib::prelude::*;
//!
//! let chart = VecSeries::new("Tick5", load_bars()?);
//! let mut session: AggregationSession<VecSeries, VecSeries> = AggregationSession::start(
//!     SessionConfig::new(20),
//!     chart,
//!     GranularityRegistry::global(),
//!     &mut InMemoryMarket::new(),
//! )?;
//!
//! let mut outputs = OutputSeries::default();
//! let mut drawings: Vec<BarDrawing> = Vec::new();
//! session.process_pending(&mut drawings, &mut outputs)?;
//!
//! for bar in session.finish().as_slice() {
//!     println!("{} {} {} {} {}", bar.start_time, bar.open, bar.high, bar.low, bar.close);
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbars/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tickbars_types::*;

// Re-export the granularity catalog
pub use tickbars_catalog::{CatalogEntry, GranularityRegistry};

// Re-export aggregation
#[cfg(feature = "aggregate")]
pub use tickbars_aggregate::{
    AggregationSession, AggregationState, BarAccumulator, BarDrawing, BarHandle, BarIndex,
    BarPainter, BodyRect, ChartStep, Decision, DrawStyle, InMemoryMarket, LineStyle, MarketData,
    OhlcField, OutputFlags, OutputSeries, OutputSink, Projector, RenderSink, Resolver,
    SessionConfig, SourceSeries, Step, SyntheticBar, VecSeries, WickLine, covering_range,
    price_to_f64,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use tickbars_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat, SeriesRow,
    series_rows,
};

#[cfg(feature = "parquet")]
pub use tickbars_format::ParquetFormatter;

/// Prelude module for convenient imports.
///
/// ```
/// use tickbars_lib::prelude::*;
/// ```
pub mod prelude {
    pub use tickbars_types::{
        Color, ConfigurationError, Decimal, Granularity, GranularityCatalog,
        PreconditionViolation, Result, SourceBar, TickbarsError,
    };

    pub use tickbars_catalog::GranularityRegistry;

    #[cfg(feature = "aggregate")]
    pub use tickbars_aggregate::{
        AggregationSession, BarDrawing, ChartStep, Decision, DrawStyle, InMemoryMarket,
        MarketData, OhlcField, OutputFlags, OutputSeries, OutputSink, RenderSink, SessionConfig,
        SourceSeries, SyntheticBar, VecSeries,
    };

    #[cfg(feature = "format")]
    pub use tickbars_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat, series_rows};

    #[cfg(feature = "parquet")]
    pub use tickbars_format::ParquetFormatter;
}
