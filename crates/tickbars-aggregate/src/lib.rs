//! Tick bar aggregation engine for tickbars.
//!
//! This crate turns a stream of fine tick bars into larger synthetic bars:
//!
//! - [`Resolver`] - Picks the source stream and fold ratio for a requested size
//! - [`BarAccumulator`] - Streaming source-bar fold into [`SyntheticBar`]s
//! - [`BarIndex`] - Append-only bar arena with timestamp lookup
//! - [`Projector`] - Writes bar values onto chart indices
//! - [`BarPainter`] - Describes bars for a [`RenderSink`]
//! - [`AggregationSession`] - Ties the pieces together for one chart

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbars/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod accumulator;
mod bar;
mod index;
mod projector;
mod render;
mod resolver;
mod session;
mod source;

pub use accumulator::{AggregationState, BarAccumulator, Step};
pub use bar::{SyntheticBar, price_to_f64};
pub use index::{BarHandle, BarIndex};
pub use projector::{OhlcField, OutputFlags, OutputSeries, OutputSink, Projector, covering_range};
pub use render::{
    BarDrawing, BarPainter, BodyRect, DrawStyle, LineStyle, OBJECT_NAME_PREFIX, RenderSink,
    WickLine,
};
pub use resolver::{Decision, Resolver};
pub use session::{AggregationSession, ChartStep, SessionConfig};
pub use source::{InMemoryMarket, MarketData, SourceSeries, VecSeries};
