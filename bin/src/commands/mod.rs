//! CLI command implementations.

pub(crate) mod aggregate;
pub(crate) mod granularities;
pub(crate) mod resolve;
