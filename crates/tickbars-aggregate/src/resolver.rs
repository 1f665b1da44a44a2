//! Source granularity resolution.

use tickbars_types::{ConfigurationError, Granularity, GranularityCatalog};

/// How a requested bar size will be fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The current stream already has the requested size; no aggregation.
    UseDirectly,
    /// The requested size is a whole multiple of the current stream.
    AggregateFromCurrent {
        /// Current-stream bars per synthetic bar.
        ratio: u32,
    },
    /// Another stream must be fetched and folded.
    RequestFinerStream {
        /// Granularity to fetch.
        granularity: Granularity,
        /// Fetched bars per synthetic bar.
        ratio: u32,
        /// False when the ratio was truncated (size not a multiple of `granularity`).
        exact: bool,
    },
}

impl Decision {
    /// Returns the number of source bars folded into one synthetic bar.
    #[must_use]
    pub const fn ratio(&self) -> u32 {
        match self {
            Self::UseDirectly => 1,
            Self::AggregateFromCurrent { ratio } | Self::RequestFinerStream { ratio, .. } => *ratio,
        }
    }

    /// Returns the granularity of the stream that gets consumed.
    #[must_use]
    pub const fn source(&self, current: Granularity) -> Granularity {
        match self {
            Self::UseDirectly | Self::AggregateFromCurrent { .. } => current,
            Self::RequestFinerStream { granularity, .. } => *granularity,
        }
    }

    /// Returns false only for the truncating fallback.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        match self {
            Self::UseDirectly | Self::AggregateFromCurrent { .. } => true,
            Self::RequestFinerStream { exact, .. } => *exact,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UseDirectly => write!(f, "use directly"),
            Self::AggregateFromCurrent { ratio } => {
                write!(f, "aggregate from current stream (ratio {ratio})")
            }
            Self::RequestFinerStream {
                granularity,
                ratio,
                exact,
            } => {
                write!(f, "request {granularity} stream (ratio {ratio}")?;
                if !exact {
                    write!(f, ", approximate")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Decides which source stream feeds a requested bar size.
#[derive(Debug, Clone)]
pub struct Resolver<C> {
    catalog: C,
}

impl<C: GranularityCatalog> Resolver<C> {
    /// Creates a resolver over a granularity catalog.
    #[must_use]
    pub const fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Resolves how to build bars of `desired_ticks` from a `current` stream.
    ///
    /// In priority order: an exact match is used directly; a whole multiple
    /// of `current` is aggregated from it; otherwise the largest catalog
    /// granularity that divides `desired_ticks` is requested. When no
    /// catalog entry divides it, the finest entry not larger than
    /// `desired_ticks` is requested with a truncated ratio and the decision
    /// is marked inexact.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSize`] for a zero size and
    /// [`ConfigurationError::NoGranularity`] when the catalog offers nothing
    /// not larger than `desired_ticks`.
    pub fn resolve(
        &self,
        desired_ticks: u32,
        current: Granularity,
    ) -> Result<Decision, ConfigurationError> {
        if desired_ticks == 0 {
            return Err(ConfigurationError::InvalidSize(desired_ticks));
        }

        if current.ticks() == desired_ticks {
            return Ok(Decision::UseDirectly);
        }

        if current.divides(desired_ticks) {
            return Ok(Decision::AggregateFromCurrent {
                ratio: desired_ticks / current.ticks(),
            });
        }

        let candidates: Vec<Granularity> = self
            .catalog
            .available()
            .into_iter()
            .filter(|g| g.ticks() <= desired_ticks)
            .collect();

        if let Some(&granularity) = candidates
            .iter()
            .filter(|g| g.divides(desired_ticks))
            .max()
        {
            return Ok(Decision::RequestFinerStream {
                granularity,
                ratio: desired_ticks / granularity.ticks(),
                exact: true,
            });
        }

        let granularity = candidates
            .into_iter()
            .min()
            .ok_or(ConfigurationError::NoGranularity {
                desired: desired_ticks,
            })?;
        let ratio = desired_ticks / granularity.ticks();
        tracing::warn!(
            desired_ticks,
            %granularity,
            ratio,
            "no granularity divides the requested size, bars will hold {} ticks",
            ratio * granularity.ticks()
        );

        Ok(Decision::RequestFinerStream {
            granularity,
            ratio,
            exact: false,
        })
    }
}
