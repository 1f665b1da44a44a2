//! Tick granularity definitions.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::str::FromStr;

/// Size of the bars in a stream, counted in ticks.
///
/// The canonical name is `Tick{n}`; the bare name `tick` means one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Granularity(NonZeroU32);

impl Granularity {
    /// Tick-by-tick granularity.
    pub const TICK1: Self = Self(NonZeroU32::MIN);

    /// Creates a granularity of `ticks` ticks, or `None` for zero.
    #[must_use]
    pub const fn new(ticks: u32) -> Option<Self> {
        match NonZeroU32::new(ticks) {
            Some(ticks) => Some(Self(ticks)),
            None => None,
        }
    }

    /// Returns the number of ticks per bar.
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.0.get()
    }

    /// Returns true if a bar of `size` ticks is a whole number of these bars.
    #[must_use]
    pub const fn divides(&self, size: u32) -> bool {
        size % self.0.get() == 0
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tick{}", self.0)
    }
}

impl TryFrom<u32> for Granularity {
    type Error = GranularityParseError;

    fn try_from(ticks: u32) -> Result<Self, Self::Error> {
        Self::new(ticks).ok_or_else(|| GranularityParseError::ZeroTicks(ticks.to_string()))
    }
}

impl From<Granularity> for u32 {
    fn from(granularity: Granularity) -> Self {
        granularity.ticks()
    }
}

impl FromStr for Granularity {
    type Err = GranularityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "tick" {
            return Ok(Self::TICK1);
        }

        let digits = lower
            .strip_prefix("tick")
            .or_else(|| lower.strip_prefix('t'))
            .or_else(|| lower.strip_suffix('t'))
            .ok_or_else(|| GranularityParseError::NotTickBased(s.to_string()))?;

        let ticks: u32 = digits
            .parse()
            .map_err(|_| GranularityParseError::NotTickBased(s.to_string()))?;
        Self::new(ticks).ok_or_else(|| GranularityParseError::ZeroTicks(s.to_string()))
    }
}

/// Error returned when parsing an invalid granularity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GranularityParseError {
    /// The name does not describe a tick time frame.
    #[error("'{0}' is not a tick time frame, expected tick, Tick<n>, t<n> or <n>t")]
    NotTickBased(String),

    /// The name describes a zero-tick time frame.
    #[error("'{0}' has a tick count of zero")]
    ZeroTicks(String),
}

/// Enumerable set of granularities a market-data provider can supply.
pub trait GranularityCatalog {
    /// Returns every available granularity, in any order.
    fn available(&self) -> Vec<Granularity>;
}

impl GranularityCatalog for [Granularity] {
    fn available(&self) -> Vec<Granularity> {
        self.to_vec()
    }
}

impl GranularityCatalog for Vec<Granularity> {
    fn available(&self) -> Vec<Granularity> {
        self.clone()
    }
}

impl<C: GranularityCatalog + ?Sized> GranularityCatalog for &C {
    fn available(&self) -> Vec<Granularity> {
        (**self).available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_parse() {
        assert_eq!("tick".parse::<Granularity>().unwrap(), Granularity::TICK1);
        assert_eq!("Tick".parse::<Granularity>().unwrap(), Granularity::TICK1);
        assert_eq!("Tick10".parse::<Granularity>().unwrap().ticks(), 10);
        assert_eq!("t5".parse::<Granularity>().unwrap().ticks(), 5);
        assert_eq!("25T".parse::<Granularity>().unwrap().ticks(), 25);
    }

    #[test]
    fn test_granularity_not_tick_based() {
        assert!(matches!(
            "Minute5".parse::<Granularity>(),
            Err(GranularityParseError::NotTickBased(_))
        ));
        assert!(matches!(
            "h1".parse::<Granularity>(),
            Err(GranularityParseError::NotTickBased(_))
        ));
        assert!(matches!(
            "Tick0".parse::<Granularity>(),
            Err(GranularityParseError::ZeroTicks(_))
        ));
    }

    #[test]
    fn test_granularity_display_roundtrips_name() {
        let g = Granularity::new(15).unwrap();
        assert_eq!(g.to_string(), "Tick15");
        assert_eq!(g.to_string().parse::<Granularity>().unwrap(), g);
    }

    #[test]
    fn test_divides() {
        let g = Granularity::new(5).unwrap();
        assert!(g.divides(10));
        assert!(!g.divides(7));
        assert!(Granularity::TICK1.divides(7));
    }

    #[test]
    fn test_serde_as_tick_count() {
        let g = Granularity::new(20).unwrap();
        assert_eq!(serde_json::to_string(&g).unwrap(), "20");
        assert!(serde_json::from_str::<Granularity>("0").is_err());
    }
}
