//! Granularity catalog for the tickbars custom tick chart engine.
//!
//! This crate provides the statically declared table of tick time frames a
//! host platform offers (`Tick`, `Tick2`, ... `Tick1000`). The aggregation
//! resolver queries it through the [`GranularityCatalog`] trait.
//!
//! # Example
//!
//! ```
//! use tickbars_catalog::GranularityRegistry;
//!
//! let registry = GranularityRegistry::global();
//!
//! // Lookup by name
//! if let Some(entry) = registry.get("Tick10") {
//!     println!("{}: {} ticks", entry.name(), entry.granularity().ticks());
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tickbars/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tickbars_types::{Granularity, GranularityCatalog};

/// The granularity table embedded at compile time.
const GRANULARITIES_JSON: &str = include_str!("../data/granularities.json");

/// Global registry instance.
static REGISTRY: OnceLock<GranularityRegistry> = OnceLock::new();

/// One catalog entry: a time frame name and its tick size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    name: String,
    #[serde(rename = "ticks")]
    granularity: Granularity,
}

impl CatalogEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(name: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            name: name.into(),
            granularity,
        }
    }

    /// Returns the host's name for this time frame.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tick size of this time frame.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }
}

/// Registry of available tick granularities, ordered finest first.
#[derive(Debug, Clone)]
pub struct GranularityRegistry {
    entries: Vec<CatalogEntry>,
}

impl GranularityRegistry {
    /// Returns the global registry.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::load)
    }

    /// Loads the registry from the embedded JSON data.
    fn load() -> Self {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(GRANULARITIES_JSON).expect("Invalid granularities.json");
        Self::from_entries(entries)
    }

    /// Builds a registry from explicit entries.
    ///
    /// Entries are sorted finest first; duplicate tick sizes keep the first name.
    #[must_use]
    pub fn from_entries(mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by_key(CatalogEntry::granularity);
        entries.dedup_by_key(|e| e.granularity);
        Self { entries }
    }

    /// Looks up an entry by name (case-insensitive, `tick` means `Tick1`).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
        {
            return Some(entry);
        }
        let granularity = name.parse::<Granularity>().ok()?;
        self.by_granularity(granularity)
    }

    /// Looks up the entry with the given tick size.
    #[must_use]
    pub fn by_granularity(&self, granularity: Granularity) -> Option<&CatalogEntry> {
        self.entries
            .binary_search_by_key(&granularity, CatalogEntry::granularity)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Returns all entries, finest first.
    pub fn all(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Returns the finest available granularity.
    #[must_use]
    pub fn finest(&self) -> Option<Granularity> {
        self.entries.first().map(CatalogEntry::granularity)
    }

    /// Returns the entries that fold exactly into a bar of `size` ticks.
    pub fn divisors_of(&self, size: u32) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |e| e.granularity.ticks() <= size && e.granularity.divides(size))
    }

    /// Returns the total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GranularityCatalog for GranularityRegistry {
    fn available(&self) -> Vec<Granularity> {
        self.entries.iter().map(CatalogEntry::granularity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(ticks: u32) -> Granularity {
        Granularity::new(ticks).unwrap()
    }

    #[test]
    fn test_global_registry_loads() {
        let registry = GranularityRegistry::global();
        assert!(!registry.is_empty());
        assert_eq!(registry.finest(), Some(Granularity::TICK1));
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = GranularityRegistry::global();

        assert_eq!(registry.get("tick").unwrap().granularity(), Granularity::TICK1);
        assert_eq!(registry.get("Tick1").unwrap().name(), "Tick");
        assert_eq!(registry.get("TICK10").unwrap().granularity(), g(10));
        assert!(registry.get("Tick11").is_none());
        assert!(registry.get("m5").is_none());
    }

    #[test]
    fn test_entries_sorted_finest_first() {
        let registry = GranularityRegistry::global();
        let ticks: Vec<u32> = registry.all().map(|e| e.granularity().ticks()).collect();
        let mut sorted = ticks.clone();
        sorted.sort_unstable();
        assert_eq!(ticks, sorted);
    }

    #[test]
    fn test_divisors_of() {
        let registry = GranularityRegistry::from_entries(vec![
            CatalogEntry::new("Tick10", g(10)),
            CatalogEntry::new("Tick", g(1)),
            CatalogEntry::new("Tick3", g(3)),
            CatalogEntry::new("Tick5", g(5)),
        ]);

        let divisors: Vec<u32> = registry
            .divisors_of(15)
            .map(|e| e.granularity().ticks())
            .collect();
        assert_eq!(divisors, vec![1, 3, 5]);
        assert_eq!(registry.available(), vec![g(1), g(3), g(5), g(10)]);
    }
}
