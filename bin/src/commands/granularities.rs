//! Granularities command implementation.
//!
//! This module lists the granularities of the embedded catalog.

use anyhow::Result;
use tickbars_lib::prelude::*;

/// List catalog granularities, optionally only the divisors of a size.
pub(crate) fn list(divides: Option<u32>) -> Result<()> {
    let registry = GranularityRegistry::global();

    let entries: Vec<_> = match divides {
        Some(size) => registry.divisors_of(size).collect(),
        None => registry.all().collect(),
    };

    if entries.is_empty() {
        println!("No granularities found.");
        return Ok(());
    }

    println!("{:<12} {:>8}", "NAME", "TICKS");
    println!("{}", "-".repeat(21));

    for entry in &entries {
        println!("{:<12} {:>8}", entry.name(), entry.granularity().ticks());
    }

    println!("\nTotal: {} granularities", entries.len());
    Ok(())
}
