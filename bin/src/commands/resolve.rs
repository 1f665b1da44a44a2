//! Resolve command implementation.
//!
//! This module shows which stream and fold ratio a bar size resolves to.

use anyhow::{Context, Result, anyhow};
use tickbars_lib::Resolver;
use tickbars_lib::prelude::*;

/// Resolve `size` against a chart time frame and print the decision.
pub(crate) fn resolve(size: u32, current: &str, catalog: Option<&[u32]>) -> Result<()> {
    let decision = decide(size, current, catalog)?;
    let current: Granularity = current.parse()?;

    println!("{:<12} {}", "SIZE", size);
    println!("{:<12} {}", "CHART", current);
    println!("{:<12} {}", "DECISION", decision);
    println!("{:<12} {}", "SOURCE", decision.source(current));
    println!("{:<12} {}", "RATIO", decision.ratio());
    if !decision.is_exact() {
        println!(
            "\nWarning: bars will hold {} ticks instead of {size}",
            decision.ratio() * decision.source(current).ticks()
        );
    }
    Ok(())
}

fn decide(size: u32, current: &str, catalog: Option<&[u32]>) -> Result<Decision> {
    let current: Granularity = current
        .parse()
        .with_context(|| format!("Invalid chart time frame '{current}'"))?;
    if current.ticks() > size {
        return Err(anyhow!(TickbarsError::SizeMismatch {
            desired: size,
            current,
        }));
    }

    let decision = match catalog {
        Some(ticks) => {
            let granularities = ticks
                .iter()
                .map(|&t| Granularity::new(t).ok_or_else(|| anyhow!("Granularity must be positive")))
                .collect::<Result<Vec<_>>>()?;
            Resolver::new(granularities).resolve(size, current)?
        }
        None => Resolver::new(GranularityRegistry::global()).resolve(size, current)?,
    };
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide() {
        assert_eq!(
            decide(10, "Tick5", None).unwrap(),
            Decision::AggregateFromCurrent { ratio: 2 }
        );
        assert_eq!(decide(10, "tick10", None).unwrap(), Decision::UseDirectly);

        let decision = decide(7, "Tick4", Some(&[2, 4])).unwrap();
        assert!(!decision.is_exact());
        assert_eq!(decision.ratio(), 3);
    }

    #[test]
    fn test_decide_errors() {
        assert!(decide(7, "Tick10", None).is_err());
        assert!(decide(7, "Minute1", None).is_err());
        assert!(decide(7, "Tick1", Some(&[0])).is_err());
        assert!(decide(0, "Tick1", None).is_err());
    }
}
