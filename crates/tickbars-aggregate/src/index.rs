//! Append-only arena of synthetic bars.

use chrono::{DateTime, Utc};
use derive_more::{Display, Into};

use crate::SyntheticBar;

/// Stable handle to a slot in a [`BarIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("#{_0}")]
pub struct BarHandle(usize);

impl BarHandle {
    /// Returns the slot position (chronological bar number).
    #[must_use]
    pub const fn position(self) -> usize {
        self.0
    }
}

/// Chronologically ordered synthetic bars.
///
/// Slots are never reordered or removed. Only the last slot can be open;
/// every other slot is sealed and its values never change.
#[derive(Debug, Clone, Default)]
pub struct BarIndex {
    bars: Vec<SyntheticBar>,
    open: bool,
}

impl BarIndex {
    /// Creates an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bars: Vec::new(),
            open: false,
        }
    }

    /// Writes the open bar back, or appends `bar` as a new open bar.
    ///
    /// The open slot is updated in place when it holds the same bucket
    /// (same first source index). Otherwise the open slot is sealed and
    /// `bar` is appended.
    pub fn append_or_update(&mut self, bar: SyntheticBar) -> BarHandle {
        if self.open
            && let Some(last) = self.bars.last_mut()
            && last.first_source_index == bar.first_source_index
        {
            *last = bar;
            return BarHandle(self.bars.len() - 1);
        }

        debug_assert!(
            self.bars.last().is_none_or(|last| last.start_time <= bar.start_time),
            "synthetic bars must be appended in chronological order"
        );
        self.bars.push(bar);
        self.open = true;
        BarHandle(self.bars.len() - 1)
    }

    /// Seals the open bar, returning its handle.
    pub fn seal(&mut self) -> Option<BarHandle> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(BarHandle(self.bars.len() - 1))
    }

    /// Returns the handle of the bar whose `[start_time, end_time]` contains `timestamp`.
    ///
    /// Bars that share a boundary timestamp resolve to the later bar.
    #[must_use]
    pub fn find_covering(&self, timestamp: DateTime<Utc>) -> Option<BarHandle> {
        let after = self.bars.partition_point(|b| b.start_time <= timestamp);
        let candidate = after.checked_sub(1)?;
        (self.bars[candidate].end_time >= timestamp).then_some(BarHandle(candidate))
    }

    /// Returns the handle of the bar that folded the source bar at `source_index`.
    #[must_use]
    pub fn find_by_source_index(&self, source_index: usize) -> Option<BarHandle> {
        let after = self
            .bars
            .partition_point(|b| b.first_source_index <= source_index);
        let candidate = after.checked_sub(1)?;
        (self.bars[candidate].source_index >= source_index).then_some(BarHandle(candidate))
    }

    /// Returns the bar behind a handle.
    #[must_use]
    pub fn get(&self, handle: BarHandle) -> Option<&SyntheticBar> {
        self.bars.get(handle.0)
    }

    /// Returns true if the handle refers to a sealed bar.
    #[must_use]
    pub fn is_sealed(&self, handle: BarHandle) -> bool {
        handle.0 < self.sealed_len()
    }

    /// Returns the open bar, if any.
    #[must_use]
    pub fn open_bar(&self) -> Option<(BarHandle, &SyntheticBar)> {
        if !self.open {
            return None;
        }
        self.bars
            .last()
            .map(|bar| (BarHandle(self.bars.len() - 1), bar))
    }

    /// Returns the sealed bars, oldest first.
    #[must_use]
    pub fn sealed(&self) -> &[SyntheticBar] {
        &self.bars[..self.sealed_len()]
    }

    /// Returns every bar, oldest first, including the open one.
    #[must_use]
    pub fn as_slice(&self) -> &[SyntheticBar] {
        &self.bars
    }

    /// Iterates over all bars with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (BarHandle, &SyntheticBar)> {
        self.bars.iter().enumerate().map(|(i, b)| (BarHandle(i), b))
    }

    /// Returns the number of bars, including the open one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Returns true if no bar has been opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    fn sealed_len(&self) -> usize {
        if self.open {
            self.bars.len() - 1
        } else {
            self.bars.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use rust_decimal::Decimal;
    use tickbars_types::SourceBar;

    fn at(second: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::seconds(second)
    }

    /// Builds a bar spanning source indices `first..=last`, one second apart.
    fn bar(first: usize, last: usize) -> SyntheticBar {
        let price = Decimal::ONE;
        let source = |i: usize| SourceBar::new(at(i as i64), i, price, price, price, price);
        let mut bar = SyntheticBar::open_at(&source(first), price);
        for i in first..=last {
            bar.fold(&source(i));
        }
        bar
    }

    #[test]
    fn test_append_or_update_keeps_bucket_identity() {
        let mut index = BarIndex::new();

        let h1 = index.append_or_update(bar(0, 0));
        let h2 = index.append_or_update(bar(0, 2));
        assert_eq!(h1, h2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(h1).unwrap().source_index, 2);
        assert!(!index.is_sealed(h1));

        let h3 = index.append_or_update(bar(3, 3));
        assert_ne!(h1, h3);
        assert_eq!(index.len(), 2);
        assert!(index.is_sealed(h1));
        assert_eq!(index.sealed().len(), 1);
        assert_eq!(index.open_bar().unwrap().0, h3);
    }

    #[test]
    fn test_seal() {
        let mut index = BarIndex::new();
        assert!(index.seal().is_none());

        let h = index.append_or_update(bar(0, 1));
        assert_eq!(index.seal(), Some(h));
        assert!(index.is_sealed(h));
        assert!(index.open_bar().is_none());
        assert_eq!(index.sealed().len(), 1);

        // A sealed bucket is never rewritten, even with the same identity.
        let again = index.append_or_update(bar(0, 1));
        assert_ne!(again, h);
    }

    #[test]
    fn test_find_covering() {
        let mut index = BarIndex::new();
        let a = index.append_or_update(bar(0, 2));
        let b = index.append_or_update(bar(3, 5));
        let c = index.append_or_update(bar(8, 9));

        assert_eq!(index.find_covering(at(-1)), None);
        assert_eq!(index.find_covering(at(0)), Some(a));
        assert_eq!(index.find_covering(at(2)), Some(a));
        assert_eq!(index.find_covering(at(3)), Some(b));
        assert_eq!(index.find_covering(at(5)), Some(b));
        // Gap between buckets.
        assert_eq!(index.find_covering(at(6)), None);
        assert_eq!(index.find_covering(at(9)), Some(c));
        assert_eq!(index.find_covering(at(10)), None);
    }

    #[test]
    fn test_find_covering_is_read_idempotent() {
        let mut index = BarIndex::new();
        index.append_or_update(bar(0, 4));
        index.append_or_update(bar(5, 9));

        let first = index.find_covering(at(7));
        for _ in 0..10 {
            assert_eq!(index.find_covering(at(7)), first);
        }
        assert_eq!(first.map(BarHandle::position), Some(1));
    }

    #[test]
    fn test_find_by_source_index() {
        let mut index = BarIndex::new();
        let a = index.append_or_update(bar(0, 2));
        let b = index.append_or_update(bar(3, 5));
        index.append_or_update(bar(8, 9));

        assert_eq!(index.find_by_source_index(0), Some(a));
        assert_eq!(index.find_by_source_index(2), Some(a));
        assert_eq!(index.find_by_source_index(3), Some(b));
        assert_eq!(index.find_by_source_index(7), None);
        assert_eq!(index.find_by_source_index(10), None);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(BarHandle(3).to_string(), "#3");
        assert_eq!(usize::from(BarHandle(3)), 3);
    }
}
