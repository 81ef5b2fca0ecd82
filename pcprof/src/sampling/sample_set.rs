//! Accumulated tick counts per distinct call stack

use indexmap::map::Iter;
use indexmap::{IndexMap, IndexSet};

use crate::domain::{Address, Stack};

/// Multiset of sampled stacks
///
/// Keys keep the order in which each stack was first seen, so every
/// aggregation derived from the set is deterministic for a given profile.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    stacks: IndexMap<Stack, u64>,
}

impl SampleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ticks` to the running total of `stack`
    pub fn record(&mut self, stack: Stack, ticks: u64) {
        let total = self.stacks.entry(stack).or_insert(0);
        *total = total.saturating_add(ticks);
    }

    /// Sum of all tick counts
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.stacks.values().fold(0u64, |acc, &t| acc.saturating_add(t))
    }

    /// Number of distinct stacks
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    #[must_use]
    pub fn ticks(&self, stack: &Stack) -> Option<u64> {
        self.stacks.get(stack).copied()
    }

    pub fn iter(&self) -> Iter<'_, Stack, u64> {
        self.stacks.iter()
    }

    /// Every distinct address appearing in any stack, in first-seen order
    #[must_use]
    pub fn addresses(&self) -> IndexSet<Address> {
        self.stacks.keys().flat_map(|stack| stack.frames().iter().copied()).collect()
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = (&'a Stack, &'a u64);
    type IntoIter = Iter<'a, Stack, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.stacks.iter()
    }
}
