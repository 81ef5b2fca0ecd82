//! Flat and cumulative aggregation of sampled stacks
//!
//! # Weights
//!
//! - **Flat**: a stack's ticks count toward the name of its leaf frame only
//! - **Cumulative**: a stack's ticks count toward the name of every frame,
//!   so one sample contributes to many names
//!
//! ```text
//! [leaf_fn]            x50   flat leaf_fn +50   cum leaf_fn +50
//! [leaf_fn, caller_fn] x30   flat leaf_fn +30   cum leaf_fn +30, caller_fn +30
//! ```
//!
//! Aggregates keep first-seen order so ties sort deterministically.

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::analysis::report::{Report, ReportRow};
use crate::domain::{Address, SymbolName};
use crate::sampling::SampleSet;
use crate::symbolization::SymbolMapping;

/// Parsed samples paired with the mapping used to name them
#[derive(Debug, Clone)]
pub struct Profile {
    samples: SampleSet,
    mapping: SymbolMapping,
    dispatch_symbol: Option<String>,
}

impl Profile {
    pub fn new(samples: SampleSet, mapping: SymbolMapping) -> Self {
        Self { samples, mapping, dispatch_symbol: None }
    }

    /// Log the callers of leaf samples still attributed to the dispatch loop
    #[must_use]
    pub fn with_dispatch_symbol(mut self, name: impl Into<String>) -> Self {
        self.dispatch_symbol = Some(name.into());
        self
    }

    /// Total ticks, the denominator for every percentage
    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.samples.total_ticks()
    }

    /// Every distinct address appearing in any stack
    #[must_use]
    pub fn addresses(&self) -> IndexSet<Address> {
        self.samples.addresses()
    }

    #[must_use]
    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    #[must_use]
    pub fn mapping(&self) -> &SymbolMapping {
        &self.mapping
    }

    /// Ticks per leaf-frame name
    ///
    /// Stacks without frames add to [`Self::sample_count`] only.
    #[must_use]
    pub fn flat(&self) -> IndexMap<SymbolName, u64> {
        let mut counts: IndexMap<SymbolName, u64> = IndexMap::new();

        for (stack, &ticks) in &self.samples {
            let Some(leaf) = stack.leaf() else {
                continue;
            };
            self.trace_unattributed_dispatch(leaf, stack.frames());

            let total = counts.entry(self.mapping.resolve(leaf)).or_insert(0);
            *total = total.saturating_add(ticks);
        }

        counts
    }

    /// Ticks per name for every frame of every stack
    #[must_use]
    pub fn cumulative(&self) -> IndexMap<SymbolName, u64> {
        let mut counts: IndexMap<SymbolName, u64> = IndexMap::new();

        for (stack, &ticks) in &self.samples {
            for &addr in stack.frames() {
                let total = counts.entry(self.mapping.resolve(addr)).or_insert(0);
                *total = total.saturating_add(ticks);
            }
        }

        counts
    }

    /// Ranked report rows
    ///
    /// Names with flat weight come first, heaviest first. Names that only
    /// ever appear below the leaf follow in reverse lexicographic order.
    #[must_use]
    pub fn report(&self) -> Report {
        let total = self.sample_count();
        let flat = self.flat();
        let cumulative = self.cumulative();

        let mut ranked: Vec<(&SymbolName, u64)> = flat.iter().map(|(n, &t)| (n, t)).collect();
        // Stable: equal weights keep first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut callers_only: Vec<&SymbolName> =
            cumulative.keys().filter(|name| !flat.contains_key(*name)).collect();
        callers_only.sort_by(|a, b| b.cmp(a));

        let mut rows = Vec::with_capacity(ranked.len() + callers_only.len());
        let mut running: u64 = 0;

        for (name, weight) in ranked {
            running = running.saturating_add(weight);
            let cum = cumulative.get(name).copied().unwrap_or(weight);
            rows.push(ReportRow::new(name.clone(), weight, running, cum, total));
        }
        let flat_len = rows.len();

        for name in callers_only {
            let cum = cumulative.get(name).copied().unwrap_or(0);
            rows.push(ReportRow::new(name.clone(), 0, running, cum, total));
        }

        Report::new(total, rows, flat_len)
    }

    /// Full text report
    #[must_use]
    pub fn text(&self) -> String {
        self.report().to_text()
    }

    fn trace_unattributed_dispatch(&self, leaf: Address, frames: &[Address]) {
        let Some(ref dispatch) = self.dispatch_symbol else {
            return;
        };
        if self.mapping.lookup(leaf).is_some_and(|name| name.as_str() == dispatch) {
            let caller = frames.get(2).map(|&addr| self.mapping.resolve(addr));
            debug!(
                "Leaf {leaf} still attributed to {dispatch}, caller: {}",
                caller.as_ref().map_or("<none>", SymbolName::as_str)
            );
        }
    }
}

/// `part` as a percentage of `total`, 0 when there are no samples
#[must_use]
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stack;

    fn create_test_profile() -> Profile {
        let mut samples = SampleSet::new();
        samples.record(Stack::from(vec![0x100]), 50);
        samples.record(Stack::from(vec![0x100, 0x200]), 30);

        let mapping: SymbolMapping = [
            (Address(0x100), SymbolName::from("leaf_fn")),
            (Address(0x200), SymbolName::from("caller_fn")),
        ]
        .into_iter()
        .collect();

        Profile::new(samples, mapping)
    }

    #[test]
    fn test_flat_counts_leaf_only() {
        let flat = create_test_profile().flat();

        assert_eq!(flat.len(), 1);
        assert_eq!(flat[&SymbolName::from("leaf_fn")], 80);
    }

    #[test]
    fn test_cumulative_counts_every_frame() {
        let cumulative = create_test_profile().cumulative();

        assert_eq!(cumulative.len(), 2);
        assert_eq!(cumulative[&SymbolName::from("leaf_fn")], 80);
        assert_eq!(cumulative[&SymbolName::from("caller_fn")], 30);
    }

    #[test]
    fn test_sample_count_sums_ticks() {
        assert_eq!(create_test_profile().sample_count(), 80);
    }

    #[test]
    fn test_addresses_are_distinct() {
        let addrs = create_test_profile().addresses();
        assert_eq!(addrs.len(), 2);
        assert!(addrs.contains(&Address(0x200)));
    }

    #[test]
    fn test_cumulative_at_least_flat() {
        let mut samples = SampleSet::new();
        samples.record(Stack::from(vec![0x1, 0x2, 0x3]), 7);
        samples.record(Stack::from(vec![0x2, 0x3]), 5);
        samples.record(Stack::from(vec![0x4]), 2);
        samples.record(Stack::from(vec![0x3, 0x1]), 11);
        let profile = Profile::new(samples, SymbolMapping::default());

        let cumulative = profile.cumulative();
        for (name, flat) in profile.flat() {
            assert!(cumulative[&name] >= flat, "{name}: cum {} < flat {flat}", cumulative[&name]);
        }
    }

    #[test]
    fn test_unmapped_leaf_uses_hex_name() {
        let mut samples = SampleSet::new();
        samples.record(Stack::from(vec![0xabc]), 3);
        let profile = Profile::new(samples, SymbolMapping::default());

        assert_eq!(profile.flat()[&SymbolName::from("0000000000000abc")], 3);
    }

    #[test]
    fn test_empty_stack_counts_toward_total_only() {
        let mut samples = SampleSet::new();
        samples.record(Stack::new(Vec::new()), 4);
        samples.record(Stack::from(vec![0x1]), 4);
        let profile = Profile::new(samples, SymbolMapping::default());

        assert_eq!(profile.sample_count(), 8);
        assert_eq!(profile.flat().values().sum::<u64>(), 4);
    }

    #[test]
    fn test_report_orders_flat_then_callers() {
        let mut samples = SampleSet::new();
        samples.record(Stack::from(vec![0x1, 0x9]), 10);
        samples.record(Stack::from(vec![0x2, 0x8]), 30);
        samples.record(Stack::from(vec![0x3, 0x9]), 10);
        let mapping: SymbolMapping = [
            (Address(0x1), SymbolName::from("first_tie")),
            (Address(0x2), SymbolName::from("heaviest")),
            (Address(0x3), SymbolName::from("second_tie")),
            (Address(0x8), SymbolName::from("alpha")),
            (Address(0x9), SymbolName::from("beta")),
        ]
        .into_iter()
        .collect();

        let report = Profile::new(samples, mapping).report();
        let names: Vec<&str> = report.rows().iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["heaviest", "first_tie", "second_tie", "beta", "alpha"]);
        assert_eq!(report.flat_rows().len(), 3);
    }

    #[test]
    fn test_report_running_sum() {
        let report = create_test_profile().report();
        let rows = report.rows();

        assert_eq!(rows.len(), 2);
        assert!((rows[0].flat_percent - 100.0).abs() < 1e-9);
        assert!((rows[0].sum_percent - 100.0).abs() < 1e-9);
        assert_eq!(rows[1].flat, 0);
        assert_eq!(rows[1].cumulative, 30);
        assert!((rows[1].cumulative_percent - 37.5).abs() < 1e-9);
        assert!((rows[1].sum_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_with_zero_total() {
        assert!(percent(5, 0).abs() < f64::EPSILON);
        assert!((percent(1, 4) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_profile_report() {
        let profile = Profile::new(SampleSet::new(), SymbolMapping::default());
        let report = profile.report();

        assert_eq!(report.total_samples(), 0);
        assert!(report.rows().is_empty());
    }
}
