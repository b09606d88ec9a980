//! Allocation statistics (spec §6), plus the per-size-class aggregation
//! supplemented in SPEC_FULL.md §5.

use std::collections::BTreeMap;

/// Point-in-time counters for a single size class's [`PointerStore`](crate::core::pointer_store::PointerStore).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub allocs: u64,
    pub frees: u64,
    pub reused: u64,
    pub slabs: u64,
    pub slot_size: u64,
}

impl Stats {
    /// Slots currently handed out and not yet freed.
    pub fn live(&self) -> u64 {
        self.allocs.saturating_sub(self.frees)
    }

    /// Allocations that claimed a never-before-used slot, rather than
    /// reusing one from the free list (spec §4.4).
    pub fn raw_allocs(&self) -> u64 {
        self.allocs.saturating_sub(self.reused)
    }
}

/// Aggregated statistics across every size class a `SizedStoreFanout` has
/// opened, keyed by `ceil_log2` of the requested object size.
#[derive(Debug, Clone, Default)]
pub struct FanoutStats {
    pub per_class: BTreeMap<u32, Stats>,
}

impl FanoutStats {
    pub fn total(&self) -> Stats {
        let mut total = Stats {
            slot_size: 0,
            ..Stats::default()
        };
        for s in self.per_class.values() {
            total.allocs += s.allocs;
            total.frees += s.frees;
            total.reused += s.reused;
            total.slabs += s.slabs;
        }
        total
    }
}
