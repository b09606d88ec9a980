//! Store lifecycle (spec §6): `new()`/`new_sized()`/`destroy()`/`stats()`/
//! `alloc_configs()`, the entry point every façade operation is routed
//! through.

use crate::config::Config;
use crate::core::fanout::SizedStoreFanout;
use crate::core::layout::SlotLayout;
use crate::error::OffheapError;
use crate::stats::FanoutStats;

/// A store is one `SizedStoreFanout`: the object a host program creates
/// once and shares across every `alloc_object`/`alloc_slice`/
/// `alloc_string` call.
pub struct Store {
    fanout: SizedStoreFanout,
}

impl Store {
    /// A store using `Config::default()`'s slab size (spec §6: "default
    /// slab size, implementation-defined, e.g. 8192 bytes").
    pub fn new() -> Self {
        Self {
            fanout: SizedStoreFanout::new(Config::default()),
        }
    }

    /// A store whose slabs are `slab_bytes` each, rounded up to the next
    /// power of two.
    pub fn new_sized(slab_bytes: usize) -> Self {
        let config = Config {
            slab_bytes: slab_bytes.next_power_of_two().max(1),
            ..Config::default()
        };
        Self {
            fanout: SizedStoreFanout::new(config),
        }
    }

    /// Validated constructor surfacing `OffheapError::InvalidConfig`
    /// instead of panicking (SPEC_FULL.md §2).
    pub fn try_new(slab_bytes: usize, max_class_bits: u32) -> Result<Self, OffheapError> {
        let config = Config::try_new_sized(slab_bytes, max_class_bits)?;
        Ok(Self {
            fanout: SizedStoreFanout::new(config),
        })
    }

    pub(crate) fn fanout(&self) -> &SizedStoreFanout {
        &self.fanout
    }

    /// Per-class and aggregate allocation statistics (spec §6).
    pub fn stats(&self) -> FanoutStats {
        self.fanout.stats()
    }

    /// The layout every currently-open size class settled on.
    pub fn alloc_configs(&self) -> Vec<SlotLayout> {
        self.fanout.layouts()
    }

    /// Tears down every size class this store has opened, unmapping all
    /// of their slabs (spec §6). Spelled out as a method, rather than
    /// relying solely on `Drop`, so the teardown point is visible at the
    /// call site; every operation on handles issued by this store is
    /// undefined afterward.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_has_documented_slab_size() {
        let store = Store::new();
        assert!(store.stats().per_class.is_empty());
    }

    #[test]
    fn new_sized_rounds_up_to_power_of_two() {
        let store = Store::new_sized(5000);
        // No class opened yet, so we can only check it doesn't panic; the
        // rounding itself is exercised in `config::tests`.
        assert!(store.alloc_configs().is_empty());
    }
}
