//! Sized Store Fan-out (spec §4.5.1): one [`PointerStore`] per size class,
//! opened lazily the first time that class is requested.
//!
//! Grounded on the teacher's allocator registry in `mem/alloc.rs`, which
//! keeps one `Cache` per fixed kernel object size and dispatches to it by
//! index; here the index is `ceil_log2(requested_size)` rather than a
//! hand-enumerated object list, and growth is behind the same
//! read-mostly/write-on-growth lock shape as `PointerStore`'s own slab
//! vector.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::config::Config;
use crate::core::layout::{ceil_log2, SlotLayout};
use crate::core::pointer_store::PointerStore;
use crate::core::reference::Ref;
use crate::error::OffheapError;
use crate::stats::FanoutStats;

pub(crate) struct SizedStoreFanout {
    config: Config,
    stores: RwLock<HashMap<u32, Box<PointerStore>>>,
}

impl SizedStoreFanout {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            config,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Allocates a slot sized for `object_size`, returning the size class
    /// it landed in alongside the `Ref` — callers (the façade layer) must
    /// remember the class to route `free`/`check_live` back to the right
    /// store.
    pub(crate) fn alloc(&self, object_size: usize) -> Result<(u32, Ref), OffheapError> {
        let class = ceil_log2(object_size);
        if class >= self.config.max_class_bits {
            return Err(OffheapError::CapacityOverflow);
        }
        let r = self.with_store(class, object_size, |store| store.alloc())?;
        Ok((class, r))
    }

    pub(crate) fn free(&self, class: u32, slot: Ref) -> Result<(), OffheapError> {
        let stores = self.stores.read();
        let store = stores.get(&class).ok_or(OffheapError::DoubleFree)?;
        store.free(slot)
    }

    pub(crate) fn stats(&self) -> FanoutStats {
        let stores = self.stores.read();
        let mut per_class = BTreeMap::new();
        for (&class, store) in stores.iter() {
            per_class.insert(class, store.stats());
        }
        FanoutStats { per_class }
    }

    /// The settled layout of every size class opened so far.
    pub(crate) fn layouts(&self) -> Vec<SlotLayout> {
        self.stores.read().values().map(|s| *s.layout()).collect()
    }

    /// Runs `f` against the store for `class`, opening it first if this is
    /// the class's first use. Double-checked locking: the common case (the
    /// store already exists) only ever takes the read lock.
    fn with_store<R>(
        &self,
        class: u32,
        object_size: usize,
        f: impl FnOnce(&PointerStore) -> R,
    ) -> R {
        {
            let stores = self.stores.read();
            if let Some(store) = stores.get(&class) {
                return f(store);
            }
        }
        let mut stores = self.stores.write();
        let store = stores.entry(class).or_insert_with(|| {
            Box::new(PointerStore::new(SlotLayout::compute(
                object_size,
                self.config.slab_bytes,
            )))
        });
        f(store)
    }
}
