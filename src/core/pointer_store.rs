//! Pointer Store (spec §4.4): a single size class's allocator. Combines a
//! [`SlotLayout`], a growing vector of [`Slab`]s, and a [`FreeList`] into
//! `alloc`/`free`/`destroy`/`stats`.
//!
//! Grounded on the teacher's `Cache<T>` (`mem/alloc/slab.rs`), which owns a
//! growing list of slabs behind a lock and a free-object list, growing the
//! backing store on demand rather than up front. The suspension points
//! mirror spec §5 exactly: one `RwLock` guarding slab growth, one atomic
//! counter for never-before-allocated slots, and the free list's own lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::core::free_list::FreeList;
use crate::core::layout::SlotLayout;
use crate::core::reference::Ref;
use crate::core::slab_pool::{map_slab, unmap_slab, Slab};
use crate::error::OffheapError;
use crate::stats::Stats;

pub(crate) struct PointerStore {
    layout: SlotLayout,
    slabs: RwLock<Vec<Slab>>,
    free_list: FreeList,
    /// Count of slots ever handed out via the never-before-allocated path
    /// (spec §4.4's `alloc_counter`). Slots recycled through the free list
    /// don't consume a new index.
    alloc_counter: AtomicU64,
    /// Total `alloc()` calls, fresh or reused (spec §4.4/§6's `allocs`).
    allocs: AtomicU64,
    destroyed: AtomicBool,
}

impl PointerStore {
    pub(crate) fn new(layout: SlotLayout) -> Self {
        Self {
            layout,
            slabs: RwLock::new(Vec::new()),
            free_list: FreeList::new(),
            alloc_counter: AtomicU64::new(0),
            allocs: AtomicU64::new(0),
            destroyed: AtomicBool::new(false),
        }
    }

    pub(crate) fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    /// Hands back a live `Ref` to a fresh slot: a reused one if the free
    /// list is non-empty, otherwise a never-before-allocated one, growing
    /// the slab vector if every mapped slab is already spoken for.
    pub(crate) fn alloc(&self) -> Result<Ref, OffheapError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(OffheapError::AlreadyDestroyed);
        }
        self.allocs.fetch_add(1, Ordering::Relaxed);
        if let Some(r) = self.free_list.pop() {
            return Ok(r);
        }

        let index = self.alloc_counter.fetch_add(1, Ordering::Relaxed) as usize;
        self.ensure_capacity(index + 1)?;

        let slabs = self.slabs.read();
        let slab_index = index / self.layout.slots_per_slab;
        let offset = index % self.layout.slots_per_slab;
        let slab = &slabs[slab_index];
        let data_ptr = slab.slot_data(&self.layout, offset);
        let meta_ptr = slab.slot_metadata(&self.layout, offset);
        // SAFETY: `meta_ptr` was written by `map_slab` before this slab was
        // published to `self.slabs`, so it is a valid, initialized `Metadata`.
        let generation = unsafe { &*meta_ptr }.generation();
        Ok(Ref {
            data_ptr,
            meta_ptr,
            generation,
        })
    }

    /// Returns `slot` to the free list. Errors if `slot`'s embedded
    /// generation doesn't match the slot's current one — either a stale
    /// handle or a slot already freed once (spec §4.4/§7 kind 2).
    pub(crate) fn free(&self, slot: Ref) -> Result<(), OffheapError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(OffheapError::AlreadyDestroyed);
        }
        let meta = slot.metadata().ok_or(OffheapError::DoubleFree)?;
        if meta.generation() != slot.generation {
            return Err(OffheapError::DoubleFree);
        }
        self.free_list.push(slot);
        Ok(())
    }

    /// Validates that `slot` is still live: its embedded generation must
    /// match the slot's current one (spec §7 kind 1, use-after-free).
    pub(crate) fn check_live(&self, slot: Ref) -> Result<(), OffheapError> {
        slot.check_live()
    }

    /// Unmaps every slab this store ever mapped. Idempotent calls error
    /// rather than double-`munmap`ing (spec §7 kind 5).
    pub(crate) fn destroy(&self) -> Result<(), OffheapError> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return Err(OffheapError::AlreadyDestroyed);
        }
        let mut slabs = self.slabs.write();
        for slab in slabs.iter() {
            // SAFETY: `destroyed` is now set, so no alloc/free can observe
            // these slabs again, and this is the only `destroy` call that
            // will ever run (the swap above guarantees that).
            unsafe { unmap_slab(slab) };
        }
        slabs.clear();
        Ok(())
    }

    pub(crate) fn stats(&self) -> Stats {
        Stats {
            allocs: self.allocs.load(Ordering::Relaxed),
            frees: self.free_list.frees(),
            reused: self.free_list.reused(),
            slabs: self.slabs.read().len() as u64,
            slot_size: self.layout.slot_size as u64,
        }
    }

    /// Grows `self.slabs` until it holds at least `needed_slots` slots,
    /// taking the write lock only when growth is actually required.
    fn ensure_capacity(&self, needed_slots: usize) -> Result<(), OffheapError> {
        {
            let slabs = self.slabs.read();
            if slabs.len() * self.layout.slots_per_slab >= needed_slots {
                return Ok(());
            }
        }
        let mut slabs = self.slabs.write();
        while slabs.len() * self.layout.slots_per_slab < needed_slots {
            slabs.push(map_slab(&self.layout)?);
        }
        Ok(())
    }
}

impl Drop for PointerStore {
    fn drop(&mut self) {
        if !self.destroyed.load(Ordering::Acquire) {
            let _ = self.destroy();
        }
    }
}
