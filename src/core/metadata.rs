//! Per-slot, out-of-band metadata (spec §3, "Metadata").
//!
//! Kept in a region disjoint from slot data, as the teacher keeps a
//! slab's bitmap disjoint from its slot buffer (`mem/alloc/slab.rs`,
//! `UntypedSlab`) — so that one `munmap` releases both at once.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::reference::Ref;

/// A slot's liveness state.
///
/// `generation` even ⇒ live or never-allocated; odd ⇒ free-listed. The
/// value stored in a `Ref` is the even generation observed at allocation
/// time (spec §3); a mismatch at access time is use-after-free.
pub struct Metadata {
    generation: AtomicU64,
    /// Link to the next free slot while this slot sits on the free list
    /// (spec §3: "used only while the slot is on the free list"). All
    /// reads and writes happen under the owning `PointerStore`'s free-list
    /// lock (spec §4.3), so a plain `UnsafeCell` suffices.
    next_free: UnsafeCell<Option<Ref>>,
}

// SAFETY: `next_free` is only ever touched while the free-list lock
// (spec §4.3/§5) is held by the calling thread.
unsafe impl Sync for Metadata {}

impl Metadata {
    /// A never-allocated slot: generation 0 (even ⇒ live-or-fresh),
    /// empty free-list link.
    pub(crate) fn fresh() -> Self {
        Self {
            generation: AtomicU64::new(0),
            next_free: UnsafeCell::new(None),
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn is_live(&self) -> bool {
        self.generation() % 2 == 0
    }

    /// Bumps the generation by one: even→odd on free, odd→even on reuse
    /// from the free list, or even→odd→even on an in-place slice/string
    /// growth that keeps the same slot but must invalidate the old `Ref`.
    /// The counter is a plain atomic increment, safe to call without
    /// holding any lock; only `next_free` requires the free-list lock.
    pub(crate) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Invalidates the current generation and issues a fresh even one in
    /// a single atomic step, without ever passing through the odd
    /// (free-listed) state — used by in-place slice/string growth, which
    /// keeps the same slot but must invalidate every `Ref` minted before
    /// the growth (spec §4.5.3).
    pub(crate) fn reissue(&self) -> u64 {
        self.generation.fetch_add(2, Ordering::AcqRel) + 2
    }

    /// Reads the free-list link. Caller must hold the free-list lock.
    ///
    /// # Safety
    /// No other thread may be reading or writing `next_free` concurrently;
    /// guaranteed by the free-list lock.
    pub(crate) unsafe fn next_free(&self) -> Option<Ref> {
        // SAFETY: see function-level safety note.
        unsafe { *self.next_free.get() }
    }

    /// Writes the free-list link. Caller must hold the free-list lock.
    ///
    /// # Safety
    /// Same requirement as [`Metadata::next_free`].
    pub(crate) unsafe fn set_next_free(&self, next: Option<Ref>) {
        // SAFETY: see function-level safety note.
        unsafe { *self.next_free.get() = next };
    }
}
