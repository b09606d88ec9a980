//! Slab Pool (spec §4.2): own a growing, ordered sequence of OS-mapped
//! memory regions and hand out slot addresses within them.
//!
//! Grounded on the teacher's `PageAllocator` (`mem/alloc/page.rs`), which
//! is also an `Allocator` that goes straight to the OS (there, the
//! physical-frame manager; here, anonymous `mmap`) rather than sub-dividing
//! an existing heap allocation.

use std::ptr::{self, NonNull};

use crate::core::layout::SlotLayout;
use crate::core::metadata::Metadata;
use crate::error::OffheapError;

/// One contiguously-mapped region: `data_region_bytes` of slot storage
/// followed by `metadata_region_bytes` of per-slot [`Metadata`] (spec §3,
/// "Slab"). Both sub-regions live in one mapping so a single `munmap`
/// releases both.
pub struct Slab {
    data_base: NonNull<u8>,
    total_slab_bytes: usize,
}

// SAFETY: a `Slab`'s mapping is exclusively owned by its `PointerStore`
// (spec §3, "owned by Slab Pool ... destroyed only at Store teardown");
// sharing it across threads is safe because all mutation goes through the
// locks spec §5 describes, not through `Slab` itself.
unsafe impl Send for Slab {}
unsafe impl Sync for Slab {}

impl Slab {
    pub(crate) fn data_base(&self) -> *mut u8 {
        self.data_base.as_ptr()
    }

    pub(crate) fn metadata_base(&self, layout: &SlotLayout) -> *mut Metadata {
        // SAFETY: offsetting within the single mapping backing this slab.
        unsafe { self.data_base.as_ptr().add(layout.data_region_bytes).cast() }
    }

    /// The data pointer of the `offset`-th slot in this slab.
    pub(crate) fn slot_data(&self, layout: &SlotLayout, offset: usize) -> *mut u8 {
        debug_assert!(offset < layout.slots_per_slab);
        // SAFETY: `offset < slots_per_slab`, so this stays within
        // `data_region_bytes`, which is within the mapping.
        unsafe { self.data_base.as_ptr().add(offset * layout.slot_size) }
    }

    /// The metadata pointer of the `offset`-th slot in this slab.
    pub(crate) fn slot_metadata(&self, layout: &SlotLayout, offset: usize) -> *mut Metadata {
        debug_assert!(offset < layout.slots_per_slab);
        // SAFETY: `offset < slots_per_slab`, so this stays within
        // `metadata_region_bytes`, which is within the mapping.
        unsafe {
            self.metadata_base(layout)
                .byte_add(offset * layout.metadata_stride)
        }
    }
}

/// Maps a fresh slab for `layout` and initializes every slot's metadata to
/// the fresh (never-allocated) state.
///
/// Corresponds to spec §4.2's `map_slab`. An OS mapping failure is fatal
/// per spec §7 kind 4: there is no partial mapping to retain, so this
/// returns a `Result` only so the one fatal `panic!` call site in
/// `PointerStore` stays centralized.
pub(crate) fn map_slab(layout: &SlotLayout) -> Result<Slab, OffheapError> {
    // SAFETY: requesting an anonymous, process-private, read/write
    // mapping of `total_slab_bytes`; no file descriptor, no fixed address.
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            layout.total_slab_bytes,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        let err = std::io::Error::last_os_error();
        log::error!("offheap: mmap of {} bytes failed: {err}", layout.total_slab_bytes);
        return Err(OffheapError::MapFailed(err));
    }
    log::debug!(
        "offheap: mapped slab of {} bytes ({} slots of {} bytes)",
        layout.total_slab_bytes,
        layout.slots_per_slab,
        layout.slot_size
    );

    // SAFETY: `addr` is the start of a just-mapped, exclusively-owned
    // region of `total_slab_bytes`; it cannot be null (checked above).
    let data_base = unsafe { NonNull::new_unchecked(addr.cast::<u8>()) };
    let slab = Slab {
        data_base,
        total_slab_bytes: layout.total_slab_bytes,
    };

    for offset in 0..layout.slots_per_slab {
        let meta_ptr = slab.slot_metadata(layout, offset);
        // SAFETY: freshly mapped memory, not yet observed by any other
        // thread; writing the initial `Metadata` value is the first use.
        unsafe { ptr::write(meta_ptr, Metadata::fresh()) };
    }

    Ok(slab)
}

/// Releases a slab's entire mapping (spec §4.2's `unmap_slab`). Must only
/// be called once, from `PointerStore::destroy`.
pub(crate) unsafe fn unmap_slab(slab: &Slab) {
    // SAFETY: `data_base`/`total_slab_bytes` describe exactly the mapping
    // `map_slab` created; caller guarantees this runs at most once.
    let rc = unsafe { libc::munmap(slab.data_base.as_ptr().cast(), slab.total_slab_bytes) };
    debug_assert_eq!(rc, 0, "munmap of a valid mapping should not fail");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_slab_initializes_every_slot_fresh() {
        let layout = SlotLayout::compute(16, 4096);
        let slab = map_slab(&layout).expect("mmap should succeed in tests");
        for offset in 0..layout.slots_per_slab {
            // SAFETY: slot just initialized by map_slab, single-threaded here.
            let meta = unsafe { &*slab.slot_metadata(&layout, offset) };
            assert_eq!(meta.generation(), 0);
            assert!(meta.is_live());
        }
        // SAFETY: no other references to `slab` remain.
        unsafe { unmap_slab(&slab) };
    }
}
