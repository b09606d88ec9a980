//! Size-class layout computation (spec §4.1, "SizeClass Config").
//!
//! Mirrors the teacher's `AddrSpace`/`PageSize` pattern of deriving every
//! other layout constant from one or two inputs and freezing the result
//! into an immutable record (`mem/addr.rs`), rather than recomputing
//! stride/offset arithmetic at every call site.

use std::mem::size_of;

use crate::core::metadata::Metadata;

/// The immutable layout of one size class (spec §3, "SlotLayout").
///
/// All fields are derived once by [`SlotLayout::compute`] and never change
/// for the lifetime of the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub requested_object_size: usize,
    pub slot_size: usize,
    pub slots_per_slab: usize,
    pub metadata_stride: usize,
    pub data_region_bytes: usize,
    pub metadata_region_bytes: usize,
    pub total_slab_bytes: usize,
}

impl SlotLayout {
    /// Derives a concrete layout from a requested record size and a target
    /// slab size, following spec §4.1's five steps in order.
    pub fn compute(requested_object_size: usize, requested_slab_size: usize) -> Self {
        // Step 1: round the slot size up to a power of two; zero-sized
        // records still occupy a one-byte slot so that `Ref`s stay
        // distinguishable.
        let slot_size = if requested_object_size == 0 {
            1
        } else {
            requested_object_size.next_power_of_two()
        };

        // Step 2: round the slab size up to a power of two, then raise it
        // to at least one slot (oversized records get one slot per slab).
        let mut total_object_bytes = requested_slab_size.next_power_of_two().max(1);
        if total_object_bytes < slot_size {
            total_object_bytes = slot_size;
        }

        // Step 3.
        let slots_per_slab = total_object_bytes / slot_size;

        // Step 4.
        let metadata_stride = size_of::<Metadata>().next_power_of_two();

        // Step 5.
        let metadata_region_bytes = metadata_stride * slots_per_slab;

        // Step 6.
        let total_slab_bytes = total_object_bytes + metadata_region_bytes;

        let layout = Self {
            requested_object_size,
            slot_size,
            slots_per_slab,
            metadata_stride,
            data_region_bytes: total_object_bytes,
            metadata_region_bytes,
            total_slab_bytes,
        };
        layout.debug_check_invariants();
        layout
    }

    fn debug_check_invariants(&self) {
        debug_assert!(self.slot_size.is_power_of_two());
        debug_assert!(self.metadata_stride.is_power_of_two());
        debug_assert!(self.slot_size >= self.requested_object_size);
        debug_assert!(self.slots_per_slab >= 1);
        debug_assert_eq!(self.data_region_bytes, self.slot_size * self.slots_per_slab);
        debug_assert_eq!(
            self.total_slab_bytes,
            self.data_region_bytes + self.metadata_region_bytes
        );
    }
}

/// Rounds `ceil(log2(max(1, n)))`, the size-class index selector used
/// throughout the façade (spec §4.5.1).
pub fn ceil_log2(n: usize) -> u32 {
    let n = n.max(1);
    if n.is_power_of_two() {
        n.trailing_zeros()
    } else {
        usize::BITS - n.leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_rounds_up_slot_size() {
        let l = SlotLayout::compute(24, 4096);
        assert_eq!(l.slot_size, 32);
        assert_eq!(l.slots_per_slab, 4096 / 32);
    }

    #[test]
    fn zero_sized_object_gets_one_byte_slot() {
        let l = SlotLayout::compute(0, 4096);
        assert_eq!(l.slot_size, 1);
    }

    #[test]
    fn oversized_object_gets_one_slot_per_slab() {
        let l = SlotLayout::compute(9000, 4096);
        assert_eq!(l.slot_size, 16384);
        assert_eq!(l.slots_per_slab, 1);
        assert_eq!(l.data_region_bytes, l.slot_size);
    }

    #[test]
    fn ceil_log2_matches_spec_examples() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(0), 0);
    }
}
