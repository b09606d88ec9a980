//! Slice façade (spec §4.5.3): a flat array of `T` with append/concat and
//! the growth protocol that either reuses a slot in place or copies to a
//! new size class.

use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr;

use crate::core::reference::Ref;
use crate::error::OffheapError;
use crate::reflect::{assert_allocatable, Allocatable};
use crate::store::Store;

/// A handle to an off-heap `[T]` with a fixed `capacity` and a `length`
/// of live elements, `length <= capacity`. Contents are unspecified at
/// allocation (spec §4.5.3).
///
/// `Clone`/`Copy` are implemented by hand, not derived, for the same
/// reason as [`crate::facade::object::ObjectRef`]: no `T` is ever stored.
#[derive(Debug)]
pub struct SliceRef<T> {
    slot: Ref,
    class: u32,
    length: usize,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for SliceRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SliceRef<T> {}

impl<T> SliceRef<T> {
    pub fn is_nil(&self) -> bool {
        self.slot.is_nil()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A view of the first `length` live elements, panicking on
    /// use-after-free.
    pub fn value(&self) -> &mut [T] {
        self.slot.check_live().unwrap_or_else(|e| panic!("{e}"));
        // SAFETY: `check_live` confirmed the slot is live, and it was
        // sized for at least `capacity * size_of::<T>()` bytes by
        // `alloc_slice`/the growth protocol, with `length <= capacity`.
        unsafe { std::slice::from_raw_parts_mut(self.slot.data_ptr.cast::<T>(), self.length) }
    }
}

fn capacity_for(requested_capacity: usize) -> usize {
    requested_capacity.max(1).next_power_of_two()
}

/// Allocates a slice of `length` unspecified elements with room for at
/// least `requested_capacity`, rounded up to a power of two (spec
/// §4.5.3).
pub fn alloc_slice<T: Allocatable + Copy>(
    store: &Store,
    length: usize,
    requested_capacity: usize,
) -> SliceRef<T> {
    assert_allocatable::<T>();
    let capacity = capacity_for(requested_capacity);
    assert!(length <= capacity, "slice length exceeds its capacity");
    let (class, slot) = store
        .fanout()
        .alloc(capacity * size_of::<T>())
        .unwrap_or_else(|e| panic!("{e}"));
    SliceRef {
        slot,
        class,
        length,
        capacity,
        _marker: PhantomData,
    }
}

/// Concatenates `slices` into one fresh slice whose length is the sum of
/// their lengths (spec §4.5.3).
pub fn concat_slices<T: Allocatable + Copy>(store: &Store, slices: &[SliceRef<T>]) -> SliceRef<T> {
    let total_len = slices.iter().map(|s| s.length).sum();
    let out = alloc_slice::<T>(store, total_len, total_len);
    let dst = out.value();
    let mut offset = 0;
    for s in slices {
        let src = s.value();
        dst[offset..offset + src.len()].copy_from_slice(src);
        offset += src.len();
    }
    out
}

/// Appends one element, invalidating `sliceref` and returning a new
/// handle (spec §4.5.3's growth protocol).
pub fn append<T: Allocatable + Copy>(store: &Store, sliceref: SliceRef<T>, v: T) -> SliceRef<T> {
    append_slice(store, sliceref, &[v])
}

/// Appends `src` in bulk, invalidating `sliceref` and returning a new
/// handle (spec §4.5.3).
pub fn append_slice<T: Allocatable + Copy>(
    store: &Store,
    sliceref: SliceRef<T>,
    src: &[T],
) -> SliceRef<T> {
    let new_length = sliceref
        .length
        .checked_add(src.len())
        .unwrap_or_else(|| panic!("{}", OffheapError::CapacityOverflow));
    let new_capacity = capacity_for(new_length);

    if new_capacity <= sliceref.capacity {
        let meta = sliceref
            .slot
            .metadata()
            .unwrap_or_else(|| panic!("{}", OffheapError::UseAfterFree));
        let generation = meta.reissue();
        let base = sliceref.slot.data_ptr.cast::<T>();
        // SAFETY: the slot has room for `capacity >= new_length` elements;
        // writing past the old `length` but within `capacity` stays inside
        // the mapping, and the generation was just reissued so no other
        // live `Ref` observes this slot concurrently.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), base.add(sliceref.length), src.len());
        }
        SliceRef {
            slot: Ref {
                generation,
                ..sliceref.slot
            },
            class: sliceref.class,
            length: new_length,
            capacity: sliceref.capacity,
            _marker: PhantomData,
        }
    } else {
        let (new_class, new_slot) = store
            .fanout()
            .alloc(new_capacity * size_of::<T>())
            .unwrap_or_else(|e| panic!("{e}"));
        let old = sliceref.value();
        let base = new_slot.data_ptr.cast::<T>();
        // SAFETY: `new_slot` was just allocated with room for
        // `new_capacity >= new_length` elements; `old` and the new slot
        // are disjoint allocations.
        unsafe {
            ptr::copy_nonoverlapping(old.as_ptr(), base, old.len());
            ptr::copy_nonoverlapping(src.as_ptr(), base.add(old.len()), src.len());
        }
        store
            .fanout()
            .free(sliceref.class, sliceref.slot)
            .unwrap_or_else(|e| panic!("{e}"));
        SliceRef {
            slot: new_slot,
            class: new_class,
            length: new_length,
            capacity: new_capacity,
            _marker: PhantomData,
        }
    }
}

/// Returns `sliceref`'s slot to the free list of the size class it was
/// allocated in.
pub fn free_slice<T>(store: &Store, sliceref: SliceRef<T>) {
    store
        .fanout()
        .free(sliceref.class, sliceref.slot)
        .unwrap_or_else(|e| panic!("{e}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_discipline() {
        let store = Store::new();
        let r = alloc_slice::<u8>(&store, 3, 3);
        assert_eq!(r.len(), 3);
        assert_eq!(r.capacity(), 4);
    }

    #[test]
    fn append_in_place_when_capacity_allows() {
        let store = Store::new();
        let r = alloc_slice::<u8>(&store, 2, 2);
        r.value().copy_from_slice(&[1, 2]);
        let r2 = append(&store, r, 3);
        assert_eq!(r2.value(), &[1, 2, 3]);
        assert_eq!(r2.capacity(), 4);
    }

    #[test]
    #[should_panic(expected = "use-after-free")]
    fn old_ref_invalid_after_in_place_append() {
        let store = Store::new();
        let r = alloc_slice::<u8>(&store, 2, 2);
        r.value().copy_from_slice(&[1, 2]);
        let _r2 = append(&store, r, 3);
        r.value();
    }

    #[test]
    fn append_grows_to_new_class_when_capacity_exhausted() {
        let store = Store::new();
        let r = alloc_slice::<u8>(&store, 1, 1);
        r.value()[0] = 9;
        let r2 = append(&store, r, 10);
        assert_eq!(r2.value(), &[9, 10]);
        assert_eq!(r2.capacity(), 2);
    }

    #[test]
    fn concat_concatenates_in_order() {
        let store = Store::new();
        let a = alloc_slice::<u8>(&store, 2, 2);
        a.value().copy_from_slice(&[1, 2]);
        let b = alloc_slice::<u8>(&store, 1, 1);
        b.value().copy_from_slice(&[3]);
        let c = concat_slices(&store, &[a, b]);
        assert_eq!(c.value(), &[1, 2, 3]);
    }
}
