//! Object façade (spec §4.5.2): a slot holding exactly one `T`.

use std::marker::PhantomData;
use std::mem::size_of;

use crate::core::reference::Ref;
use crate::reflect::{assert_allocatable, Allocatable};
use crate::store::Store;

/// A handle to one off-heap `T`. Contents are unspecified until the
/// caller writes through [`ObjectRef::value`] — the slot is never zeroed
/// (spec §4.5.2).
///
/// `Clone`/`Copy` are implemented by hand rather than derived: the struct
/// never stores a `T`, only a marker for it, so a derive would wrongly
/// require `T: Clone + Copy` to copy three words and a `PhantomData`.
#[derive(Debug)]
pub struct ObjectRef<T> {
    slot: Ref,
    class: u32,
    _marker: PhantomData<T>,
}

impl<T> Clone for ObjectRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ObjectRef<T> {}

impl<T> ObjectRef<T> {
    pub fn is_nil(&self) -> bool {
        self.slot.is_nil()
    }

    /// Dereferences this handle, panicking with a use-after-free
    /// diagnostic if the slot has since been freed (spec §7 kind 2).
    pub fn value(&self) -> &mut T {
        self.slot.check_live().unwrap_or_else(|e| panic!("{e}"));
        // SAFETY: `check_live` confirmed the slot is live; the slot was
        // sized for exactly `T` by `alloc_object`, and `ObjectRef<T>`'s
        // type parameter ties every access back to that same `T`.
        unsafe { &mut *self.slot.data_ptr.cast::<T>() }
    }
}

/// Allocates a slot sized for `T`, after a once-per-`T` check that `T`
/// contains no host-managed pointers (spec §4.5.2, §4.5.5).
pub fn alloc_object<T: Allocatable>(store: &Store) -> ObjectRef<T> {
    assert_allocatable::<T>();
    let (class, slot) = store
        .fanout()
        .alloc(size_of::<T>())
        .unwrap_or_else(|e| panic!("{e}"));
    ObjectRef {
        slot,
        class,
        _marker: PhantomData,
    }
}

/// Returns `objref`'s slot to its size class's free list.
pub fn free_object<T>(store: &Store, objref: ObjectRef<T>) {
    store
        .fanout()
        .free(objref.class, objref.slot)
        .unwrap_or_else(|e| panic!("{e}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_value() {
        let store = Store::new();
        let r = alloc_object::<u64>(&store);
        *r.value() = 0xDEAD_BEEF;
        assert_eq!(*r.value(), 0xDEAD_BEEF);
    }

    #[test]
    fn value_is_the_same_address_across_calls() {
        let store = Store::new();
        let r = alloc_object::<u64>(&store);
        let p1 = r.value() as *mut u64;
        let p2 = r.value() as *mut u64;
        assert_eq!(p1, p2);
    }

    #[test]
    #[should_panic(expected = "use-after-free")]
    fn access_after_free_panics() {
        let store = Store::new();
        let r = alloc_object::<i32>(&store);
        *r.value() = 7;
        free_object(&store, r);
        alloc_object::<i32>(&store);
        r.value();
    }
}
