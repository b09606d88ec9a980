//! String façade (spec §4.5.4): an immutable-after-construction byte
//! string, built the same way as the slice façade but specialized to
//! bytes and reinterpreted as UTF-8 on read.

use std::ptr;

use crate::core::reference::Ref;
use crate::error::OffheapError;
use crate::store::Store;

/// A handle to an off-heap, contiguously-stored byte string. Content is
/// fixed at construction; the only mutation is `append_string`, which
/// invalidates this handle and returns a new one (spec §4.5.4).
#[derive(Debug, Clone, Copy)]
pub struct StringRef {
    slot: Ref,
    class: u32,
    length: usize,
    capacity: usize,
}

impl StringRef {
    pub fn is_nil(&self) -> bool {
        self.slot.is_nil()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// An immutable view of the stored bytes as `&str`, panicking with a
    /// use-after-free diagnostic if the slot has since been freed or
    /// grown past this handle.
    pub fn value(&self) -> &str {
        self.slot.check_live().unwrap_or_else(|e| panic!("{e}"));
        // SAFETY: every constructor below only ever copies bytes sourced
        // from a `&str`, so the stored bytes are valid UTF-8, and
        // `check_live` confirmed the slot is still live.
        unsafe {
            std::str::from_utf8_unchecked(std::slice::from_raw_parts(
                self.slot.data_ptr,
                self.length,
            ))
        }
    }
}

fn capacity_for(requested: usize) -> usize {
    requested.max(1).next_power_of_two()
}

fn alloc_raw(store: &Store, bytes: &[u8]) -> StringRef {
    let capacity = capacity_for(bytes.len());
    let (class, slot) = store.fanout().alloc(capacity).unwrap_or_else(|e| panic!("{e}"));
    // SAFETY: `slot` was just allocated with room for `capacity >=
    // bytes.len()` bytes and is not yet visible to any other caller.
    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), slot.data_ptr, bytes.len()) };
    StringRef {
        slot,
        class,
        length: bytes.len(),
        capacity,
    }
}

/// Allocates a string from raw bytes, assumed valid UTF-8 by the caller.
pub fn alloc_string_from_bytes(store: &Store, bytes: &[u8]) -> StringRef {
    alloc_raw(store, bytes)
}

pub fn alloc_string_from_string(store: &Store, s: &str) -> StringRef {
    alloc_raw(store, s.as_bytes())
}

/// Concatenates `strings` into one fresh string (spec §4.5.4).
pub fn concat_strings(store: &Store, strings: &[StringRef]) -> StringRef {
    let total_len = strings.iter().map(|s| s.length).sum();
    let capacity = capacity_for(total_len);
    let (class, slot) = store
        .fanout()
        .alloc(capacity)
        .unwrap_or_else(|e| panic!("{e}"));
    let mut offset = 0;
    for s in strings {
        let bytes = s.value().as_bytes();
        // SAFETY: `slot` has room for `total_len` bytes; each source
        // range was read from a distinct, already-live string.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), slot.data_ptr.add(offset), bytes.len())
        };
        offset += bytes.len();
    }
    StringRef {
        slot,
        class,
        length: total_len,
        capacity,
    }
}

/// Appends `more` to `stringref`, invalidating it and returning a new
/// handle — the same growth protocol as the slice façade's
/// `append_slice` (spec §4.5.3/§4.5.4).
pub fn append_string(store: &Store, stringref: StringRef, more: &str) -> StringRef {
    let more = more.as_bytes();
    let new_length = stringref
        .length
        .checked_add(more.len())
        .unwrap_or_else(|| panic!("{}", OffheapError::CapacityOverflow));
    let new_capacity = capacity_for(new_length);

    if new_capacity <= stringref.capacity {
        let meta = stringref
            .slot
            .metadata()
            .unwrap_or_else(|| panic!("{}", OffheapError::UseAfterFree));
        let generation = meta.reissue();
        // SAFETY: the slot has room for `capacity >= new_length` bytes;
        // the generation was just reissued, invalidating the old `Ref`.
        unsafe {
            ptr::copy_nonoverlapping(
                more.as_ptr(),
                stringref.slot.data_ptr.add(stringref.length),
                more.len(),
            )
        };
        StringRef {
            slot: Ref {
                generation,
                ..stringref.slot
            },
            class: stringref.class,
            length: new_length,
            capacity: stringref.capacity,
        }
    } else {
        let (new_class, new_slot) = store
            .fanout()
            .alloc(new_capacity)
            .unwrap_or_else(|e| panic!("{e}"));
        let old = stringref.value().as_bytes();
        // SAFETY: `new_slot` was just allocated with room for
        // `new_capacity >= new_length` bytes, disjoint from `old`.
        unsafe {
            ptr::copy_nonoverlapping(old.as_ptr(), new_slot.data_ptr, old.len());
            ptr::copy_nonoverlapping(more.as_ptr(), new_slot.data_ptr.add(old.len()), more.len());
        }
        store
            .fanout()
            .free(stringref.class, stringref.slot)
            .unwrap_or_else(|e| panic!("{e}"));
        StringRef {
            slot: new_slot,
            class: new_class,
            length: new_length,
            capacity: new_capacity,
        }
    }
}

/// Returns `stringref`'s slot to the free list of the size class it was
/// allocated in.
pub fn free_string(store: &Store, stringref: StringRef) {
    store
        .fanout()
        .free(stringref.class, stringref.slot)
        .unwrap_or_else(|e| panic!("{e}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_from_string_round_trips() {
        let store = Store::new();
        let r = alloc_string_from_string(&store, "hello");
        assert_eq!(r.value(), "hello");
    }

    #[test]
    fn append_joins_and_may_grow() {
        let store = Store::new();
        let r = alloc_string_from_string(&store, "hello");
        let r2 = append_string(&store, r, " world");
        assert_eq!(r2.value(), "hello world");
    }

    #[test]
    #[should_panic(expected = "use-after-free")]
    fn old_ref_invalid_after_append() {
        let store = Store::new();
        let r = alloc_string_from_string(&store, "hello");
        let _r2 = append_string(&store, r, " world");
        r.value();
    }

    #[test]
    fn concat_joins_in_order() {
        let store = Store::new();
        let a = alloc_string_from_string(&store, "foo");
        let b = alloc_string_from_string(&store, "bar");
        let c = concat_strings(&store, &[a, b]);
        assert_eq!(c.value(), "foobar");
    }
}
