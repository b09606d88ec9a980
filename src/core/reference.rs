//! `Ref`: the opaque, plain-data slot handle (spec §3).

use std::ptr;

use crate::core::metadata::Metadata;
use crate::error::OffheapError;

/// A handle to a slot: a raw data pointer, a raw metadata pointer, and the
/// generation tag observed at allocation time.
///
/// `Ref` is plain data — three words, no `Drop`, no managed pointers of
/// its own — so it may itself be embedded in a record that lives inside
/// the allocator (spec §3). Equality is by `(data_ptr, generation)`, per
/// spec; two `Ref`s to the same slot at different generations compare
/// unequal, matching the invalidation semantics of §4.5.3's growth
/// protocol.
#[derive(Debug, Clone, Copy)]
pub struct Ref {
    pub(crate) data_ptr: *mut u8,
    pub(crate) meta_ptr: *mut Metadata,
    pub(crate) generation: u64,
}

// SAFETY: a `Ref` is plain data describing a location and a liveness tag;
// it carries no borrow and no exclusivity claim of its own. Concurrent use
// of the pointers it names is governed by the ordering guarantees of
// spec §5, not by `Ref` itself.
unsafe impl Send for Ref {}
unsafe impl Sync for Ref {}

impl Ref {
    pub const NIL: Ref = Ref {
        data_ptr: ptr::null_mut(),
        meta_ptr: ptr::null_mut(),
        generation: 0,
    };

    pub fn is_nil(&self) -> bool {
        self.data_ptr.is_null()
    }

    /// The metadata this reference names, if any.
    pub(crate) fn metadata(&self) -> Option<&Metadata> {
        // SAFETY: a non-nil `Ref`'s `meta_ptr` always names a `Metadata`
        // inside some slab's metadata region, which outlives every `Ref`
        // derived from it until the owning store's `destroy()`.
        unsafe { self.meta_ptr.as_ref() }
    }

    /// Self-contained liveness check (spec §3 invariant 2): the slot's
    /// current generation must equal the one this `Ref` was minted with.
    /// Needs only the `Ref` itself, not the store it came from, so the
    /// façade layer can call it without routing through a size class.
    pub(crate) fn check_live(&self) -> Result<(), OffheapError> {
        let meta = self.metadata().ok_or(OffheapError::UseAfterFree)?;
        if meta.generation() != self.generation || !meta.is_live() {
            return Err(OffheapError::UseAfterFree);
        }
        Ok(())
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.data_ptr == other.data_ptr && self.generation == other.generation
    }
}
impl Eq for Ref {}

impl Default for Ref {
    fn default() -> Self {
        Ref::NIL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_nil() {
        assert!(Ref::NIL.is_nil());
        assert_eq!(Ref::default(), Ref::NIL);
    }

    #[test]
    fn equality_is_by_data_ptr_and_generation() {
        let mut x = 0u8;
        let a = Ref {
            data_ptr: &mut x as *mut u8,
            meta_ptr: ptr::null_mut(),
            generation: 2,
        };
        let b = Ref { generation: 2, ..a };
        let c = Ref { generation: 4, ..a };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
