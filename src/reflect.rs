//! Interface to the type-reflection collaborator (spec §4.5.5).
//!
//! The reflection *pass* itself — walking an arbitrary Rust type's layout
//! to enumerate every field that embeds a managed pointer — is explicitly
//! out of scope (spec §1): "a precondition predicate the façade calls once
//! per type" is a collaborator the core only needs an interface to. This
//! module is that interface, plus the one case Rust lets us decide at
//! compile time for free: any `T: bytemuck::Pod` cannot contain a `Box`,
//! `Rc`, `Arc`, `Vec`, trait object, or function pointer, since none of
//! those are `Pod`. That covers the overwhelming majority of records a
//! host program would place off-heap.
//!
//! For the remaining cases — a type the reflection pass judges safe but
//! that isn't structurally `Pod` (e.g. it has private padding bytes) — a
//! caller (or the external reflection collaborator, wired in by whoever
//! embeds this crate) can assert the precondition by hand with an
//! `unsafe impl Allocatable for T`.

/// Asserts that `Self` contains no host-managed pointers: no `Box`, `Rc`,
/// `Arc`, `Vec`, trait object, or closure anywhere in its layout (spec
/// invariant 5).
///
/// # Safety
/// Implementing this trait for a type that *does* embed a managed pointer
/// breaks every invariant the allocator provides: the host runtime's
/// collector has no way to know the pointer lives off-heap, and will free
/// or move the pointee out from under a live slot.
pub unsafe trait Allocatable: 'static {
    /// Field paths that would disqualify this type, as judged by the
    /// external reflection collaborator. An empty slice means allocatable.
    ///
    /// The façade calls this once per `alloc` (spec §4.5.5: "the core does
    /// not cache this result"); callers that allocate the same `T`
    /// repeatedly are free to cache the result themselves.
    fn disallowed_fields() -> &'static [&'static str] {
        &[]
    }
}

// SAFETY: `bytemuck::Pod` already guarantees no padding, no `Drop` impl,
// and a layout made entirely of other `Pod` fields — transitively, that
// rules out every managed-pointer type in `std`/`alloc`, none of which are
// `Pod`.
unsafe impl<T: bytemuck::Pod + 'static> Allocatable for T {}

/// Runs the precondition check for `T` and panics with the offending
/// field paths if it fails. Called once at the top of every façade `alloc`
/// entry point (spec §4.5.2: "once-per-T check ... panic otherwise").
pub fn assert_allocatable<T: Allocatable>() {
    let fields = T::disallowed_fields();
    if !fields.is_empty() {
        let fields: Vec<crate::error::FieldPath> =
            fields.iter().map(|f| crate::error::FieldPath(f.to_string())).collect();
        panic!(
            "{}",
            crate::error::OffheapError::TypeNotAllocatable { fields }
        );
    }
}
