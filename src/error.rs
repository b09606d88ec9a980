//! Diagnostics for the five non-recoverable error kinds of the allocator.
//!
//! The core treats every variant here as fatal at the point of use (spec
//! §7): callers see a `panic!` carrying the `Display` text of the matching
//! variant, not a `Result`. The enum exists so the panic message is
//! structured and so `Config::try_new_sized` (the one genuinely
//! recoverable entry point, since misconfiguring the allocator at startup
//! is an ordinary mistake, not a use-after-free) can return it normally.

use std::fmt;

/// The five error kinds of spec §7.
#[derive(Debug, thiserror::Error)]
pub enum OffheapError {
    /// A type offered to the object/slice façade contains a field that
    /// would break the allocator's no-managed-pointers precondition.
    #[error("type not allocatable: disallowed fields {fields:?}")]
    TypeNotAllocatable { fields: Vec<FieldPath> },

    /// The slot's generation did not match the `Ref`'s embedded
    /// generation at access time.
    #[error("use-after-free: stale reference to a freed slot")]
    UseAfterFree,

    /// The slot's generation did not match the `Ref`'s embedded
    /// generation at the second `free` of the same reference.
    #[error("double free: slot was already freed")]
    DoubleFree,

    /// A slice/string growth computed a new length or capacity that
    /// overflows the addressable range.
    #[error("capacity overflow computing new length/capacity")]
    CapacityOverflow,

    /// The OS declined to map (or unmap) a slab.
    #[error("OS memory mapping failed: {0}")]
    MapFailed(#[source] std::io::Error),

    /// An operation was attempted on a store after `destroy()`.
    #[error("use after destroy: store has already been torn down")]
    AlreadyDestroyed,

    /// `Config::try_new_sized` was given a configuration that cannot be
    /// satisfied (e.g. zero classes).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A dotted field path identifying where a disallowed field was found,
/// e.g. `node.children[1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(pub String);

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self { FieldPath(s.to_string()) }
}
