//! Typed façades over the untyped core (spec §4.5): fixed object, flat
//! array, and immutable byte string.

pub mod object;
pub mod slice;
pub mod string;

pub use object::{alloc_object, free_object, ObjectRef};
pub use slice::{alloc_slice, append, append_slice, concat_slices, free_slice, SliceRef};
pub use string::{
    alloc_string_from_bytes, alloc_string_from_string, append_string, concat_strings,
    free_string, StringRef,
};
