//! A general-purpose, off-heap slab allocator for fixed-size records,
//! flat arrays, and byte strings — records placed here are invisible to
//! the host program's own tracing collector or escape analysis.
//!
//! The [`core`] module is the untyped allocator: size classes, slabs,
//! free lists, and the per-size-class pointer store. [`facade`] layers
//! typed object/slice/string handles on top. A [`store::Store`] is the
//! one object a host program creates and shares across every façade
//! call.

pub mod config;
pub mod core;
pub mod error;
pub mod facade;
pub mod reflect;
pub mod stats;
pub mod store;

pub use config::Config;
pub use core::Ref;
pub use error::OffheapError;
pub use store::Store;
