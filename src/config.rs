//! Tunable allocator configuration (SPEC_FULL.md §3).

use crate::error::OffheapError;

/// Global knobs shared by every size class a store opens: the target slab
/// size and the highest `ceil_log2` size class the allocator will ever
/// grow into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub slab_bytes: usize,
    /// Highest size-class index + 1: classes `0..max_class_bits` are
    /// admitted, so `ceil_log2(object_size) >= max_class_bits` is rejected.
    pub max_class_bits: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slab_bytes: 8192,
            max_class_bits: 32,
        }
    }
}

impl Config {
    /// Builds a config after validating it, rather than panicking on a
    /// caller-supplied value — the one recoverable path in an otherwise
    /// panic-on-violation crate (SPEC_FULL.md §2).
    pub fn try_new_sized(slab_bytes: usize, max_class_bits: u32) -> Result<Self, OffheapError> {
        if slab_bytes == 0 {
            return Err(OffheapError::InvalidConfig(
                "slab_bytes must be non-zero".into(),
            ));
        }
        if max_class_bits == 0 || max_class_bits > usize::BITS {
            return Err(OffheapError::InvalidConfig(format!(
                "max_class_bits must be in 1..={}, got {max_class_bits}",
                usize::BITS
            )));
        }
        Ok(Self {
            slab_bytes,
            max_class_bits,
        })
    }
}
