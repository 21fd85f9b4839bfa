//! Memory access classification and cache lookup outcomes.
//!
//! These types are used for:
//! 1. **Dispatch:** Selecting the instruction or data cache for a reference.
//! 2. **Statistics Tracking:** Bucketing access counts and delays by kind.

/// Kind of memory reference presented to the memory system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch; probes the instruction cache.
    Ifetch,

    /// Data load; probes the data cache as a read.
    Load,

    /// Data store; probes the data cache as a write.
    Store,
}

/// Outcome of a cache probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheResult {
    /// The requested line was present with a matching tag and owner.
    Hit,

    /// The requested line was absent; the caller is expected to install it.
    Miss,
}

impl CacheResult {
    /// Returns `true` for [`CacheResult::Hit`].
    #[inline]
    pub fn is_hit(self) -> bool {
        self == Self::Hit
    }
}
