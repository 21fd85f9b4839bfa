//! Configuration error definitions.
//!
//! All failures in this crate are construction-time configuration errors:
//! once a component is built, every runtime operation is total over valid
//! inputs (a full set always has a selectable victim, statistics guard their
//! denominators). There is no I/O and no external resource to fail.

use thiserror::Error;

/// A malformed configuration detected while building a component.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Cache size is not an exact multiple of `line_bytes * ways`.
    #[error(
        "cache size {size_bytes} B is not divisible by {ways} ways of {line_bytes}-byte lines"
    )]
    IndivisibleGeometry {
        /// Total cache size in bytes.
        size_bytes: u64,
        /// Configured associativity.
        ways: u64,
        /// Configured line size in bytes.
        line_bytes: u64,
    },

    /// The derived set count must be a power of two so index bits can be
    /// masked out of a line address.
    #[error("cache set count {sets} is not a power of two")]
    SetsNotPowerOfTwo {
        /// Derived number of sets.
        sets: u64,
    },

    /// A cache must have at least one way and a nonzero line size.
    #[error("cache geometry has a zero dimension (size {size_bytes}, ways {ways}, line {line_bytes})")]
    ZeroGeometry {
        /// Total cache size in bytes.
        size_bytes: u64,
        /// Configured associativity.
        ways: u64,
        /// Configured line size in bytes.
        line_bytes: u64,
    },

    /// The multi-core mode's address translation is defined for exactly two
    /// cores.
    #[error("multi-core mode requires exactly 2 cores, got {num_cores}")]
    UnsupportedCoreCount {
        /// Configured core count.
        num_cores: usize,
    },

    /// Page size must be a power-of-two multiple of the line size for the
    /// translation's offset split.
    #[error("page size {page_bytes} B is not a power-of-two multiple of line size {line_bytes} B")]
    BadPageGeometry {
        /// Configured page size in bytes.
        page_bytes: u64,
        /// Configured line size in bytes.
        line_bytes: u64,
    },
}
