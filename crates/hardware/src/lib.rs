//! Memory-hierarchy timing simulator library.
//!
//! This crate implements a trace-driven functional timing simulator for a
//! cache/DRAM hierarchy with the following:
//! 1. **Cache:** Set-associative arrays with core-aware lines and LRU, Random,
//!    and static/dynamic way-partitioning replacement.
//! 2. **DRAM:** Per-bank row-buffer timing under open-page or close-page
//!    policy, plus a flat fixed-latency model.
//! 3. **Memory System:** Mode-selected hierarchies (single cache, two-level,
//!    two-core with address translation) composing hit latencies, miss fills,
//!    and dirty-eviction writebacks into a per-reference delay.
//! 4. **Configuration & Statistics:** JSON-loadable configuration and fixed-
//!    format cumulative reports per component.
//!
//! The driver presents one reference at a time and advances its clock by the
//! delay each [`MemorySystem::access`] call returns; the model is inherently
//! serial and keeps no state outside the components it owns.

/// Common types (access kinds, lookup results, configuration errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Set-associative cache with replacement policies.
pub mod cache;
/// DRAM row-buffer timing model.
pub mod dram;
/// Memory-system orchestration and access pipelines.
pub mod memsys;

/// Kind of memory reference (fetch, load, store).
pub use crate::common::AccessType;
/// Root configuration type; use `MemsysConfig::default()` or deserialize from JSON.
pub use crate::config::MemsysConfig;
/// Top-level memory system; construct with `MemorySystem::new`.
pub use crate::memsys::MemorySystem;
