//! Configuration system for the memory-hierarchy simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (line size, cache geometry, DRAM timing).
//! 2. **Structures:** Hierarchical config for the cache levels, DRAM, and the memory system.
//! 3. **Enums:** Simulation mode, replacement policy, and DRAM page policy.
//!
//! Configuration is supplied via JSON (`serde_json`) or `MemsysConfig::default()`.

use serde::Deserialize;

/// Default configuration constants for the simulator.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden in a JSON configuration file.
mod defaults {
    /// Cache line size in bytes.
    ///
    /// Matches typical modern processor cache line sizes and DRAM burst length.
    pub const LINE_BYTES: u64 = 64;

    /// Page size in bytes, used by the multi-core address translation.
    pub const PAGE_BYTES: u64 = 4096;

    /// Number of simulated cores. The multi-core mode requires exactly two.
    pub const NUM_CORES: usize = 2;

    /// Default L1 cache size in bytes (32 KiB).
    pub const L1_SIZE: u64 = 32 * 1024;

    /// Default L1 associativity.
    pub const L1_WAYS: u64 = 8;

    /// Default shared L2 cache size in bytes (1 MiB).
    pub const L2_SIZE: u64 = 1024 * 1024;

    /// Default L2 associativity.
    pub const L2_WAYS: u64 = 16;

    /// L1 instruction cache hit latency in cycles.
    pub const ICACHE_HIT_LATENCY: u64 = 1;

    /// L1 data cache hit latency in cycles.
    pub const DCACHE_HIT_LATENCY: u64 = 1;

    /// Shared L2 cache hit latency in cycles.
    pub const L2_HIT_LATENCY: u64 = 10;

    /// DRAM activation latency (ACT, also known as RAS), in cycles.
    pub const T_ACT: u64 = 45;

    /// DRAM column selection latency (CAS), in cycles.
    pub const T_CAS: u64 = 45;

    /// DRAM precharge latency (PRE), in cycles.
    pub const T_PRE: u64 = 45;

    /// DRAM bus latency paid by every banked access, in cycles.
    pub const T_BUS: u64 = 10;

    /// Flat DRAM latency assumed by the fixed-latency mode, in cycles.
    pub const FIXED_DRAM_LATENCY: u64 = 100;

    /// Static way-partitioning quota for core 0 (half of the default L2 ways).
    pub const SWP_CORE0_WAYS: u32 = 8;
}

/// Simulation mode selecting which hierarchy the memory system instantiates.
///
/// Each mode allocates only the components it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimMode {
    /// A single data cache, hit/miss counting only; every access reports
    /// zero delay and instruction fetches are ignored.
    #[default]
    CacheOnly,

    /// Private L1 instruction/data caches, a shared L2, and a DRAM module
    /// with a flat per-access latency.
    TwoLevelFixed,

    /// Private L1 instruction/data caches, a shared L2, and a DRAM module
    /// with per-bank row-buffer timing.
    TwoLevelTimed,

    /// Two cores with private L1 instruction/data caches each, a shared L2,
    /// row-buffer DRAM, and deterministic virtual-to-physical translation.
    MultiCore,
}

/// Cache replacement policy algorithms.
///
/// Selects which line to evict when a new line must be installed in a full
/// set. The partitioning policies divide a shared cache's ways between two
/// cores; see [`crate::cache::Cache::find_victim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacementPolicy {
    /// Least Recently Used: evict the line with the oldest access time.
    #[default]
    #[serde(alias = "LRU", alias = "Lru")]
    Lru,

    /// Evict a pseudo-randomly selected way.
    #[serde(alias = "RANDOM", alias = "Random")]
    Random,

    /// Static way partitioning: a fixed quota of ways is reserved for
    /// core 0; victims are taken from the other core while the quota is
    /// unmet.
    #[serde(alias = "SWP", alias = "Swp")]
    StaticPartition,

    /// Dynamic way partitioning: the core-0 quota is recomputed from
    /// per-core utility (hit/miss history) before every eviction decision.
    #[serde(alias = "DWP", alias = "Dwp")]
    DynamicPartition,
}

/// DRAM page policy governing row-buffer reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PagePolicy {
    /// Leave the accessed row open in the bank's row buffer; subsequent
    /// accesses to the same row pay only CAS.
    #[default]
    #[serde(alias = "OpenPage")]
    OpenPage,

    /// Close the row after every access; every access pays ACT + CAS.
    #[serde(alias = "ClosePage")]
    ClosePage,
}

/// Geometry and policy for a single cache level.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes.
    pub size_bytes: u64,

    /// Associativity (number of ways per set).
    pub ways: u64,

    /// Replacement policy for this level.
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    /// A 32 KiB, 8-way level-1 configuration.
    fn l1_default() -> Self {
        Self {
            size_bytes: defaults::L1_SIZE,
            ways: defaults::L1_WAYS,
            policy: ReplacementPolicy::default(),
        }
    }

    /// A 1 MiB, 16-way shared level-2 configuration.
    fn l2_default() -> Self {
        Self {
            size_bytes: defaults::L2_SIZE,
            ways: defaults::L2_WAYS,
            policy: ReplacementPolicy::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::l1_default()
    }
}

/// DRAM module configuration: page policy and timing parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DramConfig {
    /// Row-buffer page policy used by the timed modes.
    #[serde(default)]
    pub page_policy: PagePolicy,

    /// Activation latency (ACT/RAS) in cycles.
    #[serde(default = "DramConfig::default_t_act")]
    pub t_act: u64,

    /// Column selection latency (CAS) in cycles.
    #[serde(default = "DramConfig::default_t_cas")]
    pub t_cas: u64,

    /// Precharge latency (PRE) in cycles.
    #[serde(default = "DramConfig::default_t_pre")]
    pub t_pre: u64,

    /// Bus latency paid by every banked access, in cycles.
    #[serde(default = "DramConfig::default_t_bus")]
    pub t_bus: u64,

    /// Flat latency used when the fixed-latency model is selected.
    #[serde(default = "DramConfig::default_fixed_latency")]
    pub fixed_latency: u64,
}

impl DramConfig {
    fn default_t_act() -> u64 {
        defaults::T_ACT
    }

    fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    fn default_t_pre() -> u64 {
        defaults::T_PRE
    }

    fn default_t_bus() -> u64 {
        defaults::T_BUS
    }

    fn default_fixed_latency() -> u64 {
        defaults::FIXED_DRAM_LATENCY
    }
}

impl Default for DramConfig {
    fn default() -> Self {
        Self {
            page_policy: PagePolicy::default(),
            t_act: defaults::T_ACT,
            t_cas: defaults::T_CAS,
            t_pre: defaults::T_PRE,
            t_bus: defaults::T_BUS,
            fixed_latency: defaults::FIXED_DRAM_LATENCY,
        }
    }
}

/// Root configuration for the memory system.
///
/// # Examples
///
/// Deserializing from JSON:
///
/// ```
/// use memsim_core::config::{MemsysConfig, ReplacementPolicy, SimMode};
///
/// let json = r#"{
///     "mode": "two-level-timed",
///     "line_bytes": 64,
///     "dcache": { "size_bytes": 16384, "ways": 4, "policy": "LRU" },
///     "l2": { "size_bytes": 262144, "ways": 8, "policy": "SWP" },
///     "swp_core0_ways": 4
/// }"#;
///
/// let config: MemsysConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.mode, SimMode::TwoLevelTimed);
/// assert_eq!(config.dcache.ways, 4);
/// assert_eq!(config.l2.policy, ReplacementPolicy::StaticPartition);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MemsysConfig {
    /// Simulation mode; decides which components are instantiated.
    #[serde(default)]
    pub mode: SimMode,

    /// Cache line size in bytes, shared by every level.
    #[serde(default = "MemsysConfig::default_line_bytes")]
    pub line_bytes: u64,

    /// Page size in bytes, used by the multi-core address translation.
    #[serde(default = "MemsysConfig::default_page_bytes")]
    pub page_bytes: u64,

    /// Number of cores issuing references.
    #[serde(default = "MemsysConfig::default_num_cores")]
    pub num_cores: usize,

    /// L1 instruction cache geometry.
    #[serde(default)]
    pub icache: CacheConfig,

    /// L1 data cache geometry.
    #[serde(default)]
    pub dcache: CacheConfig,

    /// Shared L2 cache geometry.
    #[serde(default = "CacheConfig::l2_default")]
    pub l2: CacheConfig,

    /// DRAM timing and page policy.
    #[serde(default)]
    pub dram: DramConfig,

    /// L1 instruction cache hit latency in cycles.
    #[serde(default = "MemsysConfig::default_icache_hit_latency")]
    pub icache_hit_latency: u64,

    /// L1 data cache hit latency in cycles.
    #[serde(default = "MemsysConfig::default_dcache_hit_latency")]
    pub dcache_hit_latency: u64,

    /// Shared L2 cache hit latency in cycles.
    #[serde(default = "MemsysConfig::default_l2_hit_latency")]
    pub l2_hit_latency: u64,

    /// Static way-partitioning quota for core 0, used by
    /// [`ReplacementPolicy::StaticPartition`].
    #[serde(default = "MemsysConfig::default_swp_core0_ways")]
    pub swp_core0_ways: u32,
}

impl MemsysConfig {
    fn default_line_bytes() -> u64 {
        defaults::LINE_BYTES
    }

    fn default_page_bytes() -> u64 {
        defaults::PAGE_BYTES
    }

    fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    fn default_icache_hit_latency() -> u64 {
        defaults::ICACHE_HIT_LATENCY
    }

    fn default_dcache_hit_latency() -> u64 {
        defaults::DCACHE_HIT_LATENCY
    }

    fn default_l2_hit_latency() -> u64 {
        defaults::L2_HIT_LATENCY
    }

    fn default_swp_core0_ways() -> u32 {
        defaults::SWP_CORE0_WAYS
    }
}

impl Default for MemsysConfig {
    fn default() -> Self {
        Self {
            mode: SimMode::default(),
            line_bytes: defaults::LINE_BYTES,
            page_bytes: defaults::PAGE_BYTES,
            num_cores: defaults::NUM_CORES,
            icache: CacheConfig::l1_default(),
            dcache: CacheConfig::l1_default(),
            l2: CacheConfig::l2_default(),
            dram: DramConfig::default(),
            icache_hit_latency: defaults::ICACHE_HIT_LATENCY,
            dcache_hit_latency: defaults::DCACHE_HIT_LATENCY,
            l2_hit_latency: defaults::L2_HIT_LATENCY,
            swp_core0_ways: defaults::SWP_CORE0_WAYS,
        }
    }
}
