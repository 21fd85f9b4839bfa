//! Set-associative cache model.
//!
//! This module implements a configurable set-associative cache with per-line
//! core ownership and pluggable replacement policies (LRU, Random, and
//! static/dynamic way partitioning between two cores). It models hits,
//! misses, line installation with victim selection, dirty evictions, and the
//! statistics the memory system reports.
//!
//! Lines are tracked at cache-line granularity: all addresses handled here
//! are *line* addresses (byte address divided by the line size).

mod policy;

use self::policy::Lfsr;
use crate::common::{CacheResult, ConfigError};
use crate::config::{CacheConfig, ReplacementPolicy};

/// Number of cores a shared cache partitions its ways between.
const TRACKED_CORES: usize = 2;

/// A single cache line.
///
/// Invalid at construction; becomes valid on install and is only ever
/// overwritten afterwards. The owner core disambiguates lines with equal
/// tags: a physically shared array can hold the same tag once per core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Whether this way holds a line.
    pub valid: bool,
    /// Whether the line was written since install.
    pub dirty: bool,
    /// Address bits above the set index.
    pub tag: u64,
    /// Core that installed the line (0 or 1).
    pub owner: usize,
    /// Cycle of the most recent hit or install.
    pub last_access: u64,
}

/// One set of `ways` lines plus the bookkeeping the partitioning policies
/// read: per-core way occupancy and the hit/miss history used to weigh
/// per-core utility.
#[derive(Debug, Clone)]
struct CacheSet {
    lines: Vec<CacheLine>,
    ways_per_core: [u32; TRACKED_CORES],
    /// Hits observed on each way, never reset, even across re-installs.
    way_hits: Vec<u64>,
    /// Misses observed in this set, never reset.
    misses: u64,
}

impl CacheSet {
    fn new(ways: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); ways],
            ways_per_core: [0; TRACKED_CORES],
            way_hits: vec![0; ways],
            misses: 0,
        }
    }
}

/// Cumulative access statistics for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Read probes (loads, instruction fetches, L2 fills).
    pub read_access: u64,
    /// Read probes that missed.
    pub read_miss: u64,
    /// Write probes (stores, writebacks into this level).
    pub write_access: u64,
    /// Write probes that missed.
    pub write_miss: u64,
    /// Valid dirty lines evicted by installs.
    pub dirty_evicts: u64,
}

impl CacheStats {
    /// Prints the counters in the fixed label-prefixed report format.
    ///
    /// Miss ratios report 0.0 when the corresponding access count is zero.
    pub fn print(&self, label: &str) {
        let percent = |miss: u64, access: u64| {
            if access == 0 {
                0.0
            } else {
                100.0 * miss as f64 / access as f64
            }
        };
        let read_miss_percent = percent(self.read_miss, self.read_access);
        let write_miss_percent = percent(self.write_miss, self.write_access);

        println!();
        println!("{label}_READ_ACCESS     \t\t : {:10}", self.read_access);
        println!("{label}_WRITE_ACCESS    \t\t : {:10}", self.write_access);
        println!("{label}_READ_MISS       \t\t : {:10}", self.read_miss);
        println!("{label}_WRITE_MISS      \t\t : {:10}", self.write_miss);
        println!("{label}_READ_MISS_PERC  \t\t : {read_miss_percent:10.3}");
        println!("{label}_WRITE_MISS_PERC \t\t : {write_miss_percent:10.3}");
        println!("{label}_DIRTY_EVICTS    \t\t : {:10}", self.dirty_evicts);
    }
}

/// A set-associative cache with core-aware lines and a replacement policy.
#[derive(Debug, Clone)]
pub struct Cache {
    sets: Vec<CacheSet>,
    ways: usize,
    policy: ReplacementPolicy,
    index_bits: u32,
    index_mask: u64,
    /// Snapshot of the line most recently displaced by [`Cache::install`],
    /// consumed by the memory system to propagate writebacks.
    last_evicted: CacheLine,
    /// Quota of ways reserved for core 0 under static partitioning.
    static_core0_ways: u32,
    /// Quota most recently computed by dynamic partitioning. Shared across
    /// all sets of this cache and refreshed on every dynamic eviction
    /// decision.
    dwp_core0_ways: u32,
    lfsr: Lfsr,
    /// Cumulative hit/miss/eviction counters.
    pub stats: CacheStats,
}

impl Cache {
    /// Builds an empty cache with `size_bytes / (line_bytes * ways)` sets.
    ///
    /// `static_core0_ways` is the core-0 quota consumed by the
    /// [`ReplacementPolicy::StaticPartition`] policy; other policies ignore
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the geometry has a zero dimension, does
    /// not divide evenly, or yields a set count that is not a power of two.
    pub fn new(
        config: &CacheConfig,
        line_bytes: u64,
        static_core0_ways: u32,
    ) -> Result<Self, ConfigError> {
        let CacheConfig {
            size_bytes,
            ways,
            policy,
        } = config.clone();

        if size_bytes == 0 || ways == 0 || line_bytes == 0 {
            return Err(ConfigError::ZeroGeometry {
                size_bytes,
                ways,
                line_bytes,
            });
        }
        if size_bytes % (line_bytes * ways) != 0 {
            return Err(ConfigError::IndivisibleGeometry {
                size_bytes,
                ways,
                line_bytes,
            });
        }

        let sets = (size_bytes / line_bytes) / ways;
        if !sets.is_power_of_two() {
            return Err(ConfigError::SetsNotPowerOfTwo { sets });
        }

        let index_bits = sets.trailing_zeros();
        Ok(Self {
            sets: (0..sets).map(|_| CacheSet::new(ways as usize)).collect(),
            ways: ways as usize,
            policy,
            index_bits,
            index_mask: sets - 1,
            last_evicted: CacheLine::default(),
            static_core0_ways,
            dwp_core0_ways: 0,
            lfsr: Lfsr::new(),
            stats: CacheStats::default(),
        })
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// Associativity.
    pub fn ways(&self) -> usize {
        self.ways
    }

    #[inline]
    fn set_index(&self, line_addr: u64) -> usize {
        (line_addr & self.index_mask) as usize
    }

    #[inline]
    fn tag_of(&self, line_addr: u64) -> u64 {
        line_addr >> self.index_bits
    }

    /// Probes the cache for `line_addr` on behalf of `core_id`.
    ///
    /// A hit requires a valid line whose tag *and* owner core both match;
    /// two cores sharing this array never alias each other's lines. On a
    /// hit the line's recency is refreshed to `now` and, for writes, the
    /// line is marked dirty. Access counters update on every probe; miss
    /// counters (including the set's utility-monitor miss count) only on a
    /// miss. The cache is not modified otherwise: installing the missing
    /// line is the caller's decision via [`Cache::install`].
    ///
    /// `core_id` must be 0 or 1.
    pub fn access(
        &mut self,
        line_addr: u64,
        is_write: bool,
        core_id: usize,
        now: u64,
    ) -> CacheResult {
        let set_index = self.set_index(line_addr);
        let tag = self.tag_of(line_addr);

        if is_write {
            self.stats.write_access += 1;
        } else {
            self.stats.read_access += 1;
        }

        let set = &mut self.sets[set_index];
        for (way, line) in set.lines.iter_mut().enumerate() {
            if line.valid && line.owner == core_id && line.tag == tag {
                if is_write {
                    line.dirty = true;
                }
                line.last_access = now;
                set.way_hits[way] += 1;
                tracing::trace!(line_addr, core_id, way, "cache hit");
                return CacheResult::Hit;
            }
        }

        if is_write {
            self.stats.write_miss += 1;
        } else {
            self.stats.read_miss += 1;
        }
        set.misses += 1;
        tracing::trace!(line_addr, core_id, "cache miss");
        CacheResult::Miss
    }

    /// Installs the line for `line_addr`, evicting a victim chosen by the
    /// replacement policy.
    ///
    /// The displaced line (valid or not) is snapshotted and retrievable via
    /// [`Cache::last_evicted`] until the next install; the memory system
    /// inspects it to issue writebacks for valid dirty victims. Per-core
    /// occupancy counters are kept consistent with the valid lines in the
    /// set.
    ///
    /// `core_id` must be 0 or 1.
    pub fn install(&mut self, line_addr: u64, is_write: bool, core_id: usize, now: u64) {
        let set_index = self.set_index(line_addr);
        let tag = self.tag_of(line_addr);
        let victim_way = self.find_victim(set_index, core_id);

        let set = &mut self.sets[set_index];
        let victim = set.lines[victim_way];
        self.last_evicted = victim;

        if victim.valid && victim.dirty {
            self.stats.dirty_evicts += 1;
            tracing::debug!(
                set_index,
                victim_way,
                victim_tag = victim.tag,
                "evicting dirty line"
            );
        }
        if victim.valid {
            set.ways_per_core[victim.owner] -= 1;
        }

        set.lines[victim_way] = CacheLine {
            valid: true,
            dirty: is_write,
            tag,
            owner: core_id,
            last_access: now,
        };
        set.ways_per_core[core_id] += 1;
    }

    /// Selects the way to overwrite in `set_index` according to the
    /// replacement policy.
    ///
    /// Every policy fills invalid ways first, in way order. Once the set is
    /// full:
    ///
    /// - `Lru` evicts the globally oldest line;
    /// - `Random` picks a pseudo-random way;
    /// - `StaticPartition` evicts core 1's oldest line while core 0 is under
    ///   its quota, otherwise the requester's oldest line;
    /// - `DynamicPartition` first refreshes the core-0 quota from the set's
    ///   hit/miss history, then applies the same owner rule with it.
    pub fn find_victim(&mut self, set_index: usize, core_id: usize) -> usize {
        let ways = self.ways;
        let set = &self.sets[set_index];
        if let Some(way) = policy::invalid_way(&set.lines) {
            return way;
        }

        match self.policy {
            ReplacementPolicy::Lru => policy::lru_way(&set.lines),
            ReplacementPolicy::Random => (self.lfsr.next() as usize) % ways,
            ReplacementPolicy::StaticPartition => {
                let owner = policy::partition_victim_owner(
                    set.ways_per_core[0],
                    self.static_core0_ways,
                    core_id,
                );
                policy::oldest_owned_way(&set.lines, owner)
            }
            ReplacementPolicy::DynamicPartition => {
                self.dwp_core0_ways =
                    policy::dynamic_core0_quota(&set.lines, &set.way_hits, set.misses, ways);
                let owner = policy::partition_victim_owner(
                    set.ways_per_core[0],
                    self.dwp_core0_ways,
                    core_id,
                );
                policy::oldest_owned_way(&set.lines, owner)
            }
        }
    }

    /// Non-mutating probe: whether `line_addr` is present for `core_id`.
    pub fn contains(&self, line_addr: u64, core_id: usize) -> bool {
        let set = &self.sets[self.set_index(line_addr)];
        let tag = self.tag_of(line_addr);
        set.lines
            .iter()
            .any(|line| line.valid && line.owner == core_id && line.tag == tag)
    }

    /// The line displaced by the most recent [`Cache::install`].
    pub fn last_evicted(&self) -> CacheLine {
        self.last_evicted
    }

    /// Reconstructs the line address of the last evicted line, if it needs a
    /// writeback (valid and dirty).
    ///
    /// The victim shared its set with `line_addr`, so its address is its tag
    /// shifted into place with the current index bits restored:
    /// `(tag << index_bits) | (line_addr & index_mask)`.
    pub fn writeback_line_addr(&self, line_addr: u64) -> Option<u64> {
        if self.last_evicted.valid && self.last_evicted.dirty {
            Some((self.last_evicted.tag << self.index_bits) | (line_addr & self.index_mask))
        } else {
            None
        }
    }

    /// Quota most recently computed by the dynamic-partitioning policy.
    pub fn dwp_core0_ways(&self) -> u32 {
        self.dwp_core0_ways
    }

    /// Valid-line count and per-core way occupancy of one set.
    ///
    /// The occupancy counters always sum to the valid-line count; exposed so
    /// harnesses can check the invariant directly.
    pub fn set_occupancy(&self, set_index: usize) -> (usize, [u32; 2]) {
        let set = &self.sets[set_index];
        let valid = set.lines.iter().filter(|line| line.valid).count();
        (valid, set.ways_per_core)
    }

    /// Prints this cache's statistics under `label`.
    pub fn print_stats(&self, label: &str) {
        self.stats.print(label);
    }
}
