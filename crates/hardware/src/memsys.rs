//! Memory-system orchestrator.
//!
//! Owns the caches and DRAM instantiated for the configured simulation mode
//! and composes them into per-mode access pipelines:
//!
//! - [`SimMode::CacheOnly`]: a single data cache, hit/miss counting only.
//! - [`SimMode::TwoLevelFixed`] / [`SimMode::TwoLevelTimed`]: private L1
//!   instruction/data caches over a shared L2 and DRAM, with miss fills and
//!   dirty-eviction writebacks flowing through the L2.
//! - [`SimMode::MultiCore`]: two cores with private L1s over the shared
//!   L2/DRAM, with virtual line addresses translated through a deterministic
//!   per-core page mapping before any cache probe.
//!
//! The caller owns the clock: it passes the current cycle into
//! [`MemorySystem::access`] and advances it by the returned delay.

use crate::cache::Cache;
use crate::common::{AccessType, ConfigError};
use crate::config::{MemsysConfig, SimMode};
use crate::dram::Dram;

/// Bits of the virtual page number preserved below the per-core partition.
const VPN_TAIL_BITS: u64 = 20;

/// Mask selecting the tail of a virtual page number.
const VPN_TAIL_MASK: u64 = (1 << VPN_TAIL_BITS) - 1;

/// The components owned for the configured mode.
///
/// Allocation is mode-dependent: no variant carries parts another mode would
/// leave unused.
#[derive(Debug)]
enum Hierarchy {
    /// A lone data cache; no timing, no further levels.
    CacheOnly {
        dcache: Cache,
    },
    /// Private L1 instruction/data caches, shared L2, DRAM.
    TwoLevel {
        icache: Cache,
        dcache: Cache,
        l2: Cache,
        dram: Dram,
    },
    /// Per-core private L1 instruction/data caches, shared L2, DRAM.
    MultiCore {
        icaches: Vec<Cache>,
        dcaches: Vec<Cache>,
        l2: Cache,
        dram: Dram,
    },
}

/// Fixed hit latencies charged by the two-level pipelines.
#[derive(Debug, Clone, Copy)]
struct HitLatencies {
    icache: u64,
    dcache: u64,
    l2: u64,
}

/// Cumulative memory-system statistics, bucketed by access kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemsysStats {
    /// Instruction fetches served.
    pub ifetch_access: u64,
    /// Loads served.
    pub load_access: u64,
    /// Stores served.
    pub store_access: u64,
    /// Total cycles spent on instruction fetches.
    pub ifetch_delay: u64,
    /// Total cycles spent on loads.
    pub load_delay: u64,
    /// Total cycles spent on stores.
    pub store_delay: u64,
}

impl MemsysStats {
    /// Prints the counters and average delays in the fixed report format.
    ///
    /// Averages report 0.0 when the corresponding access count is zero.
    pub fn print(&self) {
        let average = |delay: u64, access: u64| {
            if access == 0 {
                0.0
            } else {
                delay as f64 / access as f64
            }
        };
        let ifetch_delay_avg = average(self.ifetch_delay, self.ifetch_access);
        let load_delay_avg = average(self.load_delay, self.load_access);
        let store_delay_avg = average(self.store_delay, self.store_access);

        println!();
        println!("MEMSYS_IFETCH_ACCESS   \t\t : {:10}", self.ifetch_access);
        println!("MEMSYS_LOAD_ACCESS     \t\t : {:10}", self.load_access);
        println!("MEMSYS_STORE_ACCESS    \t\t : {:10}", self.store_access);
        println!("MEMSYS_IFETCH_AVGDELAY \t\t : {ifetch_delay_avg:10.3}");
        println!("MEMSYS_LOAD_AVGDELAY   \t\t : {load_delay_avg:10.3}");
        println!("MEMSYS_STORE_AVGDELAY  \t\t : {store_delay_avg:10.3}");
    }
}

/// The memory system: mode-selected hierarchy plus top-level statistics.
#[derive(Debug)]
pub struct MemorySystem {
    hierarchy: Hierarchy,
    line_bytes: u64,
    /// `log2(page_bytes / line_bytes)`: where the page number starts within
    /// a line address.
    page_offset_bits: u32,
    latencies: HitLatencies,
    /// Cumulative per-kind access counters and delay totals.
    pub stats: MemsysStats,
}

impl MemorySystem {
    /// Builds the hierarchy for `config.mode`, allocating only the
    /// components that mode uses.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed cache geometry, a page size
    /// that is not a power-of-two multiple of the line size, or a core
    /// count other than two in [`SimMode::MultiCore`].
    pub fn new(config: &MemsysConfig) -> Result<Self, ConfigError> {
        let line = config.line_bytes;
        let quota = config.swp_core0_ways;

        let hierarchy = match config.mode {
            SimMode::CacheOnly => Hierarchy::CacheOnly {
                dcache: Cache::new(&config.dcache, line, quota)?,
            },
            SimMode::TwoLevelFixed | SimMode::TwoLevelTimed => {
                let dram = if config.mode == SimMode::TwoLevelFixed {
                    Dram::fixed(&config.dram)
                } else {
                    Dram::banked(&config.dram)
                };
                Hierarchy::TwoLevel {
                    icache: Cache::new(&config.icache, line, quota)?,
                    dcache: Cache::new(&config.dcache, line, quota)?,
                    l2: Cache::new(&config.l2, line, quota)?,
                    dram,
                }
            }
            SimMode::MultiCore => {
                if config.num_cores != 2 {
                    return Err(ConfigError::UnsupportedCoreCount {
                        num_cores: config.num_cores,
                    });
                }
                let mut icaches = Vec::with_capacity(config.num_cores);
                let mut dcaches = Vec::with_capacity(config.num_cores);
                for _ in 0..config.num_cores {
                    icaches.push(Cache::new(&config.icache, line, quota)?);
                    dcaches.push(Cache::new(&config.dcache, line, quota)?);
                }
                Hierarchy::MultiCore {
                    icaches,
                    dcaches,
                    l2: Cache::new(&config.l2, line, quota)?,
                    dram: Dram::banked(&config.dram),
                }
            }
        };

        if line == 0
            || config.page_bytes % line != 0
            || !(config.page_bytes / line).is_power_of_two()
        {
            return Err(ConfigError::BadPageGeometry {
                page_bytes: config.page_bytes,
                line_bytes: line,
            });
        }

        Ok(Self {
            hierarchy,
            line_bytes: line,
            page_offset_bits: (config.page_bytes / line).trailing_zeros(),
            latencies: HitLatencies {
                icache: config.icache_hit_latency,
                dcache: config.dcache_hit_latency,
                l2: config.l2_hit_latency,
            },
            stats: MemsysStats::default(),
        })
    }

    /// Serves one memory reference and returns its delay in cycles.
    ///
    /// `addr` is a byte address; all cache transactions happen at line
    /// granularity, so it is first divided down to a line address (a virtual
    /// one in [`SimMode::MultiCore`], translated before any probe). `now` is
    /// the current cycle; the caller advances its clock by the returned
    /// delay. The delay is also accumulated into the statistics bucket for
    /// `access_type`.
    ///
    /// `core_id` must be 0 or 1.
    pub fn access(
        &mut self,
        addr: u64,
        access_type: AccessType,
        core_id: usize,
        now: u64,
    ) -> u64 {
        let line_addr = addr / self.line_bytes;
        let latencies = self.latencies;
        let page_offset_bits = self.page_offset_bits;

        let delay = match &mut self.hierarchy {
            Hierarchy::CacheOnly { dcache } => {
                access_cache_only(dcache, line_addr, access_type, core_id, now)
            }
            Hierarchy::TwoLevel {
                icache,
                dcache,
                l2,
                dram,
            } => access_two_level(
                icache,
                dcache,
                l2,
                dram,
                latencies,
                line_addr,
                access_type,
                core_id,
                now,
            ),
            Hierarchy::MultiCore {
                icaches,
                dcaches,
                l2,
                dram,
            } => {
                let p_line_addr = translate_line_addr(line_addr, core_id, page_offset_bits);
                access_two_level(
                    &mut icaches[core_id],
                    &mut dcaches[core_id],
                    l2,
                    dram,
                    latencies,
                    p_line_addr,
                    access_type,
                    core_id,
                    now,
                )
            }
        };

        match access_type {
            AccessType::Ifetch => {
                self.stats.ifetch_access += 1;
                self.stats.ifetch_delay += delay;
            }
            AccessType::Load => {
                self.stats.load_access += 1;
                self.stats.load_delay += delay;
            }
            AccessType::Store => {
                self.stats.store_access += 1;
                self.stats.store_delay += delay;
            }
        }

        delay
    }

    /// Applies the multi-core virtual-to-physical mapping to a virtual line
    /// address.
    ///
    /// Exposed for harnesses; [`MemorySystem::access`] applies it
    /// automatically in [`SimMode::MultiCore`].
    pub fn translate(&self, v_line_addr: u64, core_id: usize) -> u64 {
        translate_line_addr(v_line_addr, core_id, self.page_offset_bits)
    }

    /// The data cache serving `core_id`, if this mode has one.
    pub fn dcache(&self, core_id: usize) -> Option<&Cache> {
        match &self.hierarchy {
            Hierarchy::CacheOnly { dcache } | Hierarchy::TwoLevel { dcache, .. } => Some(dcache),
            Hierarchy::MultiCore { dcaches, .. } => dcaches.get(core_id),
        }
    }

    /// The instruction cache serving `core_id`, if this mode has one.
    pub fn icache(&self, core_id: usize) -> Option<&Cache> {
        match &self.hierarchy {
            Hierarchy::CacheOnly { .. } => None,
            Hierarchy::TwoLevel { icache, .. } => Some(icache),
            Hierarchy::MultiCore { icaches, .. } => icaches.get(core_id),
        }
    }

    /// The shared L2 cache, if this mode has one.
    pub fn l2(&self) -> Option<&Cache> {
        match &self.hierarchy {
            Hierarchy::CacheOnly { .. } => None,
            Hierarchy::TwoLevel { l2, .. } | Hierarchy::MultiCore { l2, .. } => Some(l2),
        }
    }

    /// The DRAM module, if this mode has one.
    pub fn dram(&self) -> Option<&Dram> {
        match &self.hierarchy {
            Hierarchy::CacheOnly { .. } => None,
            Hierarchy::TwoLevel { dram, .. } | Hierarchy::MultiCore { dram, .. } => Some(dram),
        }
    }

    /// Prints the memory-system statistics followed by every instantiated
    /// component's report.
    pub fn print_stats(&self) {
        self.stats.print();

        match &self.hierarchy {
            Hierarchy::CacheOnly { dcache } => {
                dcache.print_stats("DCACHE");
            }
            Hierarchy::TwoLevel {
                icache,
                dcache,
                l2,
                dram,
            } => {
                icache.print_stats("ICACHE");
                dcache.print_stats("DCACHE");
                l2.print_stats("L2CACHE");
                dram.print_stats();
            }
            Hierarchy::MultiCore {
                icaches,
                dcaches,
                l2,
                dram,
            } => {
                for (core, (icache, dcache)) in icaches.iter().zip(dcaches).enumerate() {
                    icache.print_stats(&format!("ICACHE_{core}"));
                    dcache.print_stats(&format!("DCACHE_{core}"));
                }
                l2.print_stats("L2CACHE");
                dram.print_stats();
            }
        }
    }
}

/// Single-cache pipeline: loads and stores probe the data cache and install
/// on a miss; instruction fetches are ignored (there is no instruction cache
/// in this mode). Always reports zero delay — this mode measures hit/miss
/// counts only.
fn access_cache_only(
    dcache: &mut Cache,
    line_addr: u64,
    access_type: AccessType,
    core_id: usize,
    now: u64,
) -> u64 {
    let is_write = match access_type {
        AccessType::Ifetch => return 0,
        AccessType::Load => false,
        AccessType::Store => true,
    };

    if !dcache.access(line_addr, is_write, core_id, now).is_hit() {
        dcache.install(line_addr, is_write, core_id, now);
    }
    0
}

/// Two-level pipeline shared by the private-L1 modes.
///
/// The L1 hit latency is charged up front. A miss adds a full
/// [`l2_access`] for the fill, then installs into the L1; for loads and
/// stores, a valid dirty line displaced by that install is written back to
/// the L2. Writeback delay stays off the critical path of the triggering
/// access.
#[allow(clippy::too_many_arguments)]
fn access_two_level(
    icache: &mut Cache,
    dcache: &mut Cache,
    l2: &mut Cache,
    dram: &mut Dram,
    latencies: HitLatencies,
    line_addr: u64,
    access_type: AccessType,
    core_id: usize,
    now: u64,
) -> u64 {
    let (l1, is_write, hit_latency, writeback_on_evict) = match access_type {
        AccessType::Ifetch => (icache, false, latencies.icache, false),
        AccessType::Load => (dcache, false, latencies.dcache, true),
        AccessType::Store => (dcache, true, latencies.dcache, true),
    };

    let mut delay = hit_latency;
    if !l1.access(line_addr, is_write, core_id, now).is_hit() {
        delay += l2_access(l2, dram, latencies.l2, line_addr, false, core_id, now);
        l1.install(line_addr, is_write, core_id, now);

        if writeback_on_evict {
            if let Some(wb_addr) = l1.writeback_line_addr(line_addr) {
                tracing::debug!(wb_addr, core_id, "L1 writeback to L2");
                let _ = l2_access(l2, dram, latencies.l2, wb_addr, true, core_id, now);
            }
        }
    }
    delay
}

/// Shared L2 access: the single path all L1 misses and all DRAM traffic
/// flow through.
///
/// Charges the L2 hit latency; a miss adds a DRAM read for the fill,
/// installs the line (dirty when `is_writeback`), and writes a valid dirty
/// L2 victim straight to DRAM.
fn l2_access(
    l2: &mut Cache,
    dram: &mut Dram,
    l2_hit_latency: u64,
    line_addr: u64,
    is_writeback: bool,
    core_id: usize,
    now: u64,
) -> u64 {
    let mut delay = l2_hit_latency;
    if !l2.access(line_addr, is_writeback, core_id, now).is_hit() {
        delay += dram.access(line_addr, false);
        l2.install(line_addr, is_writeback, core_id, now);

        if let Some(wb_addr) = l2.writeback_line_addr(line_addr) {
            tracing::debug!(wb_addr, "L2 writeback to DRAM");
            let _ = dram.access(wb_addr, true);
        }
    }
    delay
}

/// Maps a virtual line address to a physical one for the two-core mode.
///
/// The virtual page number splits into a 20-bit tail and the remaining high
/// bits; `pfn = tail + (core << 21) + (head << 21)`. Placing the core bit
/// above the tail guarantees the two cores never alias a physical frame,
/// while the head bits survive above the per-core partition.
fn translate_line_addr(v_line_addr: u64, core_id: usize, page_offset_bits: u32) -> u64 {
    let offset_mask = (1u64 << page_offset_bits) - 1;
    let vpn = v_line_addr >> page_offset_bits;

    let tail = vpn & VPN_TAIL_MASK;
    let head = vpn >> VPN_TAIL_BITS;
    let pfn = tail + ((core_id as u64) << (VPN_TAIL_BITS + 1)) + (head << (VPN_TAIL_BITS + 1));

    (pfn << page_offset_bits) | (v_line_addr & offset_mask)
}
