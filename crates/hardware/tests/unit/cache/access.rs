//! Cache Access Unit Tests.
//!
//! Verifies hit/miss detection, per-core line ownership, dirty-bit and
//! eviction bookkeeping, writeback address reconstruction, and the
//! occupancy invariant. The cache operates on *line* addresses throughout;
//! `now` is the externally advanced cycle passed into every operation.

use memsim_core::cache::Cache;
use memsim_core::common::CacheResult;
use memsim_core::config::{CacheConfig, ReplacementPolicy};
use proptest::prelude::*;

/// 2 sets x 2 ways of 64-byte lines: set = line & 1, tag = line >> 1.
fn small_cache() -> Cache {
    let config = CacheConfig {
        size_bytes: 256,
        ways: 2,
        policy: ReplacementPolicy::Lru,
    };
    Cache::new(&config, 64, 0).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Hit/Miss Detection
// ══════════════════════════════════════════════════════════

/// First probe of any line is a miss; after an install it hits.
#[test]
fn cold_miss_then_hit_after_install() {
    let mut cache = small_cache();

    assert_eq!(cache.access(5, false, 0, 1), CacheResult::Miss);
    cache.install(5, false, 0, 2);
    assert_eq!(cache.access(5, false, 0, 3), CacheResult::Hit);
}

/// A probe never installs: repeated misses to the same line stay misses.
#[test]
fn access_does_not_install() {
    let mut cache = small_cache();

    assert_eq!(cache.access(5, false, 0, 1), CacheResult::Miss);
    assert_eq!(cache.access(5, false, 0, 2), CacheResult::Miss);
    assert!(!cache.contains(5, 0));
}

/// Access counters update on every probe; miss counters only on misses.
#[test]
fn statistics_track_probes_and_misses() {
    let mut cache = small_cache();

    let _ = cache.access(5, false, 0, 1); // read miss
    cache.install(5, false, 0, 1);
    let _ = cache.access(5, false, 0, 2); // read hit
    let _ = cache.access(5, true, 0, 3); // write hit
    let _ = cache.access(7, true, 0, 4); // write miss

    assert_eq!(cache.stats.read_access, 2);
    assert_eq!(cache.stats.read_miss, 1);
    assert_eq!(cache.stats.write_access, 2);
    assert_eq!(cache.stats.write_miss, 1);
}

// ══════════════════════════════════════════════════════════
// 2. Per-Core Ownership
// ══════════════════════════════════════════════════════════

/// A line installed for core 1 does not hit for core 0, even though the tag
/// matches: the shared array keeps the cores' lines distinct.
#[test]
fn owner_mismatch_misses_on_matching_tag() {
    let mut cache = small_cache();

    cache.install(5, false, 1, 1);
    assert_eq!(cache.access(5, false, 0, 2), CacheResult::Miss);
    assert_eq!(cache.access(5, false, 1, 3), CacheResult::Hit);
}

/// Both cores can hold the same tag in the same set simultaneously.
#[test]
fn same_tag_coexists_per_core() {
    let mut cache = small_cache();

    cache.install(5, false, 0, 1);
    cache.install(5, false, 1, 2);

    assert!(cache.contains(5, 0));
    assert!(cache.contains(5, 1));
    let (valid, per_core) = cache.set_occupancy(1); // line 5 maps to set 1
    assert_eq!(valid, 2);
    assert_eq!(per_core, [1, 1]);
}

// ══════════════════════════════════════════════════════════
// 3. Dirty Lines and Writebacks
// ══════════════════════════════════════════════════════════

/// A write hit marks the line dirty; evicting it later counts a dirty
/// eviction and yields a reconstructable writeback address.
#[test]
fn write_hit_dirties_line_until_eviction() {
    let mut cache = small_cache();

    cache.install(6, false, 0, 1); // set 0, tag 3, clean
    assert_eq!(cache.access(6, true, 0, 2), CacheResult::Hit);

    cache.install(8, false, 0, 3); // set 0, tag 4, fills way 1
    assert_eq!(cache.stats.dirty_evicts, 0);

    // Set 0 is full; LRU victim is line 6 (older than line 8).
    cache.install(10, false, 0, 4); // set 0, tag 5
    assert_eq!(cache.stats.dirty_evicts, 1);
    assert_eq!(cache.writeback_line_addr(10), Some(6));
}

/// Clean evictions leave no writeback address.
#[test]
fn clean_eviction_has_no_writeback() {
    let mut cache = small_cache();

    cache.install(6, false, 0, 1);
    cache.install(8, false, 0, 2);
    cache.install(10, false, 0, 3); // evicts clean line 6

    assert_eq!(cache.stats.dirty_evicts, 0);
    assert_eq!(cache.writeback_line_addr(10), None);
}

/// A write install is dirty from the start.
#[test]
fn write_install_is_dirty() {
    let mut cache = small_cache();

    cache.install(6, true, 0, 1);
    cache.install(8, false, 0, 2);
    cache.install(10, false, 0, 3); // evicts dirty line 6

    assert_eq!(cache.stats.dirty_evicts, 1);
    assert_eq!(cache.writeback_line_addr(10), Some(6));
}

/// The evicted-line snapshot reflects the displaced line's fields.
#[test]
fn last_evicted_snapshot() {
    let mut cache = small_cache();

    cache.install(6, true, 1, 7);
    cache.install(8, false, 0, 8);
    cache.install(10, false, 0, 9);

    let victim = cache.last_evicted();
    assert!(victim.valid);
    assert!(victim.dirty);
    assert_eq!(victim.tag, 3);
    assert_eq!(victim.owner, 1);
    assert_eq!(victim.last_access, 7);
}

// ══════════════════════════════════════════════════════════
// 4. Occupancy Invariant
// ══════════════════════════════════════════════════════════

/// Per-core occupancy counters follow installs and evictions.
#[test]
fn occupancy_follows_install_and_evict() {
    let mut cache = small_cache();

    cache.install(6, false, 0, 1);
    cache.install(8, false, 1, 2);
    assert_eq!(cache.set_occupancy(0), (2, [1, 1]));

    // Evicts line 6 (core 0's, the older) and installs for core 1.
    cache.install(10, false, 1, 3);
    assert_eq!(cache.set_occupancy(0), (2, [0, 2]));
}

proptest! {
    /// Under any access/install stream, no set exceeds its way count and
    /// the per-core counters always sum to the valid-line count.
    #[test]
    fn occupancy_invariant_holds(
        ops in proptest::collection::vec((0u64..64, any::<bool>(), 0usize..2), 1..200)
    ) {
        let config = CacheConfig {
            size_bytes: 1024,
            ways: 4,
            policy: ReplacementPolicy::Lru,
        };
        let mut cache = Cache::new(&config, 64, 0).unwrap();

        for (now, &(line_addr, is_write, core_id)) in ops.iter().enumerate() {
            let now = now as u64;
            if cache.access(line_addr, is_write, core_id, now) == CacheResult::Miss {
                cache.install(line_addr, is_write, core_id, now);
            }

            for set in 0..cache.num_sets() {
                let (valid, per_core) = cache.set_occupancy(set);
                prop_assert!(valid <= cache.ways());
                prop_assert_eq!(valid as u32, per_core[0] + per_core[1]);
            }
        }
    }
}
