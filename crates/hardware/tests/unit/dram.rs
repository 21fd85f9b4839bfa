//! DRAM Timing Unit Tests.
//!
//! Verifies the per-bank row-buffer state machine under both page policies
//! and the fixed-latency model. Line addresses map to banks as
//! `row = line_addr >> 4`, `bank = row % 16` (16 banks).

use memsim_core::config::{DramConfig, PagePolicy};
use memsim_core::dram::Dram;

/// Small distinct timings keep the expected sums readable:
/// cold = bus+act+cas = 16, row hit = bus+cas = 6, conflict = bus+pre+act+cas = 24.
fn timings(page_policy: PagePolicy) -> DramConfig {
    DramConfig {
        page_policy,
        t_act: 10,
        t_cas: 5,
        t_pre: 8,
        t_bus: 1,
        fixed_latency: 100,
    }
}

// ══════════════════════════════════════════════════════════
// 1. Open Page
// ══════════════════════════════════════════════════════════

/// First touch activates the row; a second access to the same row pays only
/// CAS on top of the bus.
#[test]
fn open_page_row_hit() {
    let mut dram = Dram::banked(&timings(PagePolicy::OpenPage));

    assert_eq!(dram.access(0, false), 16); // bank idle: ACT+CAS+BUS
    assert_eq!(dram.access(1, false), 6); // same row (0..15 >> 4 == 0): CAS+BUS
    assert_eq!(dram.access(15, false), 6);
}

/// Touching a different row in the same bank pays the full
/// precharge/activate/select sequence and replaces the open row.
#[test]
fn open_page_row_conflict() {
    let mut dram = Dram::banked(&timings(PagePolicy::OpenPage));

    assert_eq!(dram.access(0, false), 16); // row 0, bank 0
    assert_eq!(dram.access(256, false), 24); // row 16, bank 0: conflict
    assert_eq!(dram.access(257, false), 6); // row 16 now open
    assert_eq!(dram.access(0, false), 24); // back to row 0: conflict again
}

/// Banks hold their rows independently.
#[test]
fn open_page_banks_are_independent() {
    let mut dram = Dram::banked(&timings(PagePolicy::OpenPage));

    assert_eq!(dram.access(0, false), 16); // row 0, bank 0
    assert_eq!(dram.access(16, false), 16); // row 1, bank 1
    assert_eq!(dram.access(1, false), 6, "bank 0's row survived");
    assert_eq!(dram.access(17, false), 6, "bank 1's row survived");
}

// ══════════════════════════════════════════════════════════
// 2. Close Page
// ══════════════════════════════════════════════════════════

/// Close page never reuses a row: consecutive same-row accesses both pay
/// ACT+CAS, where open page would have paid CAS alone the second time.
#[test]
fn close_page_never_reuses_rows() {
    let mut dram = Dram::banked(&timings(PagePolicy::ClosePage));

    assert_eq!(dram.access(0, false), 16);
    assert_eq!(dram.access(1, false), 16);
    assert_eq!(dram.access(0, false), 16);
}

// ══════════════════════════════════════════════════════════
// 3. Fixed Latency
// ══════════════════════════════════════════════════════════

/// The fixed model charges a flat delay regardless of address pattern.
#[test]
fn fixed_latency_is_flat() {
    let mut dram = Dram::fixed(&timings(PagePolicy::OpenPage));

    assert_eq!(dram.access(0, false), 100);
    assert_eq!(dram.access(0, false), 100);
    assert_eq!(dram.access(0xdead, false), 100);
}

// ══════════════════════════════════════════════════════════
// 4. Statistics
// ══════════════════════════════════════════════════════════

/// Reads and writes accumulate counts and delay totals separately.
#[test]
fn stats_split_reads_and_writes() {
    let mut dram = Dram::banked(&timings(PagePolicy::OpenPage));

    let _ = dram.access(0, false); // 16
    let _ = dram.access(1, false); // 6
    let _ = dram.access(2, true); // 6

    assert_eq!(dram.stats.read_access, 2);
    assert_eq!(dram.stats.read_delay, 22);
    assert_eq!(dram.stats.write_access, 1);
    assert_eq!(dram.stats.write_delay, 6);
}
