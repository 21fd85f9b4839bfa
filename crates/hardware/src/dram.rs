//! DRAM timing model.
//!
//! Models a DRAM module as an array of banks, each with a row buffer holding
//! the currently open row. Access latency depends on the page policy and the
//! bank's row-buffer state:
//!
//! - **Open page** keeps the accessed row open, so back-to-back accesses to
//!   the same row in the same bank pay only CAS; a different row pays the
//!   full precharge/activate/select sequence.
//! - **Close page** closes the row after every access, so row locality is
//!   never exploited and every access pays ACT + CAS.
//!
//! The fixed-latency model bypasses the banks entirely and charges a flat
//! delay per access; statistics accumulate in both models.

use crate::config::{DramConfig, PagePolicy};

/// Number of banks in the DRAM module.
pub const NUM_BANKS: usize = 16;

/// Per-bank row buffer: the currently open row, if any.
#[derive(Debug, Clone, Copy, Default)]
struct RowBuffer {
    valid: bool,
    row_id: u64,
}

/// Cumulative DRAM access statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DramStats {
    /// Read accesses served.
    pub read_access: u64,
    /// Total cycles spent on reads.
    pub read_delay: u64,
    /// Write accesses served.
    pub write_access: u64,
    /// Total cycles spent on writes.
    pub write_delay: u64,
}

impl DramStats {
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
        let avg_read_delay = average(self.read_delay, self.read_access);
        let avg_write_delay = average(self.write_delay, self.write_access);

        println!();
        println!("DRAM_READ_ACCESS     \t\t : {:10}", self.read_access);
        println!("DRAM_WRITE_ACCESS    \t\t : {:10}", self.write_access);
        println!("DRAM_READ_DELAY_AVG  \t\t : {avg_read_delay:10.3}");
        println!("DRAM_WRITE_DELAY_AVG \t\t : {avg_write_delay:10.3}");
    }
}

/// Which latency model the module applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DramModel {
    /// Flat delay per access, no bank state.
    Fixed,
    /// Per-bank row-buffer timing under the configured page policy.
    Banked,
}

/// A DRAM module: 16 banks of row-buffer state plus timing parameters.
#[derive(Debug, Clone)]
pub struct Dram {
    model: DramModel,
    page_policy: PagePolicy,
    banks: [RowBuffer; NUM_BANKS],
    bank_bits: u32,
    t_act: u64,
    t_cas: u64,
    t_pre: u64,
    t_bus: u64,
    fixed_latency: u64,
    /// Cumulative read/write counters and delay totals.
    pub stats: DramStats,
}

impl Dram {
    /// Builds a DRAM module charging a flat `fixed_latency` per access.
    pub fn fixed(config: &DramConfig) -> Self {
        Self::build(config, DramModel::Fixed)
    }

    /// Builds a DRAM module with banked row-buffer timing under the
    /// configured page policy.
    pub fn banked(config: &DramConfig) -> Self {
        Self::build(config, DramModel::Banked)
    }

    fn build(config: &DramConfig, model: DramModel) -> Self {
        Self {
            model,
            page_policy: config.page_policy,
            banks: [RowBuffer::default(); NUM_BANKS],
            bank_bits: (NUM_BANKS as u64).trailing_zeros(),
            t_act: config.t_act,
            t_cas: config.t_cas,
            t_pre: config.t_pre,
            t_bus: config.t_bus,
            fixed_latency: config.fixed_latency,
            stats: DramStats::default(),
        }
    }

    /// Accesses the cache line at `line_addr` and returns the delay in
    /// cycles.
    ///
    /// The delay is also accumulated into the read or write statistics
    /// according to `is_write`.
    pub fn access(&mut self, line_addr: u64, is_write: bool) -> u64 {
        let delay = match self.model {
            DramModel::Fixed => self.fixed_latency,
            DramModel::Banked => self.banked_access(line_addr),
        };

        if is_write {
            self.stats.write_access += 1;
            self.stats.write_delay += delay;
        } else {
            self.stats.read_access += 1;
            self.stats.read_delay += delay;
        }
        delay
    }

    /// Row-buffer state machine shared by the timed modes.
    ///
    /// The row is the line address above the bank bits; the bank is the row
    /// modulo the bank count. Every banked access pays the bus delay on top
    /// of the policy-dependent portion. Under open page, a conflict pays
    /// precharge before activate before column select.
    fn banked_access(&mut self, line_addr: u64) -> u64 {
        let row_id = line_addr >> self.bank_bits;
        let bank_id = (row_id as usize) % NUM_BANKS;
        let bank = &mut self.banks[bank_id];

        let mut delay = self.t_bus;
        match self.page_policy {
            PagePolicy::OpenPage => {
                if bank.valid {
                    if bank.row_id == row_id {
                        // Row hit.
                        delay += self.t_cas;
                    } else {
                        // Row conflict: close the open row, open the new one.
                        tracing::debug!(bank_id, row_id, open_row = bank.row_id, "row conflict");
                        delay += self.t_pre + self.t_act + self.t_cas;
                        bank.row_id = row_id;
                    }
                } else {
                    // Bank idle: open the row.
                    delay += self.t_act + self.t_cas;
                    bank.row_id = row_id;
                    bank.valid = true;
                }
            }
            PagePolicy::ClosePage => {
                delay += self.t_act + self.t_cas;
                bank.row_id = row_id;
                bank.valid = false;
            }
        }
        delay
    }

    /// Prints the DRAM statistics.
    pub fn print_stats(&self) {
        self.stats.print();
    }
}
