//! Trace-driven front end for the memory-hierarchy simulator.
//!
//! Reads a memory-reference trace, plays it through a configured
//! [`MemorySystem`] one reference at a time, and prints the cumulative
//! statistics. The driver owns the clock: it starts at cycle 0 and advances
//! by exactly the delay each access reports.
//!
//! Trace format, one reference per line:
//!
//! ```text
//! <core> <I|L|S> <address>
//! ```
//!
//! where `core` is 0 or 1, the letter selects instruction fetch / load /
//! store, and `address` is a byte address (hex with `0x` prefix, decimal
//! otherwise). Blank lines and lines starting with `#` are skipped.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::{fs, process};

use memsim_core::config::SimMode;
use memsim_core::{AccessType, MemorySystem, MemsysConfig};

#[derive(Parser, Debug)]
#[command(
    name = "memsim",
    version,
    about = "Trace-driven memory-hierarchy timing simulator",
    long_about = "Plays a memory-reference trace through a configurable cache/DRAM \
hierarchy and reports hit/miss counts and access delays.\n\nExamples:\n  \
memsim traces/gcc.trace\n  memsim --config sweep.json traces/gcc.trace\n  \
memsim --mode two-level-timed traces/mixed.trace"
)]
struct Cli {
    /// Trace file: one `<core> <I|L|S> <address>` reference per line.
    trace: PathBuf,

    /// JSON configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the simulation mode from the configuration.
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,
}

/// Simulation mode names accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Single data cache, hit/miss counting only.
    CacheOnly,
    /// Two-level hierarchy with a flat DRAM latency.
    TwoLevelFixed,
    /// Two-level hierarchy with row-buffer DRAM timing.
    TwoLevelTimed,
    /// Two cores with private L1s and address translation.
    MultiCore,
}

impl From<ModeArg> for SimMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::CacheOnly => Self::CacheOnly,
            ModeArg::TwoLevelFixed => Self::TwoLevelFixed,
            ModeArg::TwoLevelTimed => Self::TwoLevelTimed,
            ModeArg::MultiCore => Self::MultiCore,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path),
        None => MemsysConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }

    let mut sys = MemorySystem::new(&config).unwrap_or_else(|e| {
        eprintln!("Error: invalid configuration: {e}");
        process::exit(1);
    });

    let trace = fs::read_to_string(&cli.trace).unwrap_or_else(|e| {
        eprintln!("Error reading trace {}: {e}", cli.trace.display());
        process::exit(1);
    });

    let mut cycle: u64 = 0;
    let mut references: u64 = 0;
    for (lineno, line) in trace.lines().enumerate() {
        let reference = parse_trace_line(line).unwrap_or_else(|e| {
            eprintln!("{}:{}: {e}", cli.trace.display(), lineno + 1);
            process::exit(1);
        });
        let Some((core_id, access_type, addr)) = reference else {
            continue;
        };

        let delay = sys.access(addr, access_type, core_id, cycle);
        cycle += delay;
        references += 1;
    }

    tracing::info!(references, final_cycle = cycle, "trace complete");
    println!("references             \t\t : {references:10}");
    println!("final_cycle            \t\t : {cycle:10}");
    sys.print_stats();
}

/// Loads a [`MemsysConfig`] from a JSON file, exiting on failure.
fn load_config(path: &Path) -> MemsysConfig {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {e}", path.display());
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing config {}: {e}", path.display());
        process::exit(1);
    })
}

/// Parses one trace line into `(core, kind, byte address)`.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
fn parse_trace_line(line: &str) -> Result<Option<(usize, AccessType, u64)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let (Some(core), Some(kind), Some(addr)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(format!("expected `<core> <I|L|S> <address>`, got `{line}`"));
    };
    if fields.next().is_some() {
        return Err(format!("trailing fields after address in `{line}`"));
    }

    let core_id: usize = core
        .parse()
        .map_err(|_| format!("bad core id `{core}`"))?;
    if core_id > 1 {
        return Err(format!("core id {core_id} out of range (0 or 1)"));
    }

    let access_type = match kind {
        "I" | "i" => AccessType::Ifetch,
        "L" | "l" => AccessType::Load,
        "S" | "s" => AccessType::Store,
        other => return Err(format!("bad access kind `{other}` (expected I, L, or S)")),
    };

    let addr = parse_addr(addr).ok_or_else(|| format!("bad address `{addr}`"))?;
    Ok(Some((core_id, access_type, addr)))
}

/// Parses a byte address: hex with a `0x` prefix, decimal otherwise.
fn parse_addr(field: &str) -> Option<u64> {
    if let Some(hex) = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        field.parse().ok()
    }
}
