//! Live statistics for a CREATE2 vanity miner's `efficient_addresses.txt`.
//!
//! The miner appends one `salt => address => reward` line per candidate; this
//! crate re-reads the whole file on every tick and reports reward buckets,
//! throughput since start-up and the best candidate found so far.

pub mod monitor;
pub mod record;
pub mod report;

pub use monitor::{run, Monitor, MonitorConfig, MonitorState, OutputMode};
pub use record::{extract, parse_log, ExtractError, ParsedLog, Record};
pub use report::{aggregate, Baseline, CycleContext, PriorCycle, Report};
