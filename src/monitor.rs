use std::{
    fs,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::{
    record::parse_log,
    report::{aggregate, Baseline, CycleContext, PriorCycle, Report},
};

pub const DEFAULT_LOG_FILE: &str = "./efficient_addresses.txt";
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub file: PathBuf,
    pub interval_secs: u64,
    pub output: OutputMode,
    /// Stop after this many cycles; `None` runs until the process is killed.
    pub max_cycles: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
            interval_secs: DEFAULT_INTERVAL_SECS,
            output: OutputMode::Text,
            max_cycles: None,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(anyhow!("--interval must be greater than 0"));
        }
        if self.max_cycles == Some(0) {
            return Err(anyhow!("--cycles must be greater than 0"));
        }
        Ok(())
    }
}

/// State carried between cycles. Only the polling loop touches it.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub started: Instant,
    pub cycle: u64,
    pub baseline: Option<Baseline>,
    pub previous: Option<PriorCycle>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            cycle: 0,
            baseline: None,
            previous: None,
        }
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Monitor {
    config: MonitorConfig,
    state: MonitorState,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: MonitorState::new(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Re-read the whole log and produce this cycle's report.
    ///
    /// The cycle counter advances whether or not the read succeeds, so rates
    /// keep tracking wall-clock intervals across failed polls.
    pub fn poll(&mut self) -> Result<Report> {
        let cycle = self.state.cycle;
        self.state.cycle += 1;

        let content = fs::read_to_string(&self.config.file)
            .with_context(|| format!("Unable to read log {}", self.config.file.display()))?;
        let log = parse_log(&content);
        if log.skipped > 0 {
            debug!(cycle, skipped = log.skipped, "malformed lines skipped");
        }

        let ctx = CycleContext {
            cycle,
            interval_secs: self.config.interval_secs,
            runtime: self.state.started.elapsed(),
        };
        let report = aggregate(
            &log,
            &ctx,
            self.state.previous.as_ref(),
            self.state.baseline.as_ref(),
        );

        if self.state.baseline.is_none() {
            info!(
                cycle,
                submissions = report.baseline.submissions,
                total_rewards = %report.baseline.total_rewards,
                "baseline established"
            );
            self.state.baseline = Some(report.baseline);
        }
        self.state.previous = Some(report.summary());

        Ok(report)
    }
}

/// Poll, print and sleep until `max_cycles` is reached or the process is
/// terminated. Read failures are logged and retried on the next tick.
pub fn run(config: MonitorConfig) -> Result<()> {
    config.validate()?;
    let interval = Duration::from_secs(config.interval_secs);
    let mut monitor = Monitor::new(config);

    loop {
        match monitor.poll() {
            Ok(report) => print_report(&report, monitor.config().output),
            Err(err) => warn!("skipping cycle: {err:#}"),
        }

        if let Some(max) = monitor.config().max_cycles {
            if monitor.state().cycle >= max {
                return Ok(());
            }
        }
        thread::sleep(interval);
    }
}

fn print_report(report: &Report, output: OutputMode) {
    match output {
        OutputMode::Text => println!("\n\n\n{report}"),
        OutputMode::Json => match serde_json::to_string(report) {
            Ok(line) => println!("STATS {line}"),
            Err(err) => warn!(error = %err, "failed to serialize report"),
        },
    }
}
