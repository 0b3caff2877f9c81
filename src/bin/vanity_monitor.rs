use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vanity_monitor::{
    monitor::{DEFAULT_INTERVAL_SECS, DEFAULT_LOG_FILE},
    MonitorConfig, OutputMode,
};

#[derive(Parser, Debug)]
#[command(name = "vanity_monitor")]
#[command(about = "Watch a CREATE2 vanity miner's output and report reward statistics", long_about = None)]
struct Args {
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    file: PathBuf,

    /// Seconds between polls
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval: u64,

    #[arg(long)]
    stats_json: bool,

    /// Stop after this many polls
    #[arg(long, conflicts_with = "once")]
    cycles: Option<u64>,

    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config = MonitorConfig {
        file: args.file,
        interval_secs: args.interval,
        output: if args.stats_json {
            OutputMode::Json
        } else {
            OutputMode::Text
        },
        max_cycles: if args.once { Some(1) } else { args.cycles },
    };
    config.validate()?;

    println!("Monitoring vanity miner output...");
    println!("File      : {}", config.file.display());
    println!("Interval  : {}s", config.interval_secs);
    println!(
        "Output    : {}",
        match config.output {
            OutputMode::Text => "text",
            OutputMode::Json => "json",
        }
    );
    if let Some(max) = config.max_cycles {
        println!("Cycles    : {}", max);
    }

    vanity_monitor::run(config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
