use std::{fs, io::Write, path::Path};

use tempfile::{tempdir, NamedTempFile};
use vanity_monitor::{Monitor, MonitorConfig, OutputMode};

fn miner_line(salt_tail: u64, address_payload: &str, reward: u64) -> String {
    format!("0x{salt_tail:064x} => 0x{address_payload} => {reward}\n")
}

fn config_for(path: &Path) -> MonitorConfig {
    MonitorConfig {
        file: path.to_path_buf(),
        interval_secs: 10,
        output: OutputMode::Text,
        max_cycles: None,
    }
}

#[test]
fn poll_reports_current_file_contents() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(miner_line(1, &"ab".repeat(20), 2).as_bytes()).unwrap();
    file.write_all(miner_line(2, &format!("0000{}", "cd".repeat(18)), 5).as_bytes())
        .unwrap();
    file.write_all(b"garbage\n").unwrap();
    file.flush().unwrap();

    let mut monitor = Monitor::new(config_for(file.path()));
    let report = monitor.poll().unwrap();

    assert_eq!(report.cycle, 0);
    assert_eq!(report.submissions, 2);
    assert_eq!(report.total_rewards, 7);
    assert_eq!(report.skipped_lines, 1);

    let best = report.best.as_ref().unwrap();
    assert_eq!(best.line, 2);
    assert_eq!(best.leading_zero_bytes, 2);
    assert_eq!(best.total_zero_bytes, 2);
    assert_eq!(best.salt, format!("0x{:064x}", 2));
}

#[test]
fn appended_lines_show_up_as_run_deltas() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(miner_line(1, &"ab".repeat(20), 3).as_bytes()).unwrap();
    file.flush().unwrap();

    let mut monitor = Monitor::new(config_for(file.path()));
    let first = monitor.poll().unwrap();
    assert_eq!(first.submissions_this_run, 0);
    assert_eq!(first.submission_rate, None);

    file.write_all(miner_line(2, &"00".repeat(20), 4).as_bytes()).unwrap();
    file.write_all(miner_line(3, &"ab".repeat(20), 2).as_bytes()).unwrap();
    file.flush().unwrap();

    let second = monitor.poll().unwrap();
    assert_eq!(second.cycle, 1);
    assert_eq!(second.baseline, first.baseline);
    assert_eq!(second.submissions_this_run, 2);
    assert_eq!(second.rewards_this_run, 6);
    assert_eq!(second.submission_rate, Some(0.2));
    assert_eq!(second.run_reward_ratio, Some(3.0));
    assert_eq!(second.since_last_poll.unwrap().submissions, 2);
}

#[test]
fn missing_file_fails_the_cycle_but_not_the_monitor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("efficient_addresses.txt");

    let mut monitor = Monitor::new(config_for(&path));
    let err = monitor.poll().unwrap_err();
    assert!(format!("{err:#}").contains("Unable to read log"));
    assert_eq!(monitor.state().cycle, 1);
    assert!(monitor.state().baseline.is_none());

    fs::write(&path, miner_line(1, &"ab".repeat(20), 1)).unwrap();
    let report = monitor.poll().unwrap();
    assert_eq!(report.baseline.cycle, 1);
    assert_eq!(report.submission_rate, None);
}

#[test]
fn rewards_beyond_u64_are_summed_exactly() {
    let mut file = NamedTempFile::new().unwrap();
    let mut monitor = Monitor::new(config_for(file.path()));
    monitor.poll().unwrap();

    let huge = 10_000_000_000_000_000_000u64;
    file.write_all(miner_line(1, &"ab".repeat(20), huge).as_bytes()).unwrap();
    file.write_all(miner_line(2, &"ab".repeat(20), huge).as_bytes()).unwrap();
    file.flush().unwrap();

    let report = monitor.poll().unwrap();
    assert_eq!(report.total_rewards, 2 * u128::from(huge));
    assert_eq!(report.rewards_this_run, 2 * i128::from(huge));
    assert!(report.rewards_this_run > 0);
}

#[test]
fn empty_file_reports_nothing_found() {
    let file = NamedTempFile::new().unwrap();
    let mut monitor = Monitor::new(config_for(file.path()));
    let report = monitor.poll().unwrap();

    assert_eq!(report.submissions, 0);
    assert_eq!(report.total_reward_ratio, 0.0);
    assert!(report.to_string().contains("no valuable submissions found yet"));
}

#[test]
fn run_stops_after_requested_cycles() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(miner_line(1, &"ab".repeat(20), 1).as_bytes()).unwrap();
    file.flush().unwrap();

    let config = MonitorConfig {
        max_cycles: Some(1),
        output: OutputMode::Json,
        ..config_for(file.path())
    };
    vanity_monitor::run(config).unwrap();
}

#[test]
fn zero_interval_is_rejected() {
    let config = MonitorConfig {
        interval_secs: 0,
        ..MonitorConfig::default()
    };
    assert!(config.validate().is_err());
    assert!(vanity_monitor::run(config).is_err());
}
