use std::{collections::BTreeMap, fmt, time::Duration};

use serde::Serialize;

use crate::record::{ParsedLog, Record};

/// Submission count and reward total at the first successful cycle. Every
/// "this run" figure is measured against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Baseline {
    pub cycle: u64,
    pub submissions: usize,
    pub total_rewards: u128,
}

/// Scalars kept from the previous successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorCycle {
    pub submissions: usize,
    pub total_rewards: u128,
}

/// Where in the polling loop a report is produced.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext {
    /// 0-based tick of the polling loop.
    pub cycle: u64,
    pub interval_secs: u64,
    pub runtime: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub score: u128,
    pub count: usize,
    pub rewards: u128,
    /// Share of all rewards, in percent with two decimals.
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalDelta {
    pub submissions: i128,
    pub rewards: i128,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub cycle: u64,
    pub runtime_minutes: f64,
    pub submissions: usize,
    pub total_rewards: u128,
    pub total_reward_ratio: f64,
    pub submissions_this_run: i128,
    pub rewards_this_run: i128,
    pub submission_rate: Option<f64>,
    pub reward_rate: Option<f64>,
    pub run_reward_ratio: Option<f64>,
    pub since_last_poll: Option<IntervalDelta>,
    pub buckets: Vec<Bucket>,
    pub best: Option<Record>,
    pub skipped_lines: usize,
    pub baseline: Baseline,
}

impl Report {
    pub fn summary(&self) -> PriorCycle {
        PriorCycle {
            submissions: self.submissions,
            total_rewards: self.total_rewards,
        }
    }
}

/// Build the report for one cycle.
///
/// `baseline` is `None` until the first successful cycle; the returned
/// report then carries the freshly established baseline in
/// [`Report::baseline`] and the caller is expected to keep it.
pub fn aggregate(
    log: &ParsedLog,
    ctx: &CycleContext,
    previous: Option<&PriorCycle>,
    baseline: Option<&Baseline>,
) -> Report {
    let records = &log.records;

    // score -> (count, sum of scores); ascending iteration order
    let mut by_score: BTreeMap<u128, (usize, u128)> = BTreeMap::new();
    for record in records {
        let entry = by_score.entry(record.score).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(record.score);
    }
    // Scores with no records contribute nothing, so summing the observed
    // buckets in order equals summing over 0..=max.
    let total_rewards = by_score
        .values()
        .fold(0u128, |sum, (_, rewards)| sum.saturating_add(*rewards));
    let submissions = records.len();

    let baseline = baseline.copied().unwrap_or(Baseline {
        cycle: ctx.cycle,
        submissions,
        total_rewards,
    });

    let submissions_this_run = signed_diff(submissions as u128, baseline.submissions as u128);
    let rewards_this_run = signed_diff(total_rewards, baseline.total_rewards);

    let elapsed_secs = ctx
        .cycle
        .saturating_sub(baseline.cycle)
        .saturating_mul(ctx.interval_secs);
    let (submission_rate, reward_rate) = if elapsed_secs > 0 {
        (
            Some(round_to(submissions_this_run as f64 / elapsed_secs as f64, 4)),
            Some(round_to(rewards_this_run as f64 / elapsed_secs as f64, 4)),
        )
    } else {
        (None, None)
    };

    let run_reward_ratio = (submissions_this_run > 0)
        .then(|| round_to(rewards_this_run as f64 / submissions_this_run as f64, 4));

    let total_reward_ratio = if submissions > 0 {
        round_to(total_rewards as f64 / submissions as f64, 4)
    } else {
        0.0
    };

    let since_last_poll = previous.map(|prior| IntervalDelta {
        submissions: signed_diff(submissions as u128, prior.submissions as u128),
        rewards: signed_diff(total_rewards, prior.total_rewards),
    });

    let buckets = by_score
        .into_iter()
        .map(|(score, (count, rewards))| Bucket {
            score,
            count,
            rewards,
            percent: percent_of(rewards, total_rewards),
        })
        .collect();

    Report {
        cycle: ctx.cycle,
        runtime_minutes: round_to(ctx.runtime.as_secs_f64() / 60.0, 2),
        submissions,
        total_rewards,
        total_reward_ratio,
        submissions_this_run,
        rewards_this_run,
        submission_rate,
        reward_rate,
        run_reward_ratio,
        since_last_poll,
        buckets,
        best: best_record(records).cloned(),
        skipped_lines: log.skipped,
        baseline,
    }
}

/// First record holding the highest score.
pub fn best_record(records: &[Record]) -> Option<&Record> {
    records
        .iter()
        .reduce(|best, record| if record.score > best.score { record } else { best })
}

/// `current - reference`, clamped to the `i128` range.
fn signed_diff(current: u128, reference: u128) -> i128 {
    if current >= reference {
        i128::try_from(current - reference).unwrap_or(i128::MAX)
    } else {
        i128::try_from(reference - current).map_or(i128::MIN, |d| -d)
    }
}

fn percent_of(part: u128, whole: u128) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "runtime: {:?} minutes", self.runtime_minutes)?;

        if let Some(rate) = self.submission_rate {
            writeln!(
                f,
                "valuable submissions found this run: {} or {:?} per second",
                self.submissions_this_run, rate
            )?;
        }
        match self.reward_rate {
            Some(rate) => writeln!(
                f,
                "sum of rewards this run: {} or {:?} per second",
                self.rewards_this_run, rate
            )?,
            None => writeln!(f, "sum of rewards this run: {}", self.rewards_this_run)?,
        }
        if let Some(ratio) = self.run_reward_ratio {
            writeln!(f, "reward ratio this run: {ratio:?}")?;
        }
        if let Some(delta) = self.since_last_poll {
            writeln!(
                f,
                "since last poll: {} submissions, {} rewards",
                delta.submissions, delta.rewards
            )?;
        }

        writeln!(f)?;
        writeln!(f, "total valuable submissions found: {}", self.submissions)?;
        writeln!(f, "total rewards: {}", self.total_rewards)?;
        if self.submissions > 0 {
            writeln!(f, "total reward ratio: {:?}", self.total_reward_ratio)?;
        } else {
            writeln!(f, "total reward ratio: 0")?;
        }
        if self.skipped_lines > 0 {
            writeln!(f, "skipped {} malformed lines", self.skipped_lines)?;
        }

        let width = self
            .buckets
            .iter()
            .map(|b| b.score.to_string().len())
            .max()
            .unwrap_or(1);
        writeln!(f, "total submissions by amount:")?;
        for bucket in &self.buckets {
            writeln!(f, " * {:>width$}: {}", bucket.score, bucket.count)?;
        }
        writeln!(f, "total submission rewards by %:")?;
        for bucket in &self.buckets {
            writeln!(f, " * {:>width$}: {:?}%", bucket.score, bucket.percent)?;
        }

        writeln!(f)?;
        match &self.best {
            Some(best) => {
                writeln!(f, "most valuable submission found: {}", best.score)?;
                writeln!(f, "found at line: {}", best.line)?;
                writeln!(f, " * salt: {}", best.salt)?;
                writeln!(f, " * contract address: {}", best.address)?;
                writeln!(f, " * leading zero bytes: {}", best.leading_zero_bytes)?;
                write!(f, " * total zero bytes: {}", best.total_zero_bytes)
            }
            None => write!(f, "no valuable submissions found yet"),
        }
    }
}
