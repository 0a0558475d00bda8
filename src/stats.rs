//! Run counters and throughput sampling.
//!
//! Counters are updated with atomic increments only, never read-modify-write
//! under a lock. The sampler and status line are purely observational: they
//! read the counters on a timer and exert no backpressure on the engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Sampling interval for the throughput windows.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Monotonic counters shared by every component of the run.
#[derive(Debug, Default)]
pub struct Counters {
    total_tested: AtomicU64,
    found: AtomicU64,
    wordlist_len: AtomicU64,
    dir_progress: AtomicU64,
    per_second_short: AtomicU64,
    per_second_long: AtomicU64,
}

impl Counters {
    /// Creates a fresh set of counters, all zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the total-tested counter. Called exactly once per probe
    /// attempt by the executor.
    pub fn record_tested(&self) {
        self.total_tested.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of probe attempts so far.
    #[must_use]
    pub fn total_tested(&self) -> u64 {
        self.total_tested.load(Ordering::SeqCst)
    }

    /// Increments the confirmed-good counter.
    pub fn record_found(&self) {
        self.found.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of confirmed-good outcomes so far.
    #[must_use]
    pub fn found(&self) -> u64 {
        self.found.load(Ordering::SeqCst)
    }

    /// Records the number of candidates one full sweep generates (words
    /// expanded by extensions and slash variants), used for per-directory
    /// ETA reporting.
    pub fn set_wordlist_len(&self, len: u64) {
        self.wordlist_len.store(len, Ordering::SeqCst);
    }

    /// Sweep candidate count as recorded at startup; zero in spider-only
    /// mode.
    #[must_use]
    pub fn wordlist_len(&self) -> u64 {
        self.wordlist_len.load(Ordering::SeqCst)
    }

    /// Resets the per-directory progress counter at sweep start.
    pub fn reset_dir_progress(&self) {
        self.dir_progress.store(0, Ordering::SeqCst);
    }

    /// Advances the per-directory progress counter by one candidate.
    pub fn record_dir_progress(&self) {
        self.dir_progress.fetch_add(1, Ordering::SeqCst);
    }

    /// Candidates tested so far in the current sweep (single-directory mode
    /// only).
    #[must_use]
    pub fn dir_progress(&self) -> u64 {
        self.dir_progress.load(Ordering::SeqCst)
    }

    /// Requests per second over the last sample window.
    #[must_use]
    pub fn per_second_short(&self) -> u64 {
        self.per_second_short.load(Ordering::SeqCst)
    }

    /// Requests per second averaged over the whole run.
    #[must_use]
    pub fn per_second_long(&self) -> u64 {
        self.per_second_long.load(Ordering::SeqCst)
    }

    fn store_samples(&self, short: u64, long: u64) {
        self.per_second_short.store(short, Ordering::SeqCst);
        self.per_second_long.store(long, Ordering::SeqCst);
    }
}

/// Spawns the throughput sampler.
///
/// Every second it derives a short-window rate (delta since the previous
/// sample) and a long-window rate (average since start) from the
/// total-tested counter. Runs until `stop` is set.
pub fn spawn_sampler(counters: Arc<Counters>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let mut previous = counters.total_tested();

        while !stop.load(Ordering::SeqCst) {
            tokio::time::sleep(SAMPLE_INTERVAL).await;

            let total = counters.total_tested();
            let short = total.saturating_sub(previous);
            previous = total;

            let elapsed_secs = started.elapsed().as_secs().max(1);
            let long = total / elapsed_secs;

            counters.store_samples(short, long);
        }
    })
}

/// Spawns the live status line (spinner).
///
/// Shows tested/found totals, both throughput windows, and, when a wordlist
/// length is known (single-directory mode), sweep progress with an ETA.
/// Runs until `stop` is set.
pub fn spawn_status_line(counters: Arc<Counters>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(status_message(&counters));
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        spinner.finish_and_clear();
    })
}

/// Renders one status-line message from the current counter values.
fn status_message(counters: &Counters) -> String {
    let tested = counters.total_tested();
    let found = counters.found();
    let short = counters.per_second_short();
    let long = counters.per_second_long();

    let mut message =
        format!("tested {tested} | found {found} | {short} req/s (avg {long} req/s)");

    let wordlist_len = counters.wordlist_len();
    if wordlist_len > 0 {
        let progress = counters.dir_progress().min(wordlist_len);
        message.push_str(&format!(" | dir {progress}/{wordlist_len}"));
        let remaining = wordlist_len - progress;
        if long > 0 {
            message.push_str(&format!(" | ETA {}s", remaining / long));
        }
    }

    message
}
