//! The concurrent discovery engine.
//!
//! Candidates flow from the frontier through the scheduler to the probe
//! executor; sweeps start at the seed directories, and Good outcomes feed
//! the confirmed-output sink, the spider, and (for discovered
//! directory-shaped paths) new recursive sweeps. Two independent
//! counting-semaphore pools bound the work: probe tokens cap raw in-flight
//! requests, sweep tokens cap how many directories are being bruteforced at
//! once. The run ends exactly when the pending-work counter reaches zero.

mod frontier;
pub mod spider;
pub mod sweep;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};
use url::Url;

pub use frontier::{Candidate, DEFAULT_FRONTIER_CAPACITY, DiscoveredVia, Frontier, WorkTracker};

use crate::classify::{Classifier, Label};
use crate::config::RunConfig;
use crate::hosts::HostRegistry;
use crate::output::{self, Confirmed};
use crate::probe::{ProbeClient, ProbeError, ProbeResponse};
use crate::stats::{self, Counters};

/// Length of the random wildcard canary token.
const CANARY_TOKEN_LEN: usize = 16;

/// Capacity of the confirmed-results channel feeding the output writer.
const CONFIRMED_CHANNEL_CAPACITY: usize = 1000;

/// Errors that abort the whole run.
///
/// Per-probe transport failures are not represented here; those are logged
/// and the run continues.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The probe client could not be built from the configuration.
    #[error("client configuration error: {source}")]
    Client {
        /// The underlying build error.
        #[source]
        source: ProbeError,
    },

    /// The wildcard canary probe failed; the seed host cannot be baselined.
    #[error("canary request failed for {url} (check the seed URL is reachable): {source}")]
    Canary {
        /// The canary URL that failed.
        url: String,
        /// The transport failure.
        #[source]
        source: ProbeError,
    },

    /// The canary token cannot be joined onto a seed URL.
    #[error("invalid canary URL under {base}")]
    InvalidCanary {
        /// The seed directory the token failed to join.
        base: String,
    },

    /// A semaphore pool was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    /// The output writer failed.
    #[error("output writer error: {source}")]
    Output {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output writer task panicked.
    #[error("output writer task failed")]
    OutputTaskFailed,
}

/// Final counts for a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Probe attempts issued, including canaries.
    pub tested: u64,
    /// Confirmed-good outcomes.
    pub found: u64,
    /// Lines written to the output file.
    pub written: usize,
}

/// Shared state handed to every worker task.
pub(crate) struct EngineCtx {
    pub(crate) cfg: Arc<RunConfig>,
    pub(crate) words: Arc<Vec<String>>,
    pub(crate) client: ProbeClient,
    pub(crate) registry: HostRegistry,
    pub(crate) classifier: Classifier,
    pub(crate) counters: Arc<Counters>,
    pub(crate) frontier: Frontier,
    pub(crate) probe_permits: Arc<Semaphore>,
    pub(crate) sweep_permits: Arc<Semaphore>,
    pub(crate) confirmed_tx: mpsc::Sender<Confirmed>,
}

/// The discovery engine for one run.
pub struct DiscoveryEngine {
    ctx: Arc<EngineCtx>,
    candidates_rx: mpsc::Receiver<Candidate>,
    confirmed_rx: mpsc::Receiver<Confirmed>,
}

impl DiscoveryEngine {
    /// Builds an engine from a frozen configuration and a loaded wordlist.
    ///
    /// An empty wordlist means spider-only mode: no sweeps are scheduled,
    /// seeds are still probed and spidered.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Client`] when the HTTP client cannot be
    /// constructed (bad proxy, malformed headers).
    pub fn new(cfg: RunConfig, words: Vec<String>) -> Result<Self, EngineError> {
        let counters = Arc::new(Counters::new());
        // Per-directory progress is only meaningful when one sweep runs at
        // a time. The length is measured in candidates, since each word
        // expands to one probe per extension and slash variant.
        if cfg.max_dirs == 1 && !words.is_empty() {
            let variants = 1
                + cfg.extensions.iter().filter(|ext| !ext.is_empty()).count()
                + usize::from(cfg.append_slash);
            counters.set_wordlist_len((words.len() * variants) as u64);
        }

        let client = ProbeClient::from_config(&cfg, Arc::clone(&counters))
            .map_err(|source| EngineError::Client { source })?;

        let (frontier, candidates_rx) = Frontier::new(cfg.frontier_capacity);
        let (confirmed_tx, confirmed_rx) = mpsc::channel(CONFIRMED_CHANNEL_CAPACITY);

        let classifier = Classifier::new(cfg.bad_statuses.clone(), cfg.ratio);
        let probe_permits = Arc::new(Semaphore::new(cfg.threads));
        let sweep_permits = Arc::new(Semaphore::new(cfg.max_dirs));

        Ok(Self {
            ctx: Arc::new(EngineCtx {
                cfg: Arc::new(cfg),
                words: Arc::new(words),
                client,
                registry: HostRegistry::new(),
                classifier,
                counters,
                frontier,
                probe_permits,
                sweep_permits,
                confirmed_tx,
            }),
            candidates_rx,
            confirmed_rx,
        })
    }

    /// The run counters, for external status reporting.
    #[must_use]
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.ctx.counters)
    }

    /// Runs discovery to completion.
    ///
    /// Sends one canary per seed host to establish soft-404 baselines,
    /// seeds the frontier, then dispatches candidates until the pending-work
    /// counter reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Canary`] when a seed host cannot be baselined,
    /// or [`EngineError::Output`] when the result file cannot be written.
    pub async fn run(mut self) -> Result<RunSummary, EngineError> {
        let ctx = Arc::clone(&self.ctx);

        let writer = {
            let path = ctx.cfg.output.clone();
            let clean = ctx.cfg.clean_output;
            let rx = self.confirmed_rx;
            tokio::spawn(async move { output::write_confirmed(&path, clean, rx).await })
        };

        let sampler_stop = Arc::new(AtomicBool::new(false));
        let sampler = stats::spawn_sampler(Arc::clone(&ctx.counters), Arc::clone(&sampler_stop));

        seed_frontier(&ctx).await?;

        // Dispatch until every accepted candidate has been fully processed.
        loop {
            tokio::select! {
                () = ctx.frontier.tracker().wait_idle() => break,
                maybe = self.candidates_rx.recv() => {
                    let Some(candidate) = maybe else { break };
                    dispatch(&ctx, candidate).await?;
                }
            }
        }

        info!("discovery complete");
        sampler_stop.store(true, Ordering::SeqCst);
        let _ = sampler.await;

        // Drop our context handle so the confirmed channel closes once the
        // last finished task releases its clone, letting the writer drain.
        let counters = Arc::clone(&ctx.counters);
        drop(ctx);
        drop(self.ctx);

        let written = writer
            .await
            .map_err(|_| EngineError::OutputTaskFailed)?
            .map_err(|source| EngineError::Output { source })?;

        Ok(RunSummary {
            tested: counters.total_tested(),
            found: counters.found(),
            written,
        })
    }

}

/// Sends the per-host canaries, enqueues the seed candidates, and schedules
/// a wordlist sweep of every seed directory.
///
/// Seed sweeps are unconditional: they run regardless of how the seed's own
/// response classifies and regardless of the recursion toggle, which only
/// governs sweeps of directories discovered later.
async fn seed_frontier(ctx: &Arc<EngineCtx>) -> Result<(), EngineError> {
    let token = ctx
        .cfg
        .canary
        .clone()
        .unwrap_or_else(|| random_token(CANARY_TOKEN_LEN));

    for seed in &ctx.cfg.seeds {
        if let Some(host) = seed.host_str() {
            ctx.registry.register_seed(host);
        }
    }

    for seed in &ctx.cfg.seeds {
        let dir = ensure_trailing_slash(seed);
        let canary_url = dir.join(&token).map_err(|_| EngineError::InvalidCanary {
            base: dir.to_string(),
        })?;

        debug!(url = %canary_url, "sending canary");
        match ctx.client.execute(&canary_url).await {
            Ok(response) => {
                debug!(
                    url = %canary_url,
                    status = response.status,
                    "canary response received"
                );
                if let Some(host) = seed.host_str() {
                    ctx.registry.set_baseline(host, response.body);
                }
            }
            Err(source) => {
                return Err(EngineError::Canary {
                    url: canary_url.to_string(),
                    source,
                });
            }
        }

        ctx.frontier.push(Candidate::seed(seed.clone())).await;
        if !seed.path().ends_with('/') {
            ctx.frontier.push(Candidate::seed(dir.clone())).await;
        }
        schedule_sweep(ctx, dir);
    }

    Ok(())
}

/// Scope-filters one candidate, then hands it to a probe task under a probe
/// token.
async fn dispatch(ctx: &Arc<EngineCtx>, candidate: Candidate) -> Result<(), EngineError> {
    if !spider::in_scope(&candidate.url, &ctx.cfg, &ctx.registry) {
        debug!(url = %candidate.url, via = ?candidate.via, "candidate out of scope");
        // Processed but never tested.
        ctx.frontier.complete(&candidate);
        return Ok(());
    }

    // Blocks while the probe pool is exhausted; frontier backpressure
    // propagates to producers.
    let permit = ctx
        .probe_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| EngineError::SemaphoreClosed)?;

    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        let result = ctx.client.execute(&candidate.url).await;
        // Probe token is released as soon as the outcome exists; spidering
        // and recursion must not hold a probe slot.
        drop(permit);

        // Only sweep members advance the per-directory progress; derived
        // directory variants are not part of any sweep's candidate count.
        if ctx.cfg.max_dirs == 1 && candidate.sweep.is_some() {
            ctx.counters.record_dir_progress();
        }

        match result {
            Err(error) => {
                // Inconclusive: counted as tested, neither Good nor Bad.
                debug!(url = %candidate.url, %error, "probe failed");
            }
            Ok(response) => {
                let baseline = candidate
                    .url
                    .host_str()
                    .and_then(|host| ctx.registry.baseline(host));
                let label =
                    ctx.classifier
                        .classify(response.status, &response.body, baseline.as_deref());
                match label {
                    Label::Bad => {
                        debug!(url = %candidate.url, status = response.status, "not found");
                        if ctx.cfg.show_all {
                            let miss = Confirmed {
                                url: candidate.url.to_string(),
                                status: response.status,
                                body_len: response.body.len(),
                            };
                            if ctx.confirmed_tx.send(miss).await.is_err() {
                                warn!(url = %candidate.url, "output sink closed");
                            }
                        }
                    }
                    Label::Good => handle_good(&ctx, &candidate, &response).await,
                }
            }
        }

        ctx.frontier.complete(&candidate);
    });

    Ok(())
}

/// Forwards a Good outcome to the confirmed sink, the spider, and the
/// recursion trigger.
async fn handle_good(ctx: &Arc<EngineCtx>, candidate: &Candidate, response: &ProbeResponse) {
    ctx.counters.record_found();
    info!(
        status = response.status,
        elapsed_ms = response.elapsed.as_millis() as u64,
        via = ?candidate.via,
        "found {}",
        candidate.url
    );

    let confirmed = Confirmed {
        url: candidate.url.to_string(),
        status: response.status,
        body_len: response.body.len(),
    };
    if ctx.confirmed_tx.send(confirmed).await.is_err() {
        warn!(url = %candidate.url, "confirmed-output sink closed");
    }

    ctx.client.spawn_replay(&candidate.url);

    // Seed directories are swept up front; only discovered content triggers
    // recursion here.
    if candidate.via != DiscoveredVia::Seed && !ctx.cfg.no_recursion {
        if candidate.url.path().ends_with('/') {
            schedule_sweep(ctx, candidate.url.clone());
        } else {
            // Probe the directory-style variant; if it is Good it will
            // trigger its own sweep.
            let dir = ensure_trailing_slash(&candidate.url);
            ctx.frontier
                .push(Candidate::bruteforce(
                    dir,
                    Some(candidate.url.clone()),
                    None,
                ))
                .await;
        }
    }

    if !ctx.cfg.no_spider && !response.body.is_empty() {
        for link in spider::extract_links(&response.body, &candidate.url) {
            ctx.frontier
                .push(Candidate::spider(link, candidate.url.clone()))
                .await;
        }
    }
}

/// Schedules a wordlist sweep rooted at `base` under a fresh sweep token.
///
/// The sweep is registered as pending work before the task is spawned, so
/// the run cannot terminate between the triggering outcome and the sweep's
/// first candidate. Token acquisition blocks while the sweep pool is
/// exhausted.
fn schedule_sweep(ctx: &Arc<EngineCtx>, base: Url) {
    if ctx.words.is_empty() {
        return;
    }

    ctx.frontier.tracker().start();
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        match ctx.sweep_permits.clone().acquire_owned().await {
            Ok(permit) => sweep::run(Arc::clone(&ctx), base, permit).await,
            Err(_) => warn!("sweep semaphore closed"),
        }
        ctx.frontier.tracker().finish();
    });
}

/// Random alphanumeric canary token.
fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Returns the URL with a `/`-terminated path.
fn ensure_trailing_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        return url.clone();
    }
    let mut dir = url.clone();
    dir.set_path(&format!("{}/", url.path()));
    dir
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_random_token_alphanumeric() {
        let token = random_token(CANARY_TOKEN_LEN);
        assert_eq!(token.len(), CANARY_TOKEN_LEN);
        assert!(token.chars().all(char::is_alphanumeric));

        // Vanishingly unlikely to collide.
        assert_ne!(token, random_token(CANARY_TOKEN_LEN));
    }

    #[test]
    fn test_ensure_trailing_slash() {
        let url = Url::parse("http://example.com/images").unwrap();
        assert_eq!(
            ensure_trailing_slash(&url).as_str(),
            "http://example.com/images/"
        );

        let already = Url::parse("http://example.com/images/").unwrap();
        assert_eq!(ensure_trailing_slash(&already), already);
    }

    #[test]
    fn test_engine_pools_match_config() {
        let cfg = RunConfig {
            threads: 7,
            max_dirs: 3,
            ..RunConfig::default()
        };
        let engine = DiscoveryEngine::new(cfg, vec!["admin".to_string()]).unwrap();
        assert_eq!(engine.ctx.probe_permits.available_permits(), 7);
        assert_eq!(engine.ctx.sweep_permits.available_permits(), 3);
    }

    #[test]
    fn test_wordlist_len_counts_extension_and_slash_variants() {
        // Two words, two extensions, plus the slash variant: each word
        // expands to four candidates per directory.
        let cfg = RunConfig {
            extensions: vec!["php".to_string(), "bak".to_string()],
            append_slash: true,
            ..RunConfig::default()
        };
        let engine =
            DiscoveryEngine::new(cfg, vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(engine.counters().wordlist_len(), 8);

        // Empty extensions generate no candidates and must not count.
        let cfg = RunConfig {
            extensions: vec![String::new()],
            ..RunConfig::default()
        };
        let engine = DiscoveryEngine::new(cfg, vec!["a".to_string()]).unwrap();
        assert_eq!(engine.counters().wordlist_len(), 1);
    }

    #[test]
    fn test_wordlist_len_only_recorded_in_single_dir_mode() {
        let cfg = RunConfig::default();
        let engine = DiscoveryEngine::new(cfg, vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(engine.counters().wordlist_len(), 2);

        let cfg = RunConfig {
            max_dirs: 4,
            ..RunConfig::default()
        };
        let engine = DiscoveryEngine::new(cfg, vec!["a".to_string()]).unwrap();
        assert_eq!(engine.counters().wordlist_len(), 0);
    }
}
