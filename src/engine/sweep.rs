//! Wordlist sweep: the bruteforce pass over one base directory.
//!
//! A sweep is a long-lived unit of work composed of many short-lived
//! probes. It runs under a sweep token held for its entire duration: the
//! token is acquired before the first candidate is generated and released
//! (by RAII) only after every probe belonging to the sweep has produced its
//! outcome.

use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, info};
use url::Url;

use super::EngineCtx;
use super::frontier::{Candidate, WorkTracker};

/// Builds the candidate URLs for one word under a base directory.
///
/// Yields the word itself, one `word.ext` per configured extension, and a
/// `word/` variant when append-slash is on. Words that fail to join (rare,
/// e.g. embedded control characters) are skipped.
#[must_use]
pub fn candidate_urls(
    base: &Url,
    word: &str,
    extensions: &[String],
    append_slash: bool,
) -> Vec<Url> {
    let mut variants = Vec::with_capacity(extensions.len() + 2);
    variants.push(word.to_string());
    for ext in extensions {
        if !ext.is_empty() {
            variants.push(format!("{word}.{ext}"));
        }
    }
    if append_slash {
        variants.push(format!("{word}/"));
    }

    variants
        .into_iter()
        .filter_map(|variant| base.join(&variant).ok())
        .collect()
}

/// Runs one full wordlist sweep over `base`, then releases the sweep token.
pub(super) async fn run(ctx: Arc<EngineCtx>, base: Url, permit: OwnedSemaphorePermit) {
    info!(dir = %base, words = ctx.words.len(), "sweeping directory");

    let single_dir = ctx.cfg.max_dirs == 1;
    if single_dir {
        ctx.counters.reset_dir_progress();
    }

    // Tracks this sweep's own probes so the token outlives all of them.
    let sweep_tracker = Arc::new(WorkTracker::new());

    for word in ctx.words.iter() {
        for url in candidate_urls(&base, word, &ctx.cfg.extensions, ctx.cfg.append_slash) {
            let candidate = Candidate::bruteforce(
                url,
                Some(base.clone()),
                Some(Arc::clone(&sweep_tracker)),
            );
            // Blocks when the frontier is full; backpressure, never loss.
            ctx.frontier.push(candidate).await;
        }
    }

    sweep_tracker.wait_idle().await;
    debug!(dir = %base, "sweep complete");
    drop(permit);
}
