//! Frontier: the deduplicated, bounded queue of discovery candidates.
//!
//! Two producers feed it (wordlist sweeps and the spider); the scheduler is
//! its only consumer. Deduplication is owned here, not by callers: a
//! candidate whose normalized URL was already seen is dropped silently.
//! The queue is bounded, so producers block when it fills - candidates are
//! never dropped for being too numerous, only for being duplicates.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::sync::{Notify, mpsc};
use tracing::{trace, warn};
use url::Url;

/// Default frontier queue capacity.
pub const DEFAULT_FRONTIER_CAPACITY: usize = 1000;

/// How a candidate entered the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveredVia {
    /// Supplied on the command line or seed list.
    Seed,
    /// Generated by a wordlist sweep.
    Bruteforce,
    /// Extracted from a response body by the spider.
    Spider,
}

/// One unit of discovery work, consumed exactly once by the scheduler.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Target URL to probe.
    pub url: Url,
    /// URL this candidate was discovered from, when any.
    pub reference: Option<Url>,
    /// Producer that discovered it.
    pub via: DiscoveredVia,
    /// Outstanding-probe tracker of the sweep this candidate belongs to.
    /// `None` for seeds, spider finds, and derived directory variants.
    pub sweep: Option<Arc<WorkTracker>>,
}

impl Candidate {
    /// A seed candidate.
    #[must_use]
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            reference: None,
            via: DiscoveredVia::Seed,
            sweep: None,
        }
    }

    /// A sweep-generated candidate.
    #[must_use]
    pub fn bruteforce(url: Url, reference: Option<Url>, sweep: Option<Arc<WorkTracker>>) -> Self {
        Self {
            url,
            reference,
            via: DiscoveredVia::Bruteforce,
            sweep,
        }
    }

    /// A spider-extracted candidate.
    #[must_use]
    pub fn spider(url: Url, reference: Url) -> Self {
        Self {
            url,
            reference: Some(reference),
            via: DiscoveredVia::Spider,
            sweep: None,
        }
    }
}

/// Counter of in-flight work with an idle notification.
///
/// Used globally (run termination) and per sweep (sweep-token release).
/// `start` before the work is visible to anyone else, `finish` exactly once
/// when it is fully processed; `wait_idle` resolves when the count reaches
/// zero.
#[derive(Debug, Default)]
pub struct WorkTracker {
    pending: AtomicUsize,
    idle: Notify,
}

impl WorkTracker {
    /// Creates an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one unit of pending work.
    pub fn start(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks one unit of work as fully processed.
    pub fn finish(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "work tracker underflow");
        if previous == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Current number of pending units.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Resolves once the pending count reaches zero.
    pub async fn wait_idle(&self) {
        loop {
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            let notified = self.idle.notified();
            // Re-check after arming the waiter; finish() may have raced us.
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// The candidate queue shared by all producers.
#[derive(Debug)]
pub struct Frontier {
    tx: mpsc::Sender<Candidate>,
    seen: DashMap<String, ()>,
    tracker: Arc<WorkTracker>,
}

impl Frontier {
    /// Creates a frontier with the given queue capacity, returning the
    /// consumer end alongside it.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Candidate>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                seen: DashMap::new(),
                tracker: Arc::new(WorkTracker::new()),
            },
            rx,
        )
    }

    /// The run-wide pending-work tracker.
    #[must_use]
    pub fn tracker(&self) -> &Arc<WorkTracker> {
        &self.tracker
    }

    /// Normalized dedup key: scheme + host + port + path.
    ///
    /// Query strings and fragments are ignored, so `/a?x=1` and `/a?x=2`
    /// count as the same candidate.
    #[must_use]
    pub fn dedup_key(url: &Url) -> String {
        format!(
            "{}://{}:{}{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default(),
            url.path()
        )
    }

    /// Submits a candidate, blocking while the queue is full.
    ///
    /// Returns `false` when the candidate was a duplicate (dropped, not
    /// counted). On acceptance the run-wide tracker, and the candidate's
    /// sweep tracker when present, each gain one unit of pending work.
    pub async fn push(&self, candidate: Candidate) -> bool {
        let key = Self::dedup_key(&candidate.url);
        if self.seen.insert(key, ()).is_some() {
            trace!(url = %candidate.url, "duplicate candidate dropped");
            return false;
        }

        self.tracker.start();
        if let Some(sweep) = &candidate.sweep {
            sweep.start();
        }

        if let Err(rejected) = self.tx.send(candidate).await {
            // Consumer is gone; undo the accounting so the run can settle.
            let candidate = rejected.0;
            warn!(url = %candidate.url, "frontier closed, candidate dropped");
            if let Some(sweep) = &candidate.sweep {
                sweep.finish();
            }
            self.tracker.finish();
            return false;
        }
        true
    }

    /// Marks a candidate as fully processed (outcome produced or
    /// permanently skipped).
    pub fn complete(&self, candidate: &Candidate) {
        if let Some(sweep) = &candidate.sweep {
            sweep.finish();
        }
        self.tracker.finish();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_dedup_key_ignores_query_and_fragment() {
        let a = Frontier::dedup_key(&url("http://example.com/a?x=1#frag"));
        let b = Frontier::dedup_key(&url("http://example.com/a?x=2"));
        let c = Frontier::dedup_key(&url("http://example.com/a"));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_dedup_key_normalizes_default_port() {
        let a = Frontier::dedup_key(&url("http://example.com/a"));
        let b = Frontier::dedup_key(&url("http://example.com:80/a"));
        assert_eq!(a, b);

        let https = Frontier::dedup_key(&url("https://example.com/a"));
        assert_ne!(a, https);
    }

    #[test]
    fn test_dedup_key_distinguishes_paths_and_hosts() {
        let a = Frontier::dedup_key(&url("http://example.com/a"));
        let b = Frontier::dedup_key(&url("http://example.com/b"));
        let other = Frontier::dedup_key(&url("http://other.example/a"));
        assert_ne!(a, b);
        assert_ne!(a, other);
    }

    #[tokio::test]
    async fn test_push_accepts_once_and_drops_duplicates() {
        let (frontier, mut rx) = Frontier::new(8);
        let candidate = Candidate::seed(url("http://example.com/admin"));

        assert!(frontier.push(candidate.clone()).await);
        assert!(!frontier.push(candidate).await);
        assert_eq!(frontier.tracker().pending(), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.url.as_str(), "http://example.com/admin");
    }

    #[tokio::test]
    async fn test_concurrent_producers_race_one_winner() {
        let (frontier, mut rx) = Frontier::new(64);
        let frontier = Arc::new(frontier);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let frontier = Arc::clone(&frontier);
            handles.push(tokio::spawn(async move {
                usize::from(
                    frontier
                        .push(Candidate::seed(url("http://example.com/racy")))
                        .await,
                )
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            accepted += handle.await.unwrap();
        }
        assert_eq!(accepted, 1);
        assert_eq!(frontier.tracker().pending(), 1);

        assert!(rx.recv().await.is_some());
        assert!(
            tokio::time::timeout(Duration::from_millis(50), rx.recv())
                .await
                .is_err(),
            "only one candidate should have been queued"
        );
    }

    #[tokio::test]
    async fn test_pending_work_accounting() {
        let (frontier, mut rx) = Frontier::new(8);
        frontier.push(Candidate::seed(url("http://example.com/a"))).await;
        frontier.push(Candidate::seed(url("http://example.com/b"))).await;
        assert_eq!(frontier.tracker().pending(), 2);

        let a = rx.recv().await.unwrap();
        frontier.complete(&a);
        assert_eq!(frontier.tracker().pending(), 1);

        let b = rx.recv().await.unwrap();
        frontier.complete(&b);
        assert_eq!(frontier.tracker().pending(), 0);

        frontier.tracker().wait_idle().await;
    }

    #[tokio::test]
    async fn test_sweep_tracker_follows_candidate_lifecycle() {
        let (frontier, mut rx) = Frontier::new(8);
        let sweep = Arc::new(WorkTracker::new());

        frontier
            .push(Candidate::bruteforce(
                url("http://example.com/admin"),
                None,
                Some(Arc::clone(&sweep)),
            ))
            .await;
        assert_eq!(sweep.pending(), 1);

        let candidate = rx.recv().await.unwrap();
        frontier.complete(&candidate);
        assert_eq!(sweep.pending(), 0);
        sweep.wait_idle().await;
    }

    #[tokio::test]
    async fn test_full_queue_blocks_producer() {
        let (frontier, mut rx) = Frontier::new(1);
        frontier.push(Candidate::seed(url("http://example.com/a"))).await;

        // Queue is full; the second push must block until the consumer
        // drains, never drop the candidate.
        let blocked = frontier.push(Candidate::seed(url("http://example.com/b")));
        tokio::pin!(blocked);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), blocked.as_mut())
                .await
                .is_err(),
            "push should block while the queue is full"
        );

        assert!(rx.recv().await.is_some());
        assert!(blocked.await);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_idle() {
        let tracker = WorkTracker::new();
        tokio::time::timeout(Duration::from_millis(50), tracker.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_idle_wakes_on_last_finish() {
        let tracker = Arc::new(WorkTracker::new());
        tracker.start();
        tracker.start();

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.wait_idle().await })
        };

        tracker.finish();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        tracker.finish();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
