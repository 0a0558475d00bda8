//! Per-host registry: soft-404 baselines and scope membership.
//!
//! Multiple workers probe the same host concurrently, so the registry is the
//! one structure mutated throughout the run. It uses `DashMap` for sharded
//! concurrent access; the baseline itself is a `OnceLock`, which gives the
//! first-writer-wins guarantee without holding any lock across the write.

use std::sync::Arc;
use std::sync::OnceLock;

use dashmap::DashMap;
use tracing::debug;

/// State tracked for each contacted host.
#[derive(Debug, Default)]
struct HostEntry {
    /// Soft-404 baseline body, set at most once per host. A slow canary
    /// racing a fast one cannot corrupt an established baseline.
    baseline: OnceLock<Arc<str>>,
    /// Whether this host was a seed (always in scope for spidering).
    seed: bool,
}

/// Registry of every host contacted during the run.
///
/// Entries are created on first contact and never deleted while the run is
/// alive.
#[derive(Debug, Default)]
pub struct HostRegistry {
    hosts: DashMap<String, Arc<HostEntry>>,
}

impl HostRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a seed host. Idempotent; a later seed registration upgrades
    /// an existing non-seed entry.
    pub fn register_seed(&self, host: &str) {
        let mut entry = self.hosts.entry(host.to_string()).or_default();
        if !entry.seed {
            // Baseline may already be set on the old entry; carry it over.
            let upgraded = Arc::new(HostEntry {
                baseline: entry.baseline.clone(),
                seed: true,
            });
            *entry.value_mut() = upgraded;
        }
    }

    /// Returns whether the host was registered as a seed.
    #[must_use]
    pub fn is_seed_host(&self, host: &str) -> bool {
        self.hosts.get(host).is_some_and(|entry| entry.seed)
    }

    /// Stores the soft-404 baseline body for a host.
    ///
    /// The first writer wins; subsequent calls are no-ops. Registers the
    /// host if it has not been contacted yet.
    pub fn set_baseline(&self, host: &str, body: String) {
        let entry = Arc::clone(&self.hosts.entry(host.to_string()).or_default());
        if entry.baseline.set(Arc::from(body.as_str())).is_ok() {
            debug!(host, baseline_len = body.len(), "established soft-404 baseline");
        }
    }

    /// Returns the stored baseline body, or `None` when not yet established.
    #[must_use]
    pub fn baseline(&self, host: &str) -> Option<Arc<str>> {
        self.hosts
            .get(host)
            .and_then(|entry| entry.baseline.get().cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_absent_until_set() {
        let registry = HostRegistry::new();
        assert!(registry.baseline("example.com").is_none());

        registry.set_baseline("example.com", "Not Found".to_string());
        assert_eq!(registry.baseline("example.com").as_deref(), Some("Not Found"));
    }

    #[test]
    fn test_baseline_first_writer_wins() {
        let registry = HostRegistry::new();
        registry.set_baseline("example.com", "first".to_string());
        registry.set_baseline("example.com", "second".to_string());
        assert_eq!(registry.baseline("example.com").as_deref(), Some("first"));
    }

    #[test]
    fn test_baseline_is_per_host() {
        let registry = HostRegistry::new();
        registry.set_baseline("a.example", "alpha".to_string());
        registry.set_baseline("b.example", "beta".to_string());
        assert_eq!(registry.baseline("a.example").as_deref(), Some("alpha"));
        assert_eq!(registry.baseline("b.example").as_deref(), Some("beta"));
    }

    #[test]
    fn test_register_seed_idempotent_and_scope_flag() {
        let registry = HostRegistry::new();
        assert!(!registry.is_seed_host("example.com"));

        registry.register_seed("example.com");
        registry.register_seed("example.com");
        assert!(registry.is_seed_host("example.com"));
        assert!(!registry.is_seed_host("other.example"));
    }

    #[test]
    fn test_seed_upgrade_preserves_baseline() {
        let registry = HostRegistry::new();
        registry.set_baseline("example.com", "boilerplate".to_string());
        registry.register_seed("example.com");
        assert!(registry.is_seed_host("example.com"));
        assert_eq!(
            registry.baseline("example.com").as_deref(),
            Some("boilerplate")
        );
    }

    #[test]
    fn test_concurrent_baseline_writers_converge() {
        use std::thread;

        let registry = Arc::new(HostRegistry::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                registry.set_baseline("example.com", format!("body-{i}"));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Exactly one writer won; all readers agree.
        let body = registry.baseline("example.com").unwrap();
        assert!(body.starts_with("body-"));
    }
}
