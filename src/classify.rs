//! Soft-404 classification of probe responses.
//!
//! A response is Bad when its status is in the configured bad set, or when
//! its body is near-identical to the host's wildcard baseline (a "friendly
//! 404" served with a success status). Similarity is normalized Levenshtein
//! distance over a bounded prefix sample of each body, which is
//! deterministic, symmetric, and cheap enough to run on every probe.

use std::collections::HashSet;

/// Number of leading bytes of a body considered by the similarity metric.
///
/// Friendly-404 boilerplate differs from real content well within the first
/// couple of kilobytes, and bounding the sample keeps the edit-distance cost
/// constant per probe.
pub const SIMILARITY_SAMPLE_LEN: usize = 2048;

/// Classification of a probe response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Genuine content worth reporting, spidering, and recursing into.
    Good,
    /// Not-found response, by status or by baseline similarity.
    Bad,
}

/// Decides Good/Bad for classified responses.
#[derive(Debug, Clone)]
pub struct Classifier {
    bad_statuses: HashSet<u16>,
    ratio: f64,
}

impl Classifier {
    /// Creates a classifier from the configured bad-status set and
    /// similarity threshold.
    #[must_use]
    pub fn new(bad_statuses: HashSet<u16>, ratio: f64) -> Self {
        Self { bad_statuses, ratio }
    }

    /// Classifies one response.
    ///
    /// Decision order:
    /// 1. Status in the bad set: Bad.
    /// 2. Body similarity to the host baseline at or above the threshold:
    ///    Bad (soft 404).
    /// 3. Otherwise Good.
    ///
    /// With no baseline established yet the response is tentatively Good;
    /// baselines are seeded by an explicit canary probe per host, so this
    /// window closes as soon as the canary lands. Empty bodies (HEAD probes)
    /// classify on status alone.
    #[must_use]
    pub fn classify(&self, status: u16, body: &str, baseline: Option<&str>) -> Label {
        if self.bad_statuses.contains(&status) {
            return Label::Bad;
        }

        if body.is_empty() {
            return Label::Good;
        }

        match baseline {
            Some(baseline) if similarity(body, baseline) >= self.ratio => Label::Bad,
            _ => Label::Good,
        }
    }
}

/// Similarity between two bodies in `[0.0, 1.0]`.
///
/// Normalized Levenshtein over the first [`SIMILARITY_SAMPLE_LEN`] bytes of
/// each input (truncated at a char boundary). Symmetric by construction.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(sample(a), sample(b))
}

/// Truncates to the sample window without splitting a UTF-8 char.
fn sample(s: &str) -> &str {
    if s.len() <= SIMILARITY_SAMPLE_LEN {
        return s;
    }
    let mut end = SIMILARITY_SAMPLE_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
