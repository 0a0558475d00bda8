//! Rummage Core Library
//!
//! This library implements a concurrent web content discovery engine that
//! combines dictionary-driven path bruteforcing with recursive link
//! spidering.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Run configuration frozen at startup
//! - [`hosts`] - Per-host registry (soft-404 baselines, scope membership)
//! - [`classify`] - Soft-404 classification of probe responses
//! - [`probe`] - HTTP probe client construction and execution
//! - [`engine`] - Frontier, scheduler, wordlist sweep, and spider
//! - [`stats`] - Counters and throughput sampling
//! - [`output`] - Incremental confirmed-results writer
//! - [`wordlist`] - Line-oriented file loaders

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod engine;
pub mod hosts;
pub mod output;
pub mod probe;
pub mod stats;
pub mod wordlist;

// Re-export commonly used types
pub use classify::{Classifier, Label};
pub use config::{ConfigError, RunConfig};
pub use engine::{
    Candidate, DEFAULT_FRONTIER_CAPACITY, DiscoveredVia, DiscoveryEngine, EngineError, Frontier,
    RunSummary,
};
pub use hosts::HostRegistry;
pub use output::Confirmed;
pub use probe::{ProbeClient, ProbeError, ProbeResponse};
pub use stats::Counters;
pub use wordlist::load_lines;

/// Default User-Agent sent with every probe unless overridden.
#[must_use]
pub fn default_user_agent() -> String {
    format!("rummage/{}", env!("CARGO_PKG_VERSION"))
}
