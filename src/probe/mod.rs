//! HTTP probe execution.
//!
//! One probe is one request attempt: no automatic retries. Transport
//! failures are recoverable at the run level; they are logged, counted as
//! tested, and excluded from classification.

mod client;
mod error;

pub use client::{MAX_BODY_LEN, ProbeClient, ProbeResponse};
pub use error::ProbeError;
