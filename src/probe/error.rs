//! Error types for probe execution.

use thiserror::Error;

/// Errors that can occur while building the probe client or executing a
/// single probe.
///
/// `Build`, `Proxy`, and `Header` happen at startup and are fatal for the
/// run. `Timeout` and `Network` are per-probe transport failures: the
/// candidate is counted as tested but stays unclassified.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Build {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The configured proxy address was rejected.
    #[error("invalid proxy address {addr:?}: {source}")]
    Proxy {
        /// The proxy address as supplied.
        addr: String,
        /// The underlying proxy error.
        #[source]
        source: reqwest::Error,
    },

    /// A configured header name or value is not a legal HTTP header.
    #[error("invalid header {name:?}")]
    Header {
        /// The offending header name.
        name: String,
    },

    /// The probe exceeded the per-request timeout.
    #[error("timeout probing {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Transport-level failure (DNS, connection refused, TLS, reset).
    #[error("network error probing {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },
}

impl ProbeError {
    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error, collapsing reqwest timeouts into
    /// [`ProbeError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Whether this error is fatal for the whole run rather than one probe.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Build { .. } | Self::Proxy { .. } | Self::Header { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_url() {
        let error = ProbeError::timeout("http://example.com/admin");
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "got: {msg}");
        assert!(msg.contains("http://example.com/admin"), "got: {msg}");
    }

    #[test]
    fn test_header_error_is_fatal() {
        let error = ProbeError::Header {
            name: "bad header".to_string(),
        };
        assert!(error.is_fatal());
    }

    #[test]
    fn test_timeout_is_recoverable() {
        assert!(!ProbeError::timeout("http://example.com/").is_fatal());
    }
}
