//! Run configuration, frozen before any worker starts.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::engine::DEFAULT_FRONTIER_CAPACITY;

/// Errors raised while assembling the run configuration.
///
/// All of these are fatal: they abort the run before any probe is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A `--header` entry was not in `key:value` form.
    #[error("malformed header {entry:?}: expected key:value")]
    Header {
        /// The offending header entry.
        entry: String,
    },

    /// A seed URL could not be parsed.
    #[error("invalid seed URL {url:?}: {source}")]
    Seed {
        /// The seed string as supplied.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A seed URL parsed but has no host to probe.
    #[error("seed URL {url:?} has no host")]
    HostlessSeed {
        /// The seed string as supplied.
        url: String,
    },
}

/// Immutable configuration for one discovery run.
///
/// Built once at startup from CLI arguments and scope files, then shared
/// read-only by every component. The scope sets (`bad_statuses`, `whitelist`,
/// `blacklist`, `extensions`) are populated before any worker starts and
/// never mutated afterwards, so no locking is needed on the hot path.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Seed URLs, scheme-normalized.
    pub seeds: Vec<Url>,
    /// Global probe concurrency (probe-token pool capacity).
    pub threads: usize,
    /// Global concurrent-directory-sweep concurrency (sweep-token pool capacity).
    pub max_dirs: usize,
    /// Extensions cross-joined with each wordlist entry.
    pub extensions: Vec<String>,
    /// Status codes classified Bad unconditionally.
    pub bad_statuses: HashSet<u16>,
    /// Similarity threshold above which a response is a soft 404.
    pub ratio: f64,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Disable recursive sweeps into discovered directories. Seed
    /// directories are still swept, and spidering is governed separately by
    /// `no_spider`.
    pub no_recursion: bool,
    /// Disable link extraction from response bodies.
    pub no_spider: bool,
    /// Probe with HEAD instead of GET.
    pub no_get: bool,
    /// Additionally probe a `word/` variant of every word.
    pub append_slash: bool,
    /// Follow redirects instead of recording them as-is.
    pub follow_redirects: bool,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// Proxy address, if any.
    pub proxy: Option<String>,
    /// When set, the proxy only records replayed Good requests; primary
    /// traffic goes out directly.
    pub sitemap_replay: bool,
    /// Base64 credential portion of a Basic Authorization header.
    pub auth: Option<String>,
    /// Cookie header value sent with every request.
    pub cookies: Option<String>,
    /// Additional headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// User-Agent header value.
    pub user_agent: String,
    /// Wildcard-probe token override; random when `None`.
    pub canary: Option<String>,
    /// Write bare URLs to the output file.
    pub clean_output: bool,
    /// Write every classified response to the output file, misses included.
    pub show_all: bool,
    /// Output file for discovered URLs.
    pub output: PathBuf,
    /// Hosts allowed for spidering beyond the seed hosts.
    pub whitelist: HashSet<String>,
    /// URL prefixes that are never probed.
    pub blacklist: Vec<String>,
    /// Frontier queue capacity; producers block when full.
    pub frontier_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            threads: 1,
            max_dirs: 1,
            extensions: Vec::new(),
            bad_statuses: HashSet::from([404]),
            ratio: 0.95,
            timeout: Duration::from_secs(20),
            no_recursion: false,
            no_spider: false,
            no_get: false,
            append_slash: false,
            follow_redirects: false,
            insecure: false,
            proxy: None,
            sitemap_replay: false,
            auth: None,
            cookies: None,
            headers: Vec::new(),
            user_agent: crate::default_user_agent(),
            canary: None,
            clean_output: false,
            show_all: false,
            output: PathBuf::from("found.txt"),
            whitelist: HashSet::new(),
            blacklist: Vec::new(),
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
        }
    }
}

/// Parses a `key:value` header entry.
///
/// The value may itself contain colons; only the first colon splits.
///
/// # Errors
///
/// Returns [`ConfigError::Header`] when no colon is present or the key is
/// empty.
pub fn parse_header(entry: &str) -> Result<(String, String), ConfigError> {
    match entry.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::Header {
            entry: entry.to_string(),
        }),
    }
}

/// Parses a seed URL, prepending a scheme when the input has none.
///
/// # Errors
///
/// Returns [`ConfigError::Seed`] for unparseable input and
/// [`ConfigError::HostlessSeed`] for URLs without a host component.
pub fn normalize_seed(raw: &str, https: bool) -> Result<Url, ConfigError> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else if https {
        format!("https://{raw}")
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&candidate).map_err(|source| ConfigError::Seed {
        url: raw.to_string(),
        source,
    })?;

    if url.host_str().is_none() {
        return Err(ConfigError::HostlessSeed {
            url: raw.to_string(),
        });
    }

    Ok(url)
}
