//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Discover hidden web content by recursive wordlist bruteforce and spidering.
///
/// Rummage sweeps a wordlist against every discovered directory on the target
/// host, spiders response bodies for in-scope links, and filters out "friendly
/// 404" pages by comparing each response to a per-host wildcard baseline.
#[derive(Parser, Debug, Clone)]
#[command(name = "rummage")]
#[command(author, version, about)]
pub struct Args {
    /// Seed URL to spider and bruteforce
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// File containing seed URLs, one per line
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Wordlist for bruteforcing; omit for spider-only mode
    #[arg(short = 'w', long, value_name = "FILE")]
    pub wordlist: Option<PathBuf>,

    /// Number of concurrent probes (1-1000)
    #[arg(short = 't', long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub threads: u16,

    /// Maximum directories bruteforced concurrently (1-100)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub dirs: u8,

    /// Extensions appended to each word, comma-separated (e.g. php,html)
    #[arg(long, value_delimiter = ',')]
    pub ext: Vec<String>,

    /// Status codes treated as 'not found', comma-separated
    #[arg(long, default_value = "404", value_delimiter = ',')]
    pub bad: Vec<u16>,

    /// Similarity ratio to the wildcard baseline above which a response is a soft 404
    #[arg(long, default_value_t = 0.95)]
    pub ratio: f64,

    /// Disable recursive sweeps into discovered directories; seed
    /// directories are still swept
    #[arg(long)]
    pub no_recursion: bool,

    /// Do not search response bodies for links to spider
    #[arg(long)]
    pub no_spider: bool,

    /// File of hosts allowed for spidering beyond the seed hosts
    #[arg(long, value_name = "FILE")]
    pub whitelist: Option<PathBuf>,

    /// File of URL prefixes that are never probed
    #[arg(long, value_name = "FILE")]
    pub blacklist: Option<PathBuf>,

    /// Use HTTPS for schemeless seed URLs
    #[arg(long)]
    pub https: bool,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Proxy address (e.g. http://127.0.0.1:8080)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Replay confirmed-good requests through the proxy instead of routing all traffic
    #[arg(long)]
    pub sitemap: bool,

    /// Basic auth: the base64 portion placed after 'Basic' in the Authorization header
    #[arg(long)]
    pub auth: Option<String>,

    /// Cookie header value sent with every request
    #[arg(long)]
    pub cookies: Option<String>,

    /// Additional header as key:value; may be given multiple times
    #[arg(long = "header", value_name = "KEY:VALUE")]
    pub headers: Vec<String>,

    /// User agent override
    #[arg(long)]
    pub ua: Option<String>,

    /// Per-request timeout in seconds (1-300)
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout: u64,

    /// Output file for discovered URLs
    #[arg(short = 'o', long, default_value = "found.txt")]
    pub output: PathBuf,

    /// Override the random wildcard-probe token
    #[arg(long)]
    pub canary: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable trace-level diagnostics
    #[arg(long)]
    pub debug: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Don't render the live status line
    #[arg(long)]
    pub no_status: bool,

    /// Write bare URLs to the output file, without status annotations
    #[arg(long)]
    pub clean: bool,

    /// Write every classified response to the output file, not just
    /// confirmed hits
    #[arg(long)]
    pub all: bool,

    /// Follow redirects
    #[arg(long)]
    pub redirect: bool,

    /// Probe with HEAD requests instead of GET
    #[arg(long)]
    pub no_get: bool,

    /// Also probe a directory-style variant (word/) of every word
    #[arg(long)]
    pub append_slash: bool,
}
