//! CLI entry point for rummage.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rummage_core::{
    DiscoveryEngine, RunConfig, config, default_user_agent, load_lines, stats,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > debug flag > verbose count
    let default_level = if args.quiet {
        "error"
    } else if args.debug {
        "trace"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    if args.url.is_none() && args.input_list.is_none() {
        bail!("no seed URL supplied: use -u <url> or --input-list <file>");
    }

    let cfg = build_config(&args)?;
    info!(
        seeds = cfg.seeds.len(),
        threads = cfg.threads,
        dirs = cfg.max_dirs,
        "rummage starting"
    );

    let words = match &args.wordlist {
        Some(path) => {
            let words = load_lines(path).context("loading wordlist")?;
            info!(words = words.len(), path = %path.display(), "wordlist loaded");
            words
        }
        None => {
            info!("no wordlist supplied; running in spider-only mode");
            Vec::new()
        }
    };

    let output = cfg.output.clone();
    let engine = DiscoveryEngine::new(cfg, words)?;

    // Live status line, unless suppressed or not wanted on this terminal
    let status_stop = Arc::new(AtomicBool::new(true));
    let status_handle = if args.no_status || args.quiet {
        None
    } else {
        status_stop.store(false, Ordering::SeqCst);
        Some(stats::spawn_status_line(
            engine.counters(),
            Arc::clone(&status_stop),
        ))
    };

    let summary = engine.run().await;

    status_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = status_handle {
        let _ = handle.await;
    }

    let summary = summary?;
    info!(
        tested = summary.tested,
        found = summary.found,
        written = summary.written,
        output = %output.display(),
        "run complete"
    );

    Ok(())
}

/// Builds the frozen run configuration from CLI arguments and scope files.
fn build_config(args: &Args) -> Result<RunConfig> {
    let mut seeds = Vec::new();
    if let Some(url) = &args.url {
        seeds.push(config::normalize_seed(url, args.https)?);
    }
    if let Some(path) = &args.input_list {
        for line in load_lines(path).context("loading seed list")? {
            seeds.push(config::normalize_seed(&line, args.https)?);
        }
    }

    let whitelist: HashSet<String> = match &args.whitelist {
        Some(path) => load_lines(path)
            .context("loading whitelist")?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    let blacklist = match &args.blacklist {
        Some(path) => load_lines(path).context("loading blacklist")?,
        None => Vec::new(),
    };

    let headers = args
        .headers
        .iter()
        .map(|entry| config::parse_header(entry))
        .collect::<Result<Vec<_>, _>>()?;

    if args.sitemap && args.proxy.is_none() {
        warn!("--sitemap has no effect without --proxy");
    }

    Ok(RunConfig {
        seeds,
        threads: usize::from(args.threads),
        max_dirs: usize::from(args.dirs),
        extensions: args.ext.clone(),
        bad_statuses: args.bad.iter().copied().collect(),
        ratio: args.ratio,
        timeout: Duration::from_secs(args.timeout),
        no_recursion: args.no_recursion,
        no_spider: args.no_spider,
        no_get: args.no_get,
        append_slash: args.append_slash,
        follow_redirects: args.redirect,
        insecure: args.insecure,
        proxy: args.proxy.clone(),
        sitemap_replay: args.sitemap,
        auth: args.auth.clone(),
        cookies: args.cookies.clone(),
        headers,
        user_agent: args.ua.clone().unwrap_or_else(default_user_agent),
        canary: args.canary.clone(),
        clean_output: args.clean,
        show_all: args.all,
        output: args.output.clone(),
        whitelist,
        blacklist,
        ..RunConfig::default()
    })
}
