//! Link extraction and scope filtering.
//!
//! On a Good outcome the spider pulls `href`/`src` style references out of
//! the body, resolves them against the originating URL, and the scheduler
//! scope-filters them before dispatch: off-host links are dropped unless the
//! host is whitelisted, and blacklisted prefixes are never probed.

use scraper::{Html, Selector};
use tracing::trace;
use url::Url;

use crate::config::RunConfig;
use crate::hosts::HostRegistry;

/// Extracts candidate links from a response body.
///
/// References are resolved relative to `origin`; only http/https results
/// survive, with fragments stripped. Non-HTML bodies simply yield nothing.
#[must_use]
pub fn extract_links(body: &str, origin: &Url) -> Vec<Url> {
    let document = Html::parse_document(body);
    let mut links = Vec::new();

    for (selector, attr) in [("[href]", "href"), ("[src]", "src"), ("form[action]", "action")] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(raw) = element.value().attr(attr) {
                if let Some(url) = resolve(origin, raw) {
                    links.push(url);
                }
            }
        }
    }

    trace!(origin = %origin, count = links.len(), "extracted links");
    links
}

/// Resolves one reference against the originating URL.
fn resolve(origin: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let mut url = origin.join(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Whether a candidate URL is eligible for probing.
///
/// In scope means: the host is a seed host or explicitly whitelisted, and
/// no blacklist prefix matches the URL.
#[must_use]
pub fn in_scope(url: &Url, cfg: &RunConfig, registry: &HostRegistry) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };

    if !registry.is_seed_host(host) && !cfg.whitelist.contains(host) {
        return false;
    }

    !blacklisted(url, &cfg.blacklist)
}

/// Prefix match against the path or the full URL string.
fn blacklisted(url: &Url, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .any(|prefix| url.path().starts_with(prefix.as_str()) || url.as_str().starts_with(prefix.as_str()))
}
