//! HTTP probe client: reqwest wiring and single-probe execution.
//!
//! The client is built once at startup from the run configuration (timeout,
//! TLS verification, proxy routing, static headers) and shared by every
//! worker. Each `execute` call issues exactly one request attempt and
//! increments the total-tested counter exactly once, whatever the outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Proxy, redirect};
use tracing::debug;
use url::Url;

use super::error::ProbeError;
use crate::config::RunConfig;
use crate::stats::Counters;

/// Upper bound on the captured body length.
///
/// Bodies beyond this are truncated before classification and spidering.
pub const MAX_BODY_LEN: usize = 1024 * 1024;

/// Outcome of one successful probe transport.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly truncated to [`MAX_BODY_LEN`]. Empty for
    /// HEAD probes.
    pub body: String,
    /// Wall-clock time the probe took.
    pub elapsed: Duration,
}

/// Shared HTTP client for probes, plus an optional replay client.
///
/// With `--proxy` alone all traffic routes through the proxy. With
/// `--sitemap` the primary client goes out directly and only confirmed-good
/// URLs are replayed through the proxy, on a detached task that never blocks
/// the probe pipeline.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    client: Client,
    replay: Option<Client>,
    use_head: bool,
    counters: Arc<Counters>,
}

impl ProbeClient {
    /// Builds the probe client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`ProbeError`] when the proxy address or a configured
    /// header is invalid, or when the underlying client cannot be built.
    pub fn from_config(cfg: &RunConfig, counters: Arc<Counters>) -> Result<Self, ProbeError> {
        let route_all_through_proxy = cfg.proxy.is_some() && !cfg.sitemap_replay;
        let client = build_client(cfg, route_all_through_proxy)?;

        let replay = if cfg.sitemap_replay && cfg.proxy.is_some() {
            Some(build_client(cfg, true)?)
        } else {
            None
        };

        Ok(Self {
            client,
            replay,
            use_head: cfg.no_get,
            counters,
        })
    }

    /// Issues exactly one probe attempt against `url`.
    ///
    /// The total-tested counter is incremented once per call, on success and
    /// failure alike.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Timeout`] or [`ProbeError::Network`] on
    /// transport failure. These are recoverable: the caller logs them and
    /// moves on.
    pub async fn execute(&self, url: &Url) -> Result<ProbeResponse, ProbeError> {
        self.counters.record_tested();
        let started = Instant::now();

        let request = if self.use_head {
            self.client.head(url.clone())
        } else {
            self.client.get(url.clone())
        };

        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::network(url.as_str(), e))?;

        let status = response.status().as_u16();
        let body = if self.use_head {
            String::new()
        } else {
            let text = response
                .text()
                .await
                .map_err(|e| ProbeError::network(url.as_str(), e))?;
            truncate_body(text)
        };

        Ok(ProbeResponse {
            status,
            body,
            elapsed: started.elapsed(),
        })
    }

    /// Replays a confirmed-good URL through the proxy, fire-and-forget.
    ///
    /// No-op unless sitemap-replay mode is active. The replay runs on its
    /// own task and cannot affect the primary pipeline's latency or
    /// ordering.
    pub fn spawn_replay(&self, url: &Url) {
        let Some(replay) = self.replay.clone() else {
            return;
        };
        let url = url.clone();
        tokio::spawn(async move {
            match replay.get(url.clone()).send().await {
                Ok(response) => {
                    debug!(url = %url, status = response.status().as_u16(), "replayed through proxy");
                }
                Err(error) => {
                    debug!(url = %url, %error, "proxy replay failed");
                }
            }
        });
    }
}

/// Builds one reqwest client per the run configuration.
fn build_client(cfg: &RunConfig, through_proxy: bool) -> Result<Client, ProbeError> {
    let redirect_policy = if cfg.follow_redirects {
        redirect::Policy::limited(10)
    } else {
        redirect::Policy::none()
    };

    let mut builder = ClientBuilder::new()
        .timeout(cfg.timeout)
        .redirect(redirect_policy)
        .danger_accept_invalid_certs(cfg.insecure)
        .user_agent(&cfg.user_agent)
        .default_headers(static_headers(cfg)?);

    if through_proxy {
        if let Some(addr) = &cfg.proxy {
            let proxy = Proxy::all(addr).map_err(|source| ProbeError::Proxy {
                addr: addr.clone(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }
    }

    builder.build().map_err(|source| ProbeError::Build { source })
}

/// Assembles the static header set sent with every request.
fn static_headers(cfg: &RunConfig) -> Result<HeaderMap, ProbeError> {
    let mut headers = HeaderMap::new();

    if let Some(auth) = &cfg.auth {
        let value = HeaderValue::from_str(&format!("Basic {auth}")).map_err(|_| {
            ProbeError::Header {
                name: "Authorization".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    if let Some(cookies) = &cfg.cookies {
        let value = HeaderValue::from_str(cookies).map_err(|_| ProbeError::Header {
            name: "Cookie".to_string(),
        })?;
        headers.insert(COOKIE, value);
    }

    for (key, value) in &cfg.headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| ProbeError::Header {
            name: key.clone(),
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| ProbeError::Header {
            name: key.clone(),
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Truncates a body to [`MAX_BODY_LEN`] without splitting a UTF-8 char.
fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_BODY_LEN {
        let mut end = MAX_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(cfg: &RunConfig) -> (ProbeClient, Arc<Counters>) {
        let counters = Arc::new(Counters::new());
        let client = ProbeClient::from_config(cfg, Arc::clone(&counters)).unwrap();
        (client, counters)
    }

    #[tokio::test]
    async fn test_execute_returns_status_body_and_elapsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Welcome Admin"))
            .mount(&server)
            .await;

        let (client, counters) = test_client(&RunConfig::default());
        let url = Url::parse(&format!("{}/admin", server.uri())).unwrap();
        let response = client.execute(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Welcome Admin");
        assert_eq!(counters.total_tested(), 1);
    }

    #[tokio::test]
    async fn test_execute_counts_failed_probe_as_tested() {
        // Nothing listens on this port; connection is refused.
        let cfg = RunConfig {
            timeout: Duration::from_secs(1),
            ..RunConfig::default()
        };
        let (client, counters) = test_client(&cfg);
        let url = Url::parse("http://127.0.0.1:1/never").unwrap();

        let result = client.execute(&url).await;
        assert!(result.is_err());
        assert!(!result.unwrap_err().is_fatal());
        assert_eq!(counters.total_tested(), 1);
    }

    #[tokio::test]
    async fn test_execute_timeout_maps_to_timeout_variant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let cfg = RunConfig {
            timeout: Duration::from_millis(200),
            ..RunConfig::default()
        };
        let (client, _) = test_client(&cfg);
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();

        let result = client.execute(&url).await;
        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_head_mode_sends_head_and_drops_body() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = RunConfig {
            no_get: true,
            ..RunConfig::default()
        };
        let (client, _) = test_client(&cfg);
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let response = client.execute(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_static_headers_sent_with_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::header("X-Api-Key", "abc"))
            .and(wiremock::matchers::header("Authorization", "Basic dXNlcjpwdw=="))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = RunConfig {
            auth: Some("dXNlcjpwdw==".to_string()),
            headers: vec![("X-Api-Key".to_string(), "abc".to_string())],
            ..RunConfig::default()
        };
        let (client, _) = test_client(&cfg);
        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        client.execute(&url).await.unwrap();
    }

    #[test]
    fn test_invalid_header_name_is_fatal() {
        let cfg = RunConfig {
            headers: vec![("bad header".to_string(), "x".to_string())],
            ..RunConfig::default()
        };
        let counters = Arc::new(Counters::new());
        let result = ProbeClient::from_config(&cfg, counters);
        assert!(matches!(result, Err(ProbeError::Header { .. })));
    }

    #[test]
    fn test_invalid_proxy_is_fatal() {
        let cfg = RunConfig {
            proxy: Some("not a proxy".to_string()),
            ..RunConfig::default()
        };
        let counters = Arc::new(Counters::new());
        let result = ProbeClient::from_config(&cfg, counters);
        assert!(matches!(result, Err(ProbeError::Proxy { .. })));
    }

    #[test]
    fn test_truncate_body_char_boundary_safe() {
        let long = "é".repeat(MAX_BODY_LEN);
        let truncated = truncate_body(long);
        assert!(truncated.len() <= MAX_BODY_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
