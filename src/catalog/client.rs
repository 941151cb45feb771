//! Blocking HTTP client for the upstream card catalog.
//!
//! The client is built once from a [`CatalogConfig`] and never mutated
//! afterwards; the underlying `reqwest` client pools connections and is safe to
//! share across threads.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use serde_json::Value;

use super::pricing::card_from_record;
use super::query::{build_query, clamp_limit};
use crate::config::{self, EmptyQueryPolicy};
use crate::error::{Result, StackTrackError};
use crate::models::{ProbeReport, SearchFilter, SearchResultItem};

const API_KEY_HEADER: &str = "x-api-key";

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

/// Settings for [`CatalogClient`]. Start from [`Default`] or [`CatalogConfig::from_env`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    base_url: String,
    api_key: Option<String>,
    proxied: bool,
    connect_timeout: Duration,
    timeout: Duration,
    retry_backoff: Duration,
    empty_query_policy: EmptyQueryPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_CATALOG_BASE.to_string(),
            api_key: None,
            proxied: false,
            connect_timeout: config::CONNECT_TIMEOUT,
            timeout: config::RESPONSE_TIMEOUT,
            retry_backoff: config::RETRY_BACKOFF,
            empty_query_policy: EmptyQueryPolicy::default(),
        }
    }
}

impl CatalogConfig {
    /// Read `POKEMONTCG_API_KEY`, `POKEMONTCG_BASE_URL` and `STACKTRACK_EMPTY_QUERY`.
    ///
    /// Unset variables keep their defaults; an unrecognized empty-query policy
    /// is a configuration error.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(key) = std::env::var(config::ENV_API_KEY) {
            cfg = cfg.api_key(key);
        }
        if let Ok(url) = std::env::var(config::ENV_BASE_URL) {
            cfg = cfg.base_url(url);
        }
        if let Ok(policy) = std::env::var(config::ENV_EMPTY_QUERY) {
            let parsed = EmptyQueryPolicy::parse(&policy).ok_or_else(|| {
                StackTrackError::Config(format!(
                    "{} must be `browse` or `strict`, got `{}`",
                    config::ENV_EMPTY_QUERY,
                    policy
                ))
            })?;
            cfg = cfg.empty_query_policy(parsed);
        }
        Ok(cfg)
    }

    /// Upstream base URL including the API version path. Trailing slashes are dropped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// API key sent as `X-Api-Key` when talking to the catalog directly.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into().trim().to_string();
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    /// Mark the base URL as an intermediary that authenticates on our behalf.
    ///
    /// Hosts on `*.workers.dev` are treated this way automatically.
    pub fn proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Total time allowed for one request, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pause before the single retry after a transport failure.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn empty_query_policy(mut self, policy: EmptyQueryPolicy) -> Self {
        self.empty_query_policy = policy;
        self
    }

    fn is_proxied(&self) -> bool {
        self.proxied || self.base_url.contains(config::PROXY_HOST_MARKER)
    }
}

// ---------------------------------------------------------------------------
// CatalogClient
// ---------------------------------------------------------------------------

/// Searches the upstream catalog and normalizes the results.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
    retry_backoff: Duration,
    empty_query_policy: EmptyQueryPolicy,
}

impl CatalogClient {
    /// Build the client. Fails if the catalog needs an API key and none is set.
    pub fn new(cfg: CatalogConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        if !cfg.is_proxied() {
            let key = cfg.api_key.as_deref().ok_or_else(|| {
                StackTrackError::Config(format!("{} is not set", config::ENV_API_KEY))
            })?;
            let mut value = HeaderValue::from_str(key).map_err(|_| {
                StackTrackError::Config(format!("{} contains invalid characters", config::ENV_API_KEY))
            })?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let http = Client::builder()
            .user_agent(config::USER_AGENT)
            .default_headers(headers)
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| StackTrackError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: cfg.base_url,
            retry_backoff: cfg.retry_backoff,
            empty_query_policy: cfg.empty_query_policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn empty_query_policy(&self) -> EmptyQueryPolicy {
        self.empty_query_policy
    }

    /// Search cards matching `query`, at most `limit` (clamped to 1..=50,
    /// 10 when `None`).
    ///
    /// Results keep the upstream relevance order.
    pub fn search(
        &self,
        query: &str,
        limit: impl Into<Option<usize>>,
    ) -> Result<Vec<SearchResultItem>> {
        self.search_filtered(query, limit, &SearchFilter::default())
    }

    /// [`search`](Self::search) with a structured filter ANDed onto the query.
    pub fn search_filtered(
        &self,
        query: &str,
        limit: impl Into<Option<usize>>,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResultItem>> {
        if query.trim().is_empty() && self.empty_query_policy == EmptyQueryPolicy::Strict {
            return Err(StackTrackError::Validation(
                "search query must not be blank".to_string(),
            ));
        }

        let limit = clamp_limit(limit.into().unwrap_or(config::DEFAULT_SEARCH_LIMIT));
        let mut params: Vec<(&str, String)> = Vec::with_capacity(3);
        if let Some(q) = build_query(query, filter) {
            params.push(("q", q));
        }
        params.push(("pageSize", limit.to_string()));
        params.push(("select", config::CARD_SELECT.to_string()));

        let url = format!("{}/cards", self.base_url);
        let (status, body) = self.get_with_retry(&url, &params)?;

        if !(200..300).contains(&status) {
            tracing::warn!(status, url = %url, "catalog returned an error status");
            return Err(StackTrackError::UpstreamError {
                status,
                body: truncate(&body),
            });
        }

        let root: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "catalog response is not JSON");
            StackTrackError::UpstreamError {
                status,
                body: truncate(&body),
            }
        })?;

        let records = root
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match card_from_record(record) {
                Some(card) => out.push(card),
                None => tracing::warn!("skipping catalog record without an id"),
            }
        }

        tracing::debug!(query, limit, results = out.len(), "catalog search");
        Ok(out)
    }

    /// Probe the catalog with a one-entry sets request. Never retried.
    ///
    /// Reports what happened instead of failing, so it can back a health
    /// or diagnostics endpoint.
    pub fn probe(&self) -> ProbeReport {
        self.probe_url(format!("{}/sets", self.base_url), &[("pageSize", "1")])
    }

    /// Probe the search path itself with a one-card query.
    ///
    /// Succeeds only if the upstream can actually run a `cards` search, which
    /// [`probe`](Self::probe) alone does not show.
    pub fn probe_cards(&self) -> ProbeReport {
        self.probe_url(
            format!("{}/cards", self.base_url),
            &[("q", "name:pika*"), ("pageSize", "1"), ("select", "id,name")],
        )
    }

    /// Probe `/health` at the root of the catalog host.
    ///
    /// Meaningful for the authenticating proxy, which answers it without
    /// contacting the catalog.
    pub fn probe_health(&self) -> ProbeReport {
        match reqwest::Url::parse(&self.base_url).and_then(|base| base.join("/health")) {
            Ok(url) => self.probe_url(url.to_string(), &[]),
            Err(e) => ProbeReport {
                url: self.base_url.clone(),
                status: None,
                elapsed_ms: 0,
                sample: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn probe_url(&self, url: String, params: &[(&str, &str)]) -> ProbeReport {
        let started = Instant::now();
        let result = self.http.get(&url).query(params).send().and_then(|resp| {
            let status = resp.status().as_u16();
            resp.text().map(|body| (status, body))
        });
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok((status, body)) => ProbeReport {
                url,
                status: Some(status),
                elapsed_ms,
                sample: Some(truncate(&body)),
                error: None,
            },
            Err(e) => {
                tracing::debug!(error = %e, url = %url, "catalog probe failed");
                ProbeReport {
                    url,
                    status: None,
                    elapsed_ms,
                    sample: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// GET with one retry on transport failure. Any HTTP status counts as a
    /// response and is returned as-is.
    fn get_with_retry(&self, url: &str, params: &[(&str, String)]) -> Result<(u16, String)> {
        match self.get_once(url, params) {
            Ok(out) => Ok(out),
            Err(first) => {
                tracing::warn!(error = %first, url, "catalog request failed, retrying once");
                thread::sleep(self.retry_backoff);
                self.get_once(url, params).map_err(|last| {
                    tracing::warn!(error = %last, url, "catalog request failed after retry");
                    StackTrackError::UpstreamUnavailable(last)
                })
            }
        }
    }

    fn get_once(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<(u16, String), reqwest::Error> {
        let resp = self.http.get(url).query(params).send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok((status, body))
    }
}

/// Cut a diagnostic body to a bounded number of characters.
fn truncate(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(config::DIAGNOSTIC_BODY_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
