// # Sitelutions DNS Provider
//
// This crate implements `RecordUpdater` against the Sitelutions `dnsup`
// endpoint.
//
// ## Request
//
// ```http
// GET /dnsup?user=<account>&pass=<secret>&id=<record id>&ip=<ip>&ttl=60
// ```
//
// The response body is a plain text status line. It is returned verbatim;
// provider codes in it are not interpreted, so an HTTP 200 whose body says
// the update was refused still counts as a success here.
//
// ## Security Requirements
//
// - The secret travels as a query parameter, so request URLs are stripped
//   from every transport error before it becomes an error cause
// - The secret never appears in logs or `Debug` output

use async_trait::async_trait;
use dnsup_core::config::UpdaterConfig;
use dnsup_core::error::chain_message;
use dnsup_core::traits::RecordUpdater;
use dnsup_core::{Credentials, Error, Result};
use std::time::Duration;

/// Default HTTP timeout for update requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// TTL requested for the record
const DEFAULT_TTL: u32 = 60;

/// Sitelutions record updater
///
/// Stateless and single-shot: one request per `update()` call, no retries.
#[derive(Clone)]
pub struct SitelutionsUpdater {
    /// Update endpoint
    url: String,

    /// TTL sent with every request
    ttl: u32,

    /// HTTP client for update requests
    client: reqwest::Client,
}

// Custom Debug implementation that omits the HTTP client
impl std::fmt::Debug for SitelutionsUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitelutionsUpdater")
            .field("url", &self.url)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SitelutionsUpdater {
    /// Create an updater for `url` with the default timeout and TTL
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_options(url, DEFAULT_HTTP_TIMEOUT, DEFAULT_TTL)
    }

    /// Create an updater with an explicit timeout and TTL
    pub fn with_options(url: impl Into<String>, timeout: Duration, ttl: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            url: url.into(),
            ttl,
            client,
        }
    }

    /// Create an updater from the `updater` section of the configuration
    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self::with_options(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.ttl,
        )
    }

    /// Update endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecordUpdater for SitelutionsUpdater {
    async fn update(&self, credentials: &Credentials, ip: &str) -> Result<String> {
        tracing::debug!(
            "Sending update for record {} (ip={}, ttl={})",
            credentials.record_id,
            ip,
            self.ttl
        );

        let ttl = self.ttl.to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("user", credentials.account.as_str()),
                ("pass", credentials.secret.as_str()),
                ("id", credentials.record_id.as_str()),
                ("ip", ip),
                ("ttl", ttl.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => Error::network(format!(
                    "Authentication failed: HTTP status {}",
                    status
                )),
                _ => Error::network(format!("HTTP status {}", status)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(transport_error)?;

        Ok(body.trim().to_string())
    }

    fn provider_name(&self) -> &'static str {
        "sitelutions"
    }
}

/// Map a reqwest failure to a network error naming what went wrong
///
/// `without_url()` drops the request URL, and with it the secret in the
/// query string. The source chain keeps the underlying reason.
fn transport_error(e: reqwest::Error) -> Error {
    let e = e.without_url();
    let kind = if e.is_timeout() {
        "Request timed out"
    } else if e.is_connect() {
        "Connection failed"
    } else if e.is_body() || e.is_decode() {
        "Failed to read response"
    } else {
        "HTTP request failed"
    };
    Error::network(format!("{}: {}", kind, chain_message(&e)))
}
