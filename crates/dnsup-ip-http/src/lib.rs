// # HTTP IP Resolver
//
// This crate asks an external "what is my IP" endpoint for the caller's
// public address.
//
// ## Behavior
//
// - One GET per `resolve()` call, bounded by the client timeout
// - Non-2xx answers and transport failures become `Error::Network`
// - The trimmed body is returned as-is; IP syntax is not validated
// - Nothing is cached: every call goes to the network

use dnsup_core::config::ResolverConfig;
use dnsup_core::error::chain_message;
use dnsup_core::traits::IpResolver;
use dnsup_core::{Error, Result};

use std::time::Duration;

/// Default per-request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP-based public IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL whose response body is the public IP
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver for `url` with the default 10 second timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a resolver with a custom per-request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a resolver from the `resolver` section of the configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::with_timeout(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<String> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("HTTP status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(transport_error)?;

        Ok(body.trim().to_string())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Map a reqwest failure to a network error naming what went wrong
///
/// The URL is stripped; the cause carries the whole source chain.
fn transport_error(e: reqwest::Error) -> Error {
    let e = e.without_url();
    let kind = if e.is_timeout() {
        "Request timed out"
    } else if e.is_connect() {
        "Connection failed"
    } else if e.is_body() || e.is_decode() {
        "Failed to read response"
    } else {
        "Request failed"
    };
    Error::network(format!("{}: {}", kind, chain_message(&e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use std::net::SocketAddr;

    /// Serve `router` on an ephemeral local port
    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_resolve_trims_body() {
        let addr = serve(Router::new().route("/myip", get(|| async { "  203.0.113.5\n" }))).await;
        let resolver = HttpIpResolver::new(format!("http://{}/myip", addr));

        assert_eq!(resolver.resolve().await.unwrap(), "203.0.113.5");
    }

    #[tokio::test]
    async fn test_body_is_not_validated_as_ip() {
        let addr = serve(Router::new().route("/myip", get(|| async { "not-an-ip" }))).await;
        let resolver = HttpIpResolver::new(format!("http://{}/myip", addr));

        assert_eq!(resolver.resolve().await.unwrap(), "not-an-ip");
    }

    #[tokio::test]
    async fn test_non_success_status_is_network_error() {
        let addr = serve(Router::new().route(
            "/myip",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
        ))
        .await;
        let resolver = HttpIpResolver::new(format!("http://{}/myip", addr));

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.cause().contains("503"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let resolver = HttpIpResolver::new(format!("http://{}/myip", addr));

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.cause().starts_with("Connection failed"), "{}", err.cause());
        assert_ne!(err.cause(), "Connection failed: error sending request");
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let addr = serve(Router::new().route(
            "/myip",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "203.0.113.5"
            }),
        ))
        .await;
        let resolver =
            HttpIpResolver::with_timeout(format!("http://{}/myip", addr), Duration::from_millis(200));

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.cause().contains("timed out"), "{}", err.cause());
    }

    #[test]
    fn test_from_config_uses_url() {
        let config = ResolverConfig::default();
        let resolver = HttpIpResolver::from_config(&config);
        assert_eq!(resolver.endpoint(), dnsup_core::config::DEFAULT_IP_URL);
    }
}
