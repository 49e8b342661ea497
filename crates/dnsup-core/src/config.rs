//! Configuration types for dnsup
//!
//! This module defines the endpoint and engine settings. Credentials and
//! the update interval are not configuration: they are supplied to the
//! scheduler at start time.

use serde::{Deserialize, Serialize};

/// Default endpoint returning the caller's public IP as plain text
pub const DEFAULT_IP_URL: &str = "https://api2.sitelutions.com/myip";

/// Default DNS update endpoint
pub const DEFAULT_UPDATE_URL: &str = "https://api2.sitelutions.com/dnsup";

/// Main dnsup configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsupConfig {
    /// IP resolver configuration
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Record updater configuration
    #[serde(default)]
    pub updater: UpdaterConfig,

    /// Event sink settings
    #[serde(default)]
    pub events: EventConfig,
}

impl DnsupConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.resolver.validate()?;
        self.updater.validate()?;

        if self.events.channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// IP resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// URL returning the public IP as the response body
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("IP resolver", &self.url)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP resolver timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Record updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// DNS update endpoint
    #[serde(default = "default_update_url")]
    pub url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TTL sent with every update
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl UpdaterConfig {
    /// Validate the updater configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("Record updater", &self.url)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Record updater timeout must be > 0"));
        }
        if self.ttl == 0 {
            return Err(crate::Error::config("Record updater TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            url: default_update_url(),
            timeout_secs: default_timeout_secs(),
            ttl: default_ttl(),
        }
    }
}

/// Event sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Capacity of the event channel
    ///
    /// When full, new log lines are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn validate_url(component: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} URL cannot be empty", component)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} URL must use HTTP or HTTPS scheme. Got: {}",
            component, url
        )));
    }
    Ok(())
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

fn default_update_url() -> String {
    DEFAULT_UPDATE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_ttl() -> u32 {
    60
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DnsupConfig::new();

        assert_eq!(config.resolver.url, DEFAULT_IP_URL);
        assert_eq!(config.resolver.timeout_secs, 10);
        assert_eq!(config.updater.url, DEFAULT_UPDATE_URL);
        assert_eq!(config.updater.timeout_secs, 10);
        assert_eq!(config.updater.ttl, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DnsupConfig =
            serde_json::from_str(r#"{"updater": {"url": "http://127.0.0.1:8080/dnsup"}}"#).unwrap();

        assert_eq!(config.updater.url, "http://127.0.0.1:8080/dnsup");
        assert_eq!(config.updater.ttl, 60);
        assert_eq!(config.resolver.url, DEFAULT_IP_URL);
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut config = DnsupConfig::new();
        config.resolver.url = "ftp://example.com/ip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = DnsupConfig::new();
        config.updater.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
