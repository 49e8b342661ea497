//! Update operation
//!
//! One update is a two-step network action:
//!
//! ```text
//! ┌─────────────┐   ip    ┌───────────────┐
//! │ IpResolver  │────────▶│ RecordUpdater │
//! └─────────────┘         └───────────────┘
//!        │                        │
//!        └──────────┬─────────────┘
//!                   ▼
//!            ┌─────────────┐
//!            │  EventSink  │  one line per step
//!            └─────────────┘
//! ```
//!
//! Every failure is folded into an [`UpdateResult`]; nothing escapes
//! `execute` as an error.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::events::EventSink;
use crate::traits::{IpResolver, RecordUpdater};

/// Outcome of a single update operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// The record now points at `ip`
    Success {
        /// The resolved public IP
        ip: String,
        /// Response body from the update endpoint, verbatim
        server_message: String,
    },

    /// A credential field was empty; no request was made
    MissingCredentials,

    /// The public IP could not be determined; the updater was not called
    ResolveFailure {
        /// Underlying error
        cause: String,
    },

    /// The IP was resolved but the update request failed
    UpdateFailure {
        /// The IP that was resolved (for diagnostics)
        ip: String,
        /// Underlying error
        cause: String,
    },
}

impl UpdateResult {
    /// Whether the record was updated
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateResult::Success { .. })
    }

    /// The resolved IP, if resolution got that far
    pub fn ip(&self) -> Option<&str> {
        match self {
            UpdateResult::Success { ip, .. } | UpdateResult::UpdateFailure { ip, .. } => Some(ip),
            UpdateResult::MissingCredentials | UpdateResult::ResolveFailure { .. } => None,
        }
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateResult::Success { server_message, .. } => {
                write!(f, "SUCCESS: Server Response: {}", server_message)
            }
            UpdateResult::MissingCredentials => {
                f.write_str("ERROR: Record ID, account and secret are all required.")
            }
            UpdateResult::ResolveFailure { cause } => {
                write!(f, "ERROR: Could not get public IP. Details: {}", cause)
            }
            UpdateResult::UpdateFailure { ip, cause } => {
                write!(f, "ERROR: Update request for {} failed. Details: {}", ip, cause)
            }
        }
    }
}

/// Resolve-then-update, reported through an [`EventSink`]
///
/// The operation holds no state between calls: two executions with the
/// same public IP both send an update.
pub struct UpdateOperation {
    resolver: Arc<dyn IpResolver>,
    updater: Arc<dyn RecordUpdater>,
    sink: Arc<dyn EventSink>,
}

impl UpdateOperation {
    /// Create a new update operation
    ///
    /// # Parameters
    ///
    /// - `resolver`: Source of the public IP
    /// - `updater`: Client for the DNS update endpoint
    /// - `sink`: Receiver of one log line per step
    pub fn new(
        resolver: Arc<dyn IpResolver>,
        updater: Arc<dyn RecordUpdater>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            resolver,
            updater,
            sink,
        }
    }

    /// The sink this operation reports to
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Run one update for `credentials`
    pub async fn execute(&self, credentials: &Credentials) -> UpdateResult {
        if !credentials.is_complete() {
            warn!("Update requested with incomplete credentials");
            return self.finish(UpdateResult::MissingCredentials);
        }

        debug!("Fetching public IP address from {}", self.resolver.endpoint());
        let ip = match self.resolver.resolve().await {
            Ok(ip) => {
                info!("Public IP: {}", ip);
                self.sink.log(format!("Public IP found: {}", ip));
                ip
            }
            Err(e) => {
                warn!("Public IP lookup failed: {}", e);
                return self.finish(UpdateResult::ResolveFailure { cause: e.cause() });
            }
        };

        debug!(
            "Sending DNS update request to {} for record {}",
            self.updater.provider_name(),
            credentials.record_id
        );
        match self.updater.update(credentials, &ip).await {
            Ok(server_message) => {
                info!("Record {} updated -> {}", credentials.record_id, ip);
                self.finish(UpdateResult::Success { ip, server_message })
            }
            Err(e) => {
                warn!("Update of record {} failed: {}", credentials.record_id, e);
                self.finish(UpdateResult::UpdateFailure {
                    ip,
                    cause: e.cause(),
                })
            }
        }
    }

    fn finish(&self, result: UpdateResult) -> UpdateResult {
        self.sink.log(result.to_string());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_messages_name_the_step() {
        let resolve = UpdateResult::ResolveFailure {
            cause: "timed out".to_string(),
        };
        assert_eq!(
            resolve.to_string(),
            "ERROR: Could not get public IP. Details: timed out"
        );

        let update = UpdateResult::UpdateFailure {
            ip: "203.0.113.5".to_string(),
            cause: "HTTP status 500".to_string(),
        };
        assert!(update.to_string().contains("203.0.113.5"));
        assert!(update.to_string().contains("HTTP status 500"));
    }

    #[test]
    fn test_result_ip_accessor() {
        let success = UpdateResult::Success {
            ip: "203.0.113.5".to_string(),
            server_message: "good".to_string(),
        };
        assert!(success.is_success());
        assert_eq!(success.ip(), Some("203.0.113.5"));

        assert_eq!(UpdateResult::MissingCredentials.ip(), None);
        assert!(!UpdateResult::MissingCredentials.is_success());
    }
}
