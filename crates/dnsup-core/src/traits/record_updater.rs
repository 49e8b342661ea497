// # Record Updater Trait
//
// Defines the interface for repointing the DNS record at a new IP.
//
// ## Implementations
//
// - Sitelutions: `dnsup-provider-sitelutions` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsup_core::{Credentials, RecordUpdater};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let updater = /* RecordUpdater implementation */;
//     let credentials = Credentials::new("42", "a@b.com", "key");
//
//     let reply = updater.update(&credentials, "203.0.113.5").await?;
//     println!("Server said: {}", reply);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::credentials::Credentials;

/// Trait for record updater implementations
///
/// # Side Effects
///
/// A successful call mutates a real DNS record. Repeating a call with the
/// same IP is harmless, but two calls must never be in flight at once for
/// the same record; the `Scheduler` enforces that.
///
/// # Contract
///
/// - One request per call, bounded by a timeout
/// - Transport failure, timeout or non-2xx: `Err(Error::Network)`
/// - Success: the trimmed response body, verbatim. Provider status codes
///   embedded in the body are NOT interpreted.
/// - The secret never appears in logs or error causes
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (pacing is owned by the `Scheduler`)
/// - ❌ Skip the request because the IP looks unchanged
/// - ❌ Spawn tasks
#[async_trait]
pub trait RecordUpdater: Send + Sync {
    /// Point the record identified by `credentials` at `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The server's response body
    /// - `Err(Error)`: If the request failed
    async fn update(&self, credentials: &Credentials, ip: &str) -> Result<String, crate::Error>;

    /// Provider name (for log lines)
    fn provider_name(&self) -> &'static str;
}
