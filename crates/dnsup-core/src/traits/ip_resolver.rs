// # IP Resolver Trait
//
// Defines the interface for discovering the host's public IP address.
//
// ## Implementations
//
// - HTTP: `dnsup-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsup_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//
//     let ip = resolver.resolve().await?;
//     println!("Public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP resolver implementations
///
/// A resolver issues exactly one request per call and reports what the
/// remote service says the caller's address is.
///
/// # Contract
///
/// - One outbound request per call, bounded by a timeout
/// - Transport failure, timeout or non-2xx: `Err(Error::Network)`
/// - Success: the trimmed response body, unvalidated (the update endpoint
///   is the authority on whether it is a usable address)
///
/// ## Forbidden Capabilities
/// - ❌ Retry internally (pacing is owned by the `Scheduler`)
/// - ❌ Cache the previous answer between calls
/// - ❌ Spawn tasks
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Fetch the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address as reported by the service
    /// - `Err(Error)`: If the request failed
    async fn resolve(&self) -> Result<String, crate::Error>;

    /// Endpoint queried by this resolver (for log lines)
    fn endpoint(&self) -> &str;
}
