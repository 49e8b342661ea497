//! Core traits for dnsup
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Ask an external service for the public IP
//! - [`RecordUpdater`]: Push an IP to the DNS update endpoint
//! - [`SettingsStore`]: Persist credentials and interval between runs

pub mod ip_resolver;
pub mod record_updater;
pub mod settings_store;

pub use ip_resolver::IpResolver;
pub use record_updater::RecordUpdater;
pub use settings_store::SettingsStore;
