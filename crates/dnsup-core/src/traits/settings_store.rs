// # Settings Store Trait
//
// Defines the load/save contract for the user's settings (credentials and
// chosen interval) so they survive restarts.
//
// ## Implementations
//
// - File-based: JSON file with atomic writes and backup recovery
// - Memory: for tests and embedding
//
// The engine itself never touches this store; callers load settings
// before `Scheduler::start` and save them when they choose to.

use async_trait::async_trait;

use crate::settings::Settings;

/// Trait for settings store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the saved settings
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Settings))`: Previously saved settings
    /// - `Ok(None)`: Nothing saved yet
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<Option<Settings>, crate::Error>;

    /// Replace the saved settings
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully saved
    /// - `Err(Error)`: Storage error
    async fn save(&self, settings: &Settings) -> Result<(), crate::Error>;
}
