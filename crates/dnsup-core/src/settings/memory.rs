// # Memory Settings Store
//
// In-memory implementation of SettingsStore. Nothing survives a restart;
// useful for tests and for embedding applications that persist settings
// their own way.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::settings::Settings;
use crate::traits::SettingsStore;

/// In-memory settings store
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<RwLock<Option<Settings>>>,
}

impl MemorySettingsStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `settings`
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(settings))),
        }
    }

    /// Forget the saved settings
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<Settings>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), Error> {
        *self.inner.write().await = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::interval::Interval;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemorySettingsStore::new();

        // Initially empty
        assert!(store.load().await.unwrap().is_none());

        let settings = Settings::new(
            &Credentials::new("42", "a@b.com", "k1"),
            Some(Interval::SixHours),
        );
        store.save(&settings).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(settings));

        store.clear().await;
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemorySettingsStore::new();
        let other = store.clone();

        let settings = Settings::new(&Credentials::new("7", "x@y.org", "s"), None);
        other.save(&settings).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(settings));
    }
}
