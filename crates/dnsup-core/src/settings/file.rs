// # File Settings Store
//
// File-based implementation of SettingsStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of the previous settings
// - Recovery: Falls back to backup if corruption detected
//
// On Unix the file is created with mode 0600 since it holds the API key.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::settings::Settings;
use crate::traits::SettingsStore;

/// File-based settings store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use dnsup_core::settings::{FileSettingsStore, Settings};
/// use dnsup_core::traits::SettingsStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSettingsStore::new("/var/lib/dnsup/settings.json").await?;
///
///     if let Some(settings) = store.load().await? {
///         println!("Record: {}", settings.record_id);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    /// Serializes writers so two saves never share the temp file
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    /// Create a store backed by `path`, creating parent directories if needed
    ///
    /// The file itself is not read until [`SettingsStore::load`].
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::settings(format!(
                    "Failed to create settings directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse one file
    ///
    /// `Ok(None)` when the file does not exist; `Err(Error::Json)` when it
    /// exists but cannot be parsed.
    async fn read(path: &Path) -> Result<Option<Settings>, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Settings file does not exist: {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::settings(format!(
                    "Failed to read settings file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let settings = serde_json::from_str(&content)?;
        Ok(Some(settings))
    }

    /// Load the main file, falling back to the backup if it is corrupted
    async fn load_with_recovery(&self) -> Result<Option<Settings>, Error> {
        let parse_error = match Self::read(&self.path).await {
            Err(Error::Json(e)) => e,
            other => return other,
        };

        tracing::warn!(
            "Settings file {} appears corrupted: {}. Attempting recovery from backup.",
            self.path.display(),
            parse_error
        );

        let backup_path = Self::backup_path(&self.path);
        match Self::read(&backup_path).await {
            Ok(Some(settings)) => {
                tracing::info!("Recovered settings from backup");
                if let Err(e) = fs::copy(&backup_path, &self.path).await {
                    tracing::error!("Failed to restore settings file from backup: {}", e);
                }
                Ok(Some(settings))
            }
            Ok(None) => {
                tracing::warn!("No backup file found. Starting with empty settings.");
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Backup also unreadable: {}. Starting with empty settings.", e);
                Ok(None)
            }
        }
    }

    /// Write settings atomically (temp file, backup, rename)
    async fn write(&self, settings: &Settings) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let json = serde_json::to_string_pretty(settings)?;

        let temp_path = self.temp_path();
        {
            let mut options = fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options.open(&temp_path).await.map_err(|e| {
                Error::settings(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::settings(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::settings(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous settings as a backup
        match fs::copy(&self.path, Self::backup_path(&self.path)).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to create settings backup: {}", e),
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::settings(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Settings written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Option<Settings>, Error> {
        self.load_with_recovery().await
    }

    async fn save(&self, settings: &Settings) -> Result<(), Error> {
        self.write(settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::interval::Interval;
    use tempfile::tempdir;

    fn settings(record_id: &str, interval: Option<Interval>) -> Settings {
        Settings::new(&Credentials::new(record_id, "a@b.com", "k1"), interval)
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingsStore::new(&path).await.unwrap();

        // Initially empty
        assert!(store.load().await.unwrap().is_none());

        let saved = settings("42", Some(Interval::FourHours));
        store.save(&saved).await.unwrap();
        assert!(path.exists());

        // Load new instance and verify persistence
        let store2 = FileSettingsStore::new(&path).await.unwrap();
        assert_eq!(store2.load().await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_file_format_is_flat_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingsStore::new(&path).await.unwrap();
        store.save(&settings("42", Some(Interval::SixtyMinutes))).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["record_id"], "42");
        assert_eq!(raw["email"], "a@b.com");
        assert_eq!(raw["api_key"], "k1");
        assert_eq!(raw["interval"], "60 minutes");
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingsStore::new(&path).await.unwrap();
        let first = settings("1", Some(Interval::SixHours));
        store.save(&first).await.unwrap();

        // Second write leaves the first one in the backup
        store.save(&settings("2", Some(Interval::SixHours))).await.unwrap();
        assert!(FileSettingsStore::backup_path(&path).exists());

        fs::write(&path, b"corrupted json data").await.unwrap();

        let recovered = store.load().await.unwrap();
        assert_eq!(recovered, Some(first));

        // The main file was restored from the backup
        let reloaded = FileSettingsStore::new(&path).await.unwrap();
        assert_eq!(reloaded.load().await.unwrap().unwrap().record_id, "1");
    }

    #[tokio::test]
    async fn test_corruption_without_backup_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{not json").await.unwrap();

        let store = FileSettingsStore::new(&path).await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dnsup").join("settings.json");

        let store = FileSettingsStore::new(&path).await.unwrap();
        store.save(&settings("42", None)).await.unwrap();

        assert!(path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_not_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingsStore::new(&path).await.unwrap();
        store.save(&settings("42", None)).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
