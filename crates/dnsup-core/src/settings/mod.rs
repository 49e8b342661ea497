// # Settings
//
// The values a user enters once and expects to find again on the next
// launch: the record credentials and the chosen update interval.
//
// ## File Format
//
// ```json
// {
//   "record_id": "42",
//   "email": "a@b.com",
//   "api_key": "k1",
//   "interval": "4 hours"
// }
// ```

pub mod file;
pub mod memory;

pub use file::FileSettingsStore;
pub use memory::MemorySettingsStore;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::interval::Interval;

/// Persisted user settings
///
/// Missing keys load as empty strings, so a partially written file still
/// yields whatever it does contain.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Record identifier
    #[serde(default)]
    pub record_id: String,

    /// Account email
    #[serde(default)]
    pub email: String,

    /// API key
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub api_key: String,

    /// Interval label, empty when none was chosen
    #[serde(default)]
    pub interval: String,
}

impl Settings {
    /// Build settings from the values a run was started with
    pub fn new(credentials: &Credentials, interval: Option<Interval>) -> Self {
        Self {
            record_id: credentials.record_id.clone(),
            email: credentials.account.clone(),
            api_key: credentials.secret.clone(),
            interval: interval.map(String::from).unwrap_or_default(),
        }
    }

    /// Credentials described by these settings
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.record_id, &self.email, &self.api_key)
    }

    /// The saved interval
    ///
    /// A label that is not one of the supported intervals reads as no
    /// interval at all, the same as an empty one.
    pub fn interval(&self) -> Option<Interval> {
        self.interval.parse().ok()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("record_id", &self.record_id)
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("interval", &self.interval)
            .finish()
    }
}
