//! Credentials for the single DNS record managed by dnsup

use serde::{Deserialize, Serialize};

/// Identity of the record to update and the account allowed to update it
///
/// Values are opaque: the only local check is that no field is empty.
/// The update endpoint is the authority on whether they are valid.
///
/// # Security
///
/// The `Debug` implementation does NOT expose the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Provider-side identifier of the DNS record
    pub record_id: String,
    /// Account name (an email address for Sitelutions)
    pub account: String,
    /// API key or password
    /// ⚠️ NEVER log this value
    pub secret: String,
}

impl Credentials {
    /// Create a new credentials value
    pub fn new(
        record_id: impl Into<String>,
        account: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            account: account.into(),
            secret: secret.into(),
        }
    }

    /// Whether every field carries a value
    pub fn is_complete(&self) -> bool {
        !self.record_id.is_empty() && !self.account.is_empty() && !self.secret.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("record_id", &self.record_id)
            .field("account", &self.account)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_credentials() {
        assert!(Credentials::new("42", "a@b.com", "k1").is_complete());
    }

    #[test]
    fn test_any_empty_field_is_incomplete() {
        assert!(!Credentials::new("", "a@b.com", "k1").is_complete());
        assert!(!Credentials::new("42", "", "k1").is_complete());
        assert!(!Credentials::new("42", "a@b.com", "").is_complete());
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let credentials = Credentials::new("42", "a@b.com", "super_secret_key");
        let debug_str = format!("{:?}", credentials);

        assert!(!debug_str.contains("super_secret_key"));
        assert!(debug_str.contains("a@b.com"));
    }
}
