//! Accounts, profiles and the credentials attached to remote calls

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a library account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random AccountId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AccountId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a reader profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Creates a new random ProfileId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How requests authenticate against the library's circulation manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    /// `Authorization: Basic ...`
    Basic { username: String, password: String },
    /// `Authorization: Bearer ...`
    Bearer { token: String },
}

/// Login credentials of a signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub auth: AuthScheme,
    /// Where the account's annotations live; absent for libraries without sync
    pub annotations_uri: Option<Url>,
}

impl AccountCredentials {
    /// Credentials using a bearer token
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            auth: AuthScheme::Bearer { token: token.into() },
            annotations_uri: None,
        }
    }

    /// Credentials using HTTP basic auth
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth: AuthScheme::Basic {
                username: username.into(),
                password: password.into(),
            },
            annotations_uri: None,
        }
    }

    /// Sets the annotations URI
    pub fn with_annotations_uri(mut self, uri: Url) -> Self {
        self.annotations_uri = Some(uri);
        self
    }

    /// Returns a copy with the bearer token replaced.
    ///
    /// Basic credentials are upgraded to bearer credentials, which is what a
    /// server-issued token refresh means.
    pub fn with_refreshed_token(&self, token: impl Into<String>) -> Self {
        Self {
            auth: AuthScheme::Bearer { token: token.into() },
            annotations_uri: self.annotations_uri.clone(),
        }
    }
}

/// Per-account preferences persisted by the account registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPreferences {
    /// Whether the server allows bookmarks to be synchronized for this account
    pub bookmark_syncing_permitted: bool,
}

impl Default for AccountPreferences {
    fn default() -> Self {
        Self {
            bookmark_syncing_permitted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_roundtrip() {
        let id = AccountId::new();
        let parsed = AccountId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_refreshed_token_keeps_annotations_uri() {
        let uri = Url::parse("https://example.com/annotations/").unwrap();
        let creds = AccountCredentials::basic("user", "pass").with_annotations_uri(uri.clone());
        let refreshed = creds.with_refreshed_token("abc");
        assert_eq!(refreshed.annotations_uri, Some(uri));
        assert_eq!(refreshed.auth, AuthScheme::Bearer { token: "abc".to_string() });
    }

    #[test]
    fn test_preferences_default_to_not_permitted() {
        assert!(!AccountPreferences::default().bookmark_syncing_permitted);
    }
}
