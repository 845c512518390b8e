//! Persisted session state: tokens and the signed-in user.
//!
//! Tokens live in the OS keyring, namespaced per profile. An in-memory
//! store backs tests and `--mock` runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::error::{ApiError, Result};
use super::types::{TokenResponse, User};

/// The keyring service name for TrackOps credentials.
const KEYRING_SERVICE: &str = "trackops";

/// The keys persisted for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    /// The signed-in user, as JSON.
    User,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "access_token",
            CredentialKey::RefreshToken => "refresh_token",
            CredentialKey::User => "user",
        }
    }
}

/// Key/value storage for session credentials.
pub trait CredentialStore: Send + Sync {
    /// Read a value. Missing entries are `Ok(None)`.
    fn get(&self, key: CredentialKey) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: CredentialKey, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing entry is not an error.
    fn remove(&self, key: CredentialKey) -> Result<()>;
}

/// Credential storage in the OS keyring.
///
/// Entries are stored under service `trackops` with username
/// `<profile>:<key>`.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    profile: String,
}

impl KeyringStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn entry(&self, key: CredentialKey) -> Result<keyring::Entry> {
        let user = format!("{}:{}", self.profile, key.as_str());
        keyring::Entry::new(KEYRING_SERVICE, &user)
            .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ApiError::Keyring(format!(
                "failed to retrieve {}: {}",
                key.as_str(),
                e
            ))),
        }
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| ApiError::Keyring(format!("failed to store {}: {}", key.as_str(), e)))
    }

    fn remove(&self, key: CredentialKey) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ApiError::Keyring(format!(
                "failed to delete {}: {}",
                key.as_str(),
                e
            ))),
        }
    }
}

/// Credential storage in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<CredentialKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<CredentialKey, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        Ok(self.values().get(&key).cloned())
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.values().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: CredentialKey) -> Result<()> {
        self.values().remove(&key);
        Ok(())
    }
}

/// Typed access to the persisted session.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// A session backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        self.store.get(CredentialKey::AccessToken)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.store.get(CredentialKey::RefreshToken)
    }

    /// The persisted user, if any.
    ///
    /// A corrupt entry is treated as absent.
    pub fn user(&self) -> Result<Option<User>> {
        let Some(raw) = self.store.get(CredentialKey::User)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("Ignoring unreadable stored user: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist tokens from a login, refresh or SSO callback.
    ///
    /// The refresh token is only replaced when a new one was issued. The
    /// user is saved when the response includes one.
    pub fn store_tokens(&self, tokens: &TokenResponse) -> Result<()> {
        self.store
            .set(CredentialKey::AccessToken, &tokens.access_token)?;
        if let Some(refresh) = &tokens.refresh_token {
            self.store.set(CredentialKey::RefreshToken, refresh)?;
        }
        if let Some(user) = &tokens.user {
            self.store_user(user)?;
        }
        debug!("Stored session tokens");
        Ok(())
    }

    pub fn store_user(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.store.set(CredentialKey::User, &raw)
    }

    /// Remove every persisted credential.
    ///
    /// Attempts all keys even if one fails and reports the first failure.
    pub fn clear(&self) -> Result<()> {
        let mut first_err = None;
        for key in CredentialKey::ALL {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to clear {}: {}", key.as_str(), e);
                first_err.get_or_insert(e);
            }
        }
        debug!("Cleared session credentials");
        first_err.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session { .. }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(access: &str, refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            token_type: "bearer".to_string(),
            expires_in: Some(3600),
            user: None,
        }
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(CredentialKey::AccessToken).unwrap(), None);
        store.set(CredentialKey::AccessToken, "abc").unwrap();
        assert_eq!(
            store.get(CredentialKey::AccessToken).unwrap().as_deref(),
            Some("abc")
        );
        store.remove(CredentialKey::AccessToken).unwrap();
        store.remove(CredentialKey::AccessToken).unwrap();
        assert_eq!(store.get(CredentialKey::AccessToken).unwrap(), None);
    }

    #[test]
    fn test_store_tokens_keeps_refresh_when_absent() {
        let session = Session::in_memory();
        session.store_tokens(&tokens("a1", Some("r1"))).unwrap();
        session.store_tokens(&tokens("a2", None)).unwrap();

        assert_eq!(session.access_token().unwrap().as_deref(), Some("a2"));
        assert_eq!(session.refresh_token().unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn test_clear_removes_everything() {
        let session = Session::in_memory();
        session.store_tokens(&tokens("a1", Some("r1"))).unwrap();
        session.clear().unwrap();

        assert!(session.access_token().unwrap().is_none());
        assert!(session.refresh_token().unwrap().is_none());
        assert!(session.user().unwrap().is_none());
    }

    #[test]
    fn test_user_roundtrip_and_corrupt_entry() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());

        let user: User = serde_json::from_value(json!({
            "id": 1,
            "authentik_id": "ak-1",
            "email": "dev@example.com",
            "username": "dev",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        session.store_user(&user).unwrap();
        assert_eq!(session.user().unwrap(), Some(user));

        store.set(CredentialKey::User, "not json").unwrap();
        assert_eq!(session.user().unwrap(), None);
    }

    #[test]
    fn test_credential_key_names() {
        assert_eq!(CredentialKey::AccessToken.as_str(), "access_token");
        assert_eq!(CredentialKey::RefreshToken.as_str(), "refresh_token");
        assert_eq!(CredentialKey::User.as_str(), "user");
    }
}
