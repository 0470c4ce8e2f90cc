use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

/// A user table entry as it appears in configuration: either a bare password
/// or a full record.
#[derive(Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CredentialEntry {
    Legacy(String),
    Full(FullEntry),
}

#[derive(Clone, Deserialize)]
pub(crate) struct FullEntry {
    pub(crate) password: Option<String>,
    pub(crate) password_hash: Option<String>,
    #[serde(default)]
    pub(crate) token_limit: u32,
    #[serde(default = "enabled_by_default")]
    pub(crate) enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl CredentialEntry {
    pub(crate) fn admin(password: &str, token_limit: u32) -> Self {
        CredentialEntry::Full(FullEntry {
            password: Some(password.to_owned()),
            password_hash: None,
            token_limit,
            enabled: true,
        })
    }
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialEntry::Legacy(_) => f.write_str("Legacy(..)"),
            CredentialEntry::Full(entry) => f
                .debug_struct("Full")
                .field("token_limit", &entry.token_limit)
                .field("enabled", &entry.enabled)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Clone)]
pub(crate) enum Secret {
    Plain(String),
    Bcrypt(String),
    /// Entry had no usable password; never verifies.
    Missing,
}

impl Secret {
    /// A malformed hash counts as a mismatch so the caller sees the same
    /// rejection as for an unknown user.
    pub(crate) fn verify(&self, password: &str) -> bool {
        match self {
            Secret::Plain(expected) => expected.as_bytes().ct_eq(password.as_bytes()).into(),
            Secret::Bcrypt(hash) => bcrypt::verify(password, hash).unwrap_or_else(|e| {
                tracing::warn!("Unusable password hash: {}", e);
                false
            }),
            Secret::Missing => false,
        }
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Secret::Plain(_) => f.write_str("Plain(..)"),
            Secret::Bcrypt(_) => f.write_str("Bcrypt(..)"),
            Secret::Missing => f.write_str("Missing"),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CredentialRecord {
    pub(crate) username: String,
    pub(crate) secret: Secret,
    /// 0 means unlimited.
    pub(crate) token_limit: u32,
    pub(crate) enabled: bool,
}

impl CredentialRecord {
    fn from_entry(username: String, entry: CredentialEntry) -> Self {
        match entry {
            CredentialEntry::Legacy(password) => Self {
                username,
                secret: Secret::Plain(password),
                token_limit: 0,
                enabled: true,
            },
            CredentialEntry::Full(entry) => {
                let secret = match (entry.password_hash, entry.password) {
                    (Some(hash), _) => Secret::Bcrypt(hash),
                    (None, Some(password)) => Secret::Plain(password),
                    (None, None) => Secret::Missing,
                };

                Self {
                    username,
                    secret,
                    token_limit: entry.token_limit,
                    enabled: entry.enabled,
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CredentialStore {
    users: Arc<RwLock<HashMap<String, CredentialRecord>>>,
}

impl CredentialStore {
    pub(crate) fn new(entries: HashMap<String, CredentialEntry>) -> Self {
        let users = entries
            .into_iter()
            .map(|(username, entry)| {
                (
                    username.clone(),
                    CredentialRecord::from_entry(username, entry),
                )
            })
            .collect();

        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub(crate) async fn lookup(&self, username: &str) -> Option<CredentialRecord> {
        self.users.read().await.get(username).cloned()
    }

    /// Flips the `enabled` flag for a user. Returns false for unknown users.
    #[cfg(test)]
    pub(crate) async fn set_enabled(&self, username: &str, enabled: bool) -> bool {
        match self.users.write().await.get_mut(username) {
            Some(record) => {
                record.enabled = enabled;
                tracing::info!(username, enabled, "Updated account status");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(HashMap::from([
            ("legacy".to_owned(), CredentialEntry::Legacy("hunter2".into())),
            (
                "limited".to_owned(),
                CredentialEntry::Full(FullEntry {
                    password: Some("pass1".into()),
                    password_hash: None,
                    token_limit: 2,
                    enabled: false,
                }),
            ),
            (
                "empty".to_owned(),
                CredentialEntry::Full(FullEntry {
                    password: None,
                    password_hash: None,
                    token_limit: 0,
                    enabled: true,
                }),
            ),
        ]))
    }

    #[tokio::test]
    async fn legacy_entry_normalizes_to_unlimited_enabled() {
        let record = store().lookup("legacy").await.unwrap();

        assert_eq!(record.username, "legacy");
        assert_eq!(record.token_limit, 0);
        assert!(record.enabled);
        assert!(record.secret.verify("hunter2"));
        assert!(!record.secret.verify("hunter3"));
    }

    #[tokio::test]
    async fn full_entry_keeps_limit_and_flag() {
        let record = store().lookup("limited").await.unwrap();

        assert_eq!(record.token_limit, 2);
        assert!(!record.enabled);
    }

    #[tokio::test]
    async fn missing_password_never_verifies() {
        let record = store().lookup("empty").await.unwrap();

        assert!(!record.secret.verify(""));
        assert!(!record.secret.verify("anything"));
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        assert!(store().lookup("nobody").await.is_none());
    }

    #[tokio::test]
    async fn set_enabled_updates_record() {
        let store = store();

        assert!(store.set_enabled("limited", true).await);
        assert!(store.lookup("limited").await.unwrap().enabled);
        assert!(!store.set_enabled("nobody", true).await);
    }

    #[test]
    fn bcrypt_secret_verifies() {
        let hash = bcrypt::hash("s3cret", 4).unwrap();
        let secret = Secret::Bcrypt(hash);

        assert!(secret.verify("s3cret"));
        assert!(!secret.verify("wrong"));
    }

    #[test]
    fn malformed_bcrypt_hash_never_verifies() {
        let secret = Secret::Bcrypt("not-a-bcrypt-hash".into());

        assert!(!secret.verify("not-a-bcrypt-hash"));
        assert!(!secret.verify(""));
    }
}
