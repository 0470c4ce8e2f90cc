//! In-memory bookkeeping of issued tokens.
//!
//! Records are keyed by username, then by token fingerprint. Expired records
//! are only removed when the owning user's bucket is touched (or by an
//! explicit [`TokenRegistry::sweep_all`]), so a user who never comes back
//! keeps their bucket resident for the life of the process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::controllers::credentials::CredentialRecord;
use crate::core::error::Error;
use crate::types::response::{TokenAllowance, TokenStatus};

const SLOT_PREFIX: &str = "API_";
const MAX_SEARCHED_SLOT: usize = 99;
const FINGERPRINT_LEN: usize = 16;

/// Short hex digest of a raw token, used as the registry key.
pub(crate) fn fingerprint(token: &str) -> String {
    let mut fingerprint = hex::encode(Sha256::digest(token.as_bytes()));
    fingerprint.truncate(FINGERPRINT_LEN);
    fingerprint
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TokenRecord {
    pub(crate) fingerprint: String,
    pub(crate) api_name: String,
    pub(crate) token: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
}

impl TokenRecord {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

type Bucket = HashMap<String, TokenRecord>;

#[derive(Debug, Default)]
struct Buckets {
    users: HashMap<String, Bucket>,
}

impl Buckets {
    fn sweep(&mut self, username: &str, now: DateTime<Utc>) {
        if let Some(bucket) = self.users.get_mut(username) {
            let before = bucket.len();
            bucket.retain(|_, record| record.is_live(now));

            if bucket.len() != before {
                tracing::debug!(
                    username,
                    removed = before - bucket.len(),
                    "Swept expired tokens"
                );
            }
        }
    }

    fn active_count(&mut self, username: &str, now: DateTime<Utc>) -> usize {
        self.sweep(username, now);
        self.users.get(username).map_or(0, HashMap::len)
    }

    fn next_available_slot(&mut self, username: &str, now: DateTime<Utc>) -> String {
        self.sweep(username, now);

        let Some(bucket) = self.users.get(username) else {
            return format!("{}1", SLOT_PREFIX);
        };

        (1..=MAX_SEARCHED_SLOT)
            .map(|n| format!("{}{}", SLOT_PREFIX, n))
            .find(|slot| !bucket.values().any(|record| &record.api_name == slot))
            // past 99 live tokens this can collide with a higher-numbered slot
            .unwrap_or_else(|| format!("{}{}", SLOT_PREFIX, bucket.len() + 1))
    }

    fn register(&mut self, username: &str, record: TokenRecord) {
        self.users
            .entry(username.to_owned())
            .or_default()
            .insert(record.fingerprint.clone(), record);
    }

    fn list(&mut self, username: &str, now: DateTime<Utc>) -> Vec<TokenRecord> {
        self.sweep(username, now);

        let mut records: Vec<TokenRecord> = self
            .users
            .get(username)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default();

        // plain string order: API_10 sorts before API_2
        records.sort_by(|a, b| a.api_name.cmp(&b.api_name));
        records
    }

    fn slot_by_fingerprint(&self, fingerprint: &str, now: DateTime<Utc>) -> Option<String> {
        self.users
            .values()
            .filter_map(|bucket| bucket.get(fingerprint))
            .find(|record| record.is_live(now))
            .map(|record| record.api_name.clone())
    }

    fn sweep_all(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;

        for bucket in self.users.values_mut() {
            let before = bucket.len();
            bucket.retain(|_, record| record.is_live(now));
            removed += before - bucket.len();
        }

        self.users.retain(|_, bucket| !bucket.is_empty());
        removed
    }
}

/// Process-wide registry of live tokens.
///
/// A single lock guards every bucket. Issuance holds it across the
/// count/slot/register sequence so two concurrent requests for the same user
/// cannot both observe a free slot.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenRegistry {
    buckets: Arc<Mutex<Buckets>>,
}

impl TokenRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn active_count(&self, username: &str) -> usize {
        self.buckets.lock().await.active_count(username, Utc::now())
    }

    /// Standalone form of the slot search [`TokenRegistry::admit`] performs
    /// under its own lock.
    #[cfg(test)]
    pub(crate) async fn next_available_slot(&self, username: &str) -> String {
        self.buckets
            .lock()
            .await
            .next_available_slot(username, Utc::now())
    }

    /// Records an already minted token. Issuance goes through
    /// [`TokenRegistry::admit`] instead.
    #[cfg(test)]
    pub(crate) async fn register(
        &self,
        username: &str,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        api_name: &str,
    ) {
        let record = TokenRecord {
            fingerprint: fingerprint(token),
            api_name: api_name.to_owned(),
            token: token.to_owned(),
            created_at,
            expires_at,
        };

        self.buckets.lock().await.register(username, record);
    }

    pub(crate) async fn list(&self, username: &str) -> Vec<TokenRecord> {
        self.buckets.lock().await.list(username, Utc::now())
    }

    /// Searches every user's live records. Does not sweep.
    pub(crate) async fn lookup_slot_by_fingerprint(&self, fingerprint: &str) -> Option<String> {
        self.buckets
            .lock()
            .await
            .slot_by_fingerprint(fingerprint, Utc::now())
    }

    pub(crate) async fn status(&self, record: &CredentialRecord) -> TokenStatus {
        let active_tokens = self.active_count(&record.username).await;

        let (token_limit, remaining) = match record.token_limit {
            0 => (TokenAllowance::Unlimited, TokenAllowance::Unlimited),
            limit => (
                TokenAllowance::Count(limit as usize),
                TokenAllowance::Count((limit as usize).saturating_sub(active_tokens)),
            ),
        };

        TokenStatus {
            username: record.username.clone(),
            active_tokens,
            token_limit,
            remaining,
        }
    }

    /// Atomically checks the limit, picks a slot, mints a token for it and
    /// registers the result. `mint` receives the assigned slot name and runs
    /// with the registry locked.
    pub(crate) async fn admit<F>(
        &self,
        username: &str,
        token_limit: u32,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        mint: F,
    ) -> Result<TokenRecord, Error>
    where
        F: FnOnce(&str) -> Result<String, Error>,
    {
        let mut buckets = self.buckets.lock().await;
        let now = Utc::now();

        if token_limit > 0 {
            let active = buckets.active_count(username, now);

            if active >= token_limit as usize {
                tracing::info!(username, active, token_limit, "Token limit reached");
                return Err(Error::RateLimited {
                    active,
                    limit: token_limit,
                });
            }
        }

        let api_name = buckets.next_available_slot(username, now);
        let token = mint(&api_name)?;

        let record = TokenRecord {
            fingerprint: fingerprint(&token),
            api_name,
            token,
            created_at,
            expires_at,
        };

        buckets.register(username, record.clone());

        Ok(record)
    }

    /// Drops every expired record and every emptied bucket.
    pub(crate) async fn sweep_all(&self) -> usize {
        self.buckets.lock().await.sweep_all(Utc::now())
    }
}
