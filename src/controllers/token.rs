use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use tracing::instrument;
use uuid::Uuid;

use crate::controllers::credentials::{CredentialRecord, CredentialStore};
use crate::core::error::Error;
use crate::token::store::{fingerprint, TokenRegistry};
use crate::types::response::{TokenEntry, TokenInfo, TokenStatus, UserTokens};
use crate::types::user::Claims;
use crate::utils::format::format_duration;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// A freshly minted token.
#[derive(Debug)]
pub(crate) struct IssuedToken {
    pub(crate) token: String,
    pub(crate) expires_in: i64,
    pub(crate) api_name: String,
}

/// Issues, validates and describes bearer tokens for this proxy.
#[derive(Clone)]
pub(crate) struct TokenController {
    credentials: CredentialStore,
    registry: TokenRegistry,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenController")
            .field("credentials", &self.credentials)
            .field("registry", &self.registry)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenController {
    pub(crate) fn new(
        credentials: CredentialStore,
        registry: TokenRegistry,
        jwt_secret: &str,
        lifetime: Duration,
    ) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            credentials,
            registry,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub(crate) fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    #[instrument(skip(self, password))]
    pub(crate) async fn issue(&self, username: &str, password: &str) -> Result<IssuedToken, Error> {
        let record = self
            .credentials
            .lookup(username)
            .await
            .ok_or(Error::Unauthorized)?;

        if !record.enabled || !record.secret.verify(password) {
            return Err(Error::Unauthorized);
        }

        let issued_at = Utc::now();
        let expires_at = issued_at + self.lifetime;

        let issued = self
            .registry
            .admit(
                username,
                record.token_limit,
                issued_at,
                expires_at,
                |api_name| self.encode_jwt(username, api_name, issued_at, expires_at),
            )
            .await?;

        tracing::info!(
            username,
            api_name = %issued.api_name,
            fingerprint = %issued.fingerprint,
            "Issued token"
        );

        Ok(IssuedToken {
            token: issued.token,
            expires_in: self.lifetime.num_seconds(),
            api_name: issued.api_name,
        })
    }

    fn encode_jwt(
        &self,
        username: &str,
        api_name: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, Error> {
        let claims = Claims {
            sub: username.to_owned(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            api_name: Some(api_name.to_owned()),
        };

        Ok(jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Decodes and verifies a token. A token is dead from its `exp` second
    /// onwards, matching the registry's notion of a live record.
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, Error> {
        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        if token_data.claims.exp <= Utc::now().timestamp() {
            return Err(Error::Jwt(ErrorKind::ExpiredSignature.into()));
        }

        Ok(token_data)
    }

    /// Resolves a bearer token to its username. Every decode failure collapses
    /// into `InvalidToken`; the account's `enabled` flag is read fresh.
    pub(crate) async fn validate(&self, token: &str) -> Result<String, Error> {
        let token_data = self.decode_jwt(token).map_err(|_| Error::InvalidToken)?;

        let record = self
            .credentials
            .lookup(&token_data.claims.sub)
            .await
            .ok_or(Error::InvalidToken)?;

        if !record.enabled {
            return Err(Error::AccountDisabled);
        }

        Ok(record.username)
    }

    /// Describes a token. Decode failures surface as `Error::Jwt` so the
    /// caller can show the underlying reason.
    pub(crate) async fn inspect(&self, token: &str) -> Result<TokenInfo, Error> {
        let claims = self.decode_jwt(token)?.claims;
        let now = Utc::now();

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(Error::InvalidToken)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0);
        let expires_in_seconds = (expires_at - now).num_seconds().max(0);

        let api_name = match claims.api_name {
            Some(api_name) => Some(api_name),
            None => {
                self.registry
                    .lookup_slot_by_fingerprint(&fingerprint(token))
                    .await
            }
        };

        Ok(TokenInfo {
            valid: true,
            username: Some(claims.sub),
            api_name,
            issued_at: issued_at.map(|at| at.to_rfc3339()),
            expires_at: Some(expires_at.to_rfc3339()),
            expires_in_seconds: Some(expires_in_seconds),
            expires_in_human: Some(format_duration(expires_in_seconds)),
            error: None,
        })
    }

    async fn record(&self, username: &str) -> Result<CredentialRecord, Error> {
        self.credentials
            .lookup(username)
            .await
            .ok_or(Error::InvalidToken)
    }

    pub(crate) async fn status(&self, username: &str) -> Result<TokenStatus, Error> {
        let record = self.record(username).await?;

        Ok(self.registry.status(&record).await)
    }

    pub(crate) async fn tokens(&self, username: &str) -> Result<UserTokens, Error> {
        let record = self.record(username).await?;
        let now = Utc::now();

        let tokens = self
            .registry
            .list(&record.username)
            .await
            .into_iter()
            .map(|token| {
                let expires_in_seconds = (token.expires_at - now).num_seconds().max(0);

                TokenEntry {
                    api_name: token.api_name,
                    token: token.token,
                    created_at: token.created_at.to_rfc3339(),
                    expires_at: token.expires_at.to_rfc3339(),
                    expires_in_seconds,
                    expires_in_human: format_duration(expires_in_seconds),
                }
            })
            .collect();

        Ok(UserTokens {
            username: record.username,
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::credentials::{CredentialEntry, FullEntry};
    use crate::types::response::TokenAllowance;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret";

    fn entry(password: &str, token_limit: u32) -> CredentialEntry {
        CredentialEntry::Full(FullEntry {
            password: Some(password.into()),
            password_hash: None,
            token_limit,
            enabled: true,
        })
    }

    fn controller() -> TokenController {
        let credentials = CredentialStore::new(HashMap::from([
            ("limited".to_owned(), entry("pw", 2)),
            ("unlimited".to_owned(), entry("pw", 0)),
            ("legacy".to_owned(), CredentialEntry::Legacy("old".into())),
            (
                "hashed".to_owned(),
                CredentialEntry::Full(FullEntry {
                    password: None,
                    password_hash: Some("not-a-bcrypt-hash".into()),
                    token_limit: 0,
                    enabled: true,
                }),
            ),
        ]));

        TokenController::new(
            credentials,
            TokenRegistry::new(),
            SECRET,
            Duration::minutes(60),
        )
    }

    fn mint(claims: &Claims, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str, exp_offset: Duration, api_name: Option<&str>) -> Claims {
        let now = Utc::now();
        Claims {
            sub: sub.into(),
            iat: now.timestamp(),
            exp: (now + exp_offset).timestamp(),
            jti: Uuid::new_v4().to_string(),
            api_name: api_name.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn issue_then_validate_and_inspect() {
        let controller = controller();

        let issued = controller.issue("limited", "pw").await.unwrap();
        assert_eq!(issued.api_name, "API_1");
        assert_eq!(issued.expires_in, 3600);

        assert_eq!(controller.validate(&issued.token).await.unwrap(), "limited");

        let info = controller.inspect(&issued.token).await.unwrap();
        assert!(info.valid);
        assert_eq!(info.username.as_deref(), Some("limited"));
        assert_eq!(info.api_name.as_deref(), Some("API_1"));
        assert!(info.expires_in_seconds.unwrap() > 3500);
        assert!(matches!(
            info.expires_in_human.as_deref(),
            Some("59m") | Some("1h")
        ));
    }

    #[tokio::test]
    async fn limit_is_enforced() {
        let controller = controller();

        controller.issue("limited", "pw").await.unwrap();
        controller.issue("limited", "pw").await.unwrap();

        let result = controller.issue("limited", "pw").await;
        assert!(matches!(
            result,
            Err(Error::RateLimited {
                active: 2,
                limit: 2
            })
        ));
    }

    #[tokio::test]
    async fn expired_token_frees_capacity() {
        let controller = controller();
        let now = Utc::now();

        controller.issue("limited", "pw").await.unwrap();
        controller
            .registry()
            .register(
                "limited",
                "stale-token",
                now - Duration::minutes(61),
                now - Duration::minutes(1),
                "API_2",
            )
            .await;

        let issued = controller.issue("limited", "pw").await.unwrap();
        assert_eq!(issued.api_name, "API_2");
        assert_eq!(controller.registry().active_count("limited").await, 2);
    }

    #[tokio::test]
    async fn unlimited_user_has_no_cap() {
        let controller = controller();

        for _ in 0..10 {
            controller.issue("unlimited", "pw").await.unwrap();
        }

        let status = controller.status("unlimited").await.unwrap();
        assert_eq!(status.active_tokens, 10);
        assert_eq!(status.token_limit, TokenAllowance::Unlimited);
        assert_eq!(status.remaining, TokenAllowance::Unlimited);
    }

    #[tokio::test]
    async fn unauthorized_is_indistinguishable() {
        let controller = controller();

        let unknown = controller.issue("nobody", "pw").await.unwrap_err();
        let wrong = controller.issue("limited", "nope").await.unwrap_err();

        assert!(matches!(unknown, Error::Unauthorized));
        assert!(matches!(wrong, Error::Unauthorized));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn malformed_hash_is_rejected_like_unknown_user() {
        let controller = controller();

        let unknown = controller.issue("nobody", "x").await.unwrap_err();
        let hashed = controller.issue("hashed", "x").await.unwrap_err();

        assert!(matches!(unknown, Error::Unauthorized));
        assert!(matches!(hashed, Error::Unauthorized));
        assert_eq!(controller.registry().active_count("hashed").await, 0);
    }

    #[tokio::test]
    async fn disabled_user_cannot_log_in() {
        let controller = controller();
        controller.credentials.set_enabled("limited", false).await;

        assert!(matches!(
            controller.issue("limited", "pw").await,
            Err(Error::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn disabling_user_rejects_live_token() {
        let controller = controller();
        let issued = controller.issue("legacy", "old").await.unwrap();

        assert!(controller.validate(&issued.token).await.is_ok());

        controller.credentials.set_enabled("legacy", false).await;

        assert!(matches!(
            controller.validate(&issued.token).await,
            Err(Error::AccountDisabled)
        ));
    }

    #[tokio::test]
    async fn tampered_and_expired_tokens_are_invalid() {
        let controller = controller();

        let forged = mint(&claims("limited", Duration::minutes(5), None), "other-secret");
        let expired = mint(&claims("limited", Duration::minutes(-5), None), SECRET);
        let ghost = mint(&claims("ghost", Duration::minutes(5), None), SECRET);

        for token in [forged.as_str(), expired.as_str(), ghost.as_str(), "garbage"] {
            assert!(matches!(
                controller.validate(token).await,
                Err(Error::InvalidToken)
            ));
        }

        assert!(matches!(
            controller.inspect(&expired).await,
            Err(Error::Jwt(_))
        ));
    }

    #[tokio::test]
    async fn token_is_dead_at_its_exp_second() {
        let controller = controller();
        let token = mint(&claims("limited", Duration::zero(), None), SECRET);

        assert!(matches!(
            controller.validate(&token).await,
            Err(Error::InvalidToken)
        ));
        assert!(matches!(
            controller.inspect(&token).await,
            Err(Error::Jwt(_))
        ));
    }

    #[tokio::test]
    async fn inspect_falls_back_to_registry_slot() {
        let controller = controller();
        let token = mint(&claims("limited", Duration::minutes(30), None), SECRET);
        let now = Utc::now();

        controller
            .registry()
            .register("limited", &token, now, now + Duration::minutes(30), "API_4")
            .await;

        let info = controller.inspect(&token).await.unwrap();
        assert_eq!(info.api_name.as_deref(), Some("API_4"));
    }

    #[tokio::test]
    async fn tokens_lists_live_entries() {
        let controller = controller();

        let first = controller.issue("limited", "pw").await.unwrap();
        let second = controller.issue("limited", "pw").await.unwrap();

        let listing = controller.tokens("limited").await.unwrap();
        assert_eq!(listing.username, "limited");
        assert_eq!(listing.tokens.len(), 2);
        assert_eq!(listing.tokens[0].api_name, "API_1");
        assert_eq!(listing.tokens[0].token, first.token);
        assert_eq!(listing.tokens[1].token, second.token);
        assert_ne!(first.token, second.token);
    }
}
