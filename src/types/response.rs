use serde::{Serialize, Serializer};

use crate::types::Username;

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: &'static str,
    pub(crate) expires_in: i64,
    pub(crate) api_name: String,
}

impl TokenResponse {
    pub(crate) fn bearer(access_token: String, expires_in: i64, api_name: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
            expires_in,
            api_name,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct TokenInfo {
    pub(crate) valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) username: Option<Username>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) api_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) issued_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_in_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_in_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl TokenInfo {
    pub(crate) fn invalid(error: String) -> Self {
        Self {
            valid: false,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// A token budget: either a number or the literal string "unlimited".
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum TokenAllowance {
    Unlimited,
    Count(usize),
}

impl Serialize for TokenAllowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TokenAllowance::Unlimited => serializer.serialize_str("unlimited"),
            TokenAllowance::Count(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenStatus {
    pub(crate) username: Username,
    pub(crate) active_tokens: usize,
    pub(crate) token_limit: TokenAllowance,
    pub(crate) remaining: TokenAllowance,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenEntry {
    pub(crate) api_name: String,
    pub(crate) token: String,
    pub(crate) created_at: String,
    pub(crate) expires_at: String,
    pub(crate) expires_in_seconds: i64,
    pub(crate) expires_in_human: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserTokens {
    pub(crate) username: Username,
    pub(crate) tokens: Vec<TokenEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allowance_serializes_as_number_or_unlimited() {
        let status = TokenStatus {
            username: "alice".into(),
            active_tokens: 1,
            token_limit: TokenAllowance::Count(3),
            remaining: TokenAllowance::Unlimited,
        };

        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({
                "username": "alice",
                "active_tokens": 1,
                "token_limit": 3,
                "remaining": "unlimited",
            })
        );
    }

    #[test]
    fn invalid_token_info_only_carries_error() {
        assert_eq!(
            serde_json::to_value(TokenInfo::invalid("ExpiredSignature".into())).unwrap(),
            json!({ "valid": false, "error": "ExpiredSignature" })
        );
    }
}
