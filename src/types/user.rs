use serde::{Deserialize, Serialize};

pub(crate) type Username = String;

/// The caller behind a validated bearer token.
#[derive(Clone, Debug)]
pub(crate) struct AuthorizedUser {
    pub(crate) username: Username,
    pub(crate) token: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub(crate) struct Claims {
    pub(crate) sub: Username,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
    pub(crate) jti: String,
    /// Absent on tokens minted before slot names were embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) api_name: Option<String>,
}
