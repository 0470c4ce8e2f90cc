use axum::BoxError;
use axum::Json;
use axum::http::header::{self, ToStrError};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("Header decode error: {0}")]
    HeaderDecode(#[from] ToStrError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("No credentials provided")]
    NoCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("User account is disabled")]
    AccountDisabled,
    #[error("Invalid username or password")]
    Unauthorized,
    #[error("Token limit reached ({active}/{limit})")]
    RateLimited { active: usize, limit: u32 },
    #[error("SmartCover API error: {0}")]
    Upstream(String),
    #[error("Location {0} not found")]
    LocationNotFound(i64),
    #[error("window_minutes must be between 1 and 1440")]
    InvalidWindow,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Unauthorized
            | Error::RateLimited { .. }
            | Error::InvalidToken
            | Error::NoCredentials
            | Error::AccountDisabled
            | Error::LocationNotFound(_)
            | Error::InvalidWindow => tracing::debug!("{:?}", self),
            _ => tracing::error!("{:?}", self),
        }

        let (status, message) = match self {
            Error::HTTPClient(e) => (
                StatusCode::BAD_GATEWAY,
                format!("SmartCover API error: {}", e),
            ),
            Error::Upstream(e) => (
                StatusCode::BAD_GATEWAY,
                format!("SmartCover API error: {}", e),
            ),
            Error::HeaderDecode(_) => (StatusCode::BAD_REQUEST, "Header decode error".into()),
            Error::Jwt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "JWT error".into()),
            Error::NoCredentials => (StatusCode::FORBIDDEN, "Not authenticated".into()),
            Error::InvalidToken => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "detail": "Invalid or expired token" })),
                )
                    .into_response();

                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));

                return response;
            }
            Error::AccountDisabled => (StatusCode::UNAUTHORIZED, "User account is disabled".into()),
            Error::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".into(),
            ),
            Error::RateLimited { active, limit } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "Token limit reached. You have {} active token(s). Maximum allowed: {}. \
                     Wait for existing tokens to expire.",
                    active, limit
                ),
            ),
            Error::LocationNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Location {} not found", id))
            }
            Error::InvalidWindow => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "window_minutes must be between 1 and 1440".into(),
            ),
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

pub(crate) async fn handle_middleware_errors(err: BoxError) -> (StatusCode, &'static str) {
    tracing::error!("Unhandled error: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
