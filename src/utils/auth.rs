use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::{body::Body, extract::Request, http::Response, middleware::Next};

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::AuthorizedUser;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(Error::NoCredentials)?;

    let mut parts = auth_header.to_str()?.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(Error::NoCredentials),
    }
}

pub(crate) async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let token = bearer_token(request.headers())?.to_owned();

    let username = state.token_controller.validate(&token).await?;

    request
        .extensions_mut()
        .insert(AuthorizedUser { username, token });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_or_foreign_schemes() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(Error::NoCredentials)
        ));
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(Error::NoCredentials)
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer")),
            Err(Error::NoCredentials)
        ));
    }
}
