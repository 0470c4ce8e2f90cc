use axum::extract::{Extension, Json, State};
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request::LoginData;
use crate::types::response::{TokenInfo, TokenResponse, TokenStatus, UserTokens};
use crate::types::AuthorizedUser;

#[instrument(skip(state))]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(user_data): Json<LoginData>,
) -> Result<Json<TokenResponse>, Error> {
    let issued = state
        .token_controller
        .issue(&user_data.username, &user_data.password)
        .await?;

    Ok(Json(TokenResponse::bearer(
        issued.token,
        issued.expires_in,
        issued.api_name,
    )))
}

#[instrument(skip_all)]
pub(crate) async fn token_info(
    State(state): State<AppState>,
    Extension(user): Extension<AuthorizedUser>,
) -> Json<TokenInfo> {
    let info = state.token_controller.inspect(&user.token).await;

    Json(info.unwrap_or_else(|e| match e {
        // bare decoder message, without the "JWT error:" prefix
        Error::Jwt(e) => TokenInfo::invalid(e.to_string()),
        e => TokenInfo::invalid(e.to_string()),
    }))
}

#[instrument(skip_all)]
pub(crate) async fn token_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthorizedUser>,
) -> Result<Json<TokenStatus>, Error> {
    Ok(Json(state.token_controller.status(&user.username).await?))
}

#[instrument(skip_all)]
pub(crate) async fn my_tokens(
    State(state): State<AppState>,
    Extension(user): Extension<AuthorizedUser>,
) -> Result<Json<UserTokens>, Error> {
    Ok(Json(state.token_controller.tokens(&user.username).await?))
}
