use axum::extract::{Json, Query, State};
use serde_json::Value;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request::AlertsQuery;

#[instrument(skip(state))]
pub(crate) async fn list(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Value>, Error> {
    Ok(Json(state.client.alerts(&query).await?))
}
