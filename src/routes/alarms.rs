use axum::extract::{Json, Query, State};
use serde_json::Value;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request::AlarmsQuery;

/// Alarm events, filtered by organization, location, or alarm id range.
/// Acknowledgement is not exposed.
#[instrument(skip(state))]
pub(crate) async fn list(
    State(state): State<AppState>,
    Query(query): Query<AlarmsQuery>,
) -> Result<Json<Value>, Error> {
    Ok(Json(state.client.alarms(&query).await?))
}
