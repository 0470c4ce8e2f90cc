use axum::extract::{Json, Path, Query, State};
use serde_json::{json, Value};
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request::{HistoricalQuery, LiveQuery, LocationQuery, LocationsQuery, SummaryQuery};

#[instrument(skip(state))]
pub(crate) async fn list(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<Value>, Error> {
    Ok(Json(state.client.locations(&query).await?))
}

/// Filters the location list down to a single id.
#[instrument(skip(state))]
pub(crate) async fn get(
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Value>, Error> {
    let query = LocationsQuery {
        locations: Some(location_id.to_string()),
        timezone: query.timezone,
        date_format: query.date_format,
        ..Default::default()
    };

    let response = state.client.locations(&query).await?;

    let locations = match response.get("locations") {
        Some(Value::Array(locations)) if !locations.is_empty() => locations.clone(),
        _ => return Err(Error::LocationNotFound(location_id)),
    };

    Ok(Json(json!({
        "response_code": response.get("response_code").cloned().unwrap_or(json!(0)),
        "locations": locations,
    })))
}

#[instrument(skip(state))]
pub(crate) async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Value>, Error> {
    Ok(Json(state.client.location_summary(&query).await?))
}

#[instrument(skip(state))]
pub(crate) async fn historical(
    State(state): State<AppState>,
    Query(query): Query<HistoricalQuery>,
) -> Result<Json<Value>, Error> {
    Ok(Json(state.client.historical_data(&query).await?))
}

#[instrument(skip(state))]
pub(crate) async fn live(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
) -> Result<Json<Value>, Error> {
    Ok(Json(state.client.live_data(query).await?))
}
