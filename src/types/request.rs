use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub(crate) struct LoginData {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl std::fmt::Debug for LoginData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginData")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

// Query parameters below are forwarded to the upstream API as-is; `None`
// fields are left out of the query string.

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct LocationsQuery {
    pub(crate) organization: Option<i64>,
    pub(crate) archived: Option<i32>,
    pub(crate) stock: Option<i32>,
    pub(crate) geojson: Option<i32>,
    pub(crate) flat: Option<i32>,
    pub(crate) timezone: Option<String>,
    pub(crate) date_format: Option<i32>,
    pub(crate) locations: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationQuery {
    pub(crate) timezone: Option<String>,
    pub(crate) date_format: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct SummaryQuery {
    pub(crate) organization: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct HistoricalQuery {
    pub(crate) location: i64,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) data_type: i32,
    pub(crate) distance_style: Option<i32>,
    pub(crate) timezone: Option<String>,
    pub(crate) date_format: Option<i32>,
    pub(crate) epoch_time: Option<i32>,
    pub(crate) long_filter: Option<i32>,
    pub(crate) resample_interval: Option<i32>,
    pub(crate) resample_gaps: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LiveQuery {
    pub(crate) location: i64,
    pub(crate) data_type: i32,
    pub(crate) window_minutes: Option<i64>,
    pub(crate) distance_style: Option<i32>,
    pub(crate) timezone: Option<String>,
    pub(crate) date_format: Option<i32>,
    pub(crate) epoch_time: Option<i32>,
    pub(crate) long_filter: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct AlarmsQuery {
    pub(crate) active: Option<i32>,
    pub(crate) timezone: Option<String>,
    pub(crate) date_format: Option<i32>,
    pub(crate) length: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) organization: Option<i64>,
    pub(crate) location_id: Option<i64>,
    pub(crate) start_id: Option<i64>,
    pub(crate) end_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct AlertsQuery {
    pub(crate) organization: Option<i64>,
    pub(crate) active: Option<i32>,
    pub(crate) timezone: Option<String>,
    pub(crate) date_format: Option<i32>,
    pub(crate) length: Option<i64>,
    pub(crate) offset: Option<i64>,
}
