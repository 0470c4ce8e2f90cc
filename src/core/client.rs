use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::core::error::{ConfigError, Error};
use crate::types::request::{
    AlarmsQuery, AlertsQuery, HistoricalQuery, LiveQuery, LocationsQuery, SummaryQuery,
};
use crate::utils::ratelimiter::Ratelimiter;

const UPSTREAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DEFAULT_LIVE_WINDOW_MINUTES: i64 = 15;
const MAX_LIVE_WINDOW_MINUTES: i64 = 1440;

/// Read-only client for the SmartCover API. Holds the upstream bearer
/// credential, which never leaves this type.
#[derive(Clone)]
pub(crate) struct Client {
    ratelimiter: Ratelimiter,
    client: reqwest::Client,
    url: String,
    credential: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("ratelimiter", &self.ratelimiter)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub(crate) fn new(
        url: &str,
        credential: String,
        timeout: std::time::Duration,
        ratelimiter: Ratelimiter,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(concat!("smartcover-proxy/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            ratelimiter,
            client,
            url: url.trim_end_matches('/').to_owned(),
            credential,
        })
    }

    async fn get<Q: Serialize + ?Sized>(&self, endpoint: &str, query: &Q) -> Result<Value, Error> {
        self.ratelimiter.acquire().await;

        tracing::debug!("Requesting {}", endpoint);
        let data = self
            .client
            .get(format!("{}/{}", self.url, endpoint))
            .bearer_auth(&self.credential)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        match data.get("response_code").and_then(Value::as_i64).unwrap_or(0) {
            0 => Ok(data),
            _ => Err(Error::Upstream(
                data.get("response_text")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown API error")
                    .to_owned(),
            )),
        }
    }

    #[instrument(skip_all)]
    pub(crate) async fn locations(&self, query: &LocationsQuery) -> Result<Value, Error> {
        self.get("locations/list.php", query).await
    }

    #[instrument(skip_all)]
    pub(crate) async fn location_summary(&self, query: &SummaryQuery) -> Result<Value, Error> {
        self.get("locations/summary.php", query).await
    }

    #[instrument(skip_all)]
    pub(crate) async fn historical_data(&self, query: &HistoricalQuery) -> Result<Value, Error> {
        self.get("locations/data.php", query).await
    }

    /// Historical data over the trailing `window_minutes` (default 15).
    #[instrument(skip_all)]
    pub(crate) async fn live_data(&self, query: LiveQuery) -> Result<Value, Error> {
        let window = query.window_minutes.unwrap_or(DEFAULT_LIVE_WINDOW_MINUTES);

        if !(1..=MAX_LIVE_WINDOW_MINUTES).contains(&window) {
            return Err(Error::InvalidWindow);
        }

        let end_time = Utc::now();
        let start_time = end_time - Duration::minutes(window);

        let historical = HistoricalQuery {
            location: query.location,
            data_type: query.data_type,
            start_time: start_time.format(UPSTREAM_TIME_FORMAT).to_string(),
            end_time: end_time.format(UPSTREAM_TIME_FORMAT).to_string(),
            distance_style: query.distance_style,
            timezone: query.timezone,
            date_format: query.date_format,
            epoch_time: query.epoch_time,
            long_filter: query.long_filter,
            resample_interval: None,
            resample_gaps: None,
        };

        self.historical_data(&historical).await
    }

    #[instrument(skip_all)]
    pub(crate) async fn alarms(&self, query: &AlarmsQuery) -> Result<Value, Error> {
        self.get("locations/alarms/list.php", query).await
    }

    #[instrument(skip_all)]
    pub(crate) async fn alerts(&self, query: &AlertsQuery) -> Result<Value, Error> {
        self.get("locations/alerts/list.php", query).await
    }
}
