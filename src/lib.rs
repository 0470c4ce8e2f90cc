pub(crate) mod controllers;
pub(crate) mod core;
pub(crate) mod routes;
pub(crate) mod token;
pub(crate) mod types;
pub(crate) mod utils;
pub(crate) mod workers;

use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use crate::core::error::ConfigError as Error;
use crate::core::{config::Args, state::AppState};
use crate::workers::sweeper::sweep_loop;

pub async fn run() -> Result<(), Error> {
    let config = Args::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_default())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::from_args(&config)?;

    if config.sweep_interval_secs > 0 {
        let registry = state.token_controller.registry().clone();
        let period = Duration::from_secs(config.sweep_interval_secs);

        tokio::spawn(async move {
            sweep_loop(registry, period).await;
        });
    }

    let app = routes::router::routes(state, config.requests_per_second);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .map_err(Error::IO)?;

    tracing::info!("listening on port {}", config.port);

    axum::serve(listener, app).await.map_err(Error::IO)?;

    Ok(())
}
