use crate::core::error;
use crate::core::state::AppState;
use crate::routes::{alarms, alerts, auth, health, locations};
use crate::utils;
use axum::error_handling::HandleErrorLayer;
use axum::{
    extract::{MatchedPath, Request},
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use tracing::info_span;

pub(crate) fn routes(state: AppState, requests_per_second: u64) -> Router {
    // /api/v1/auth/...
    let auth_router = Router::new()
        .route("/token-info", get(auth::token_info))
        .route("/token-status", get(auth::token_status))
        .route("/my-tokens", get(auth::my_tokens))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            utils::auth::authorize,
        ))
        .route("/token", post(auth::login));

    // /api/v1/locations/...
    let location_router = Router::new()
        .route("/list", get(locations::list))
        .route("/summary", get(locations::summary))
        .route("/data", get(locations::historical))
        .route("/live", get(locations::live))
        .route("/{location_id}", get(locations::get))
        .route("/alarms/list", get(alarms::list))
        .route("/alerts/list", get(alerts::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            utils::auth::authorize,
        ));

    let api_router = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_router)
        .nest("/locations", location_router);

    Router::new()
        .route("/", get(health::root))
        .nest("/api/v1", api_router)
        .with_state(state)
        .route_layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let matched_path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str);

                        info_span!(
                            "request",
                            method = ?request.method(),
                            matched_path,
                        )
                    }),
                )
                .layer(HandleErrorLayer::new(error::handle_middleware_errors))
                .buffer(128)
                .rate_limit(requests_per_second, Duration::from_secs(1))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers(cors::Any)
                        .allow_origin(cors::Any),
                ),
        )
}
