use axum::Json;
use serde_json::{json, Value};

const SERVICE: &str = "smartcover-proxy";

pub(crate) async fn root() -> Json<Value> {
    Json(json!({
        "service": "SmartCover Proxy API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/v1/health",
    }))
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE }))
}
