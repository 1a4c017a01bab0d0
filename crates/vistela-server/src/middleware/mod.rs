//! HTTP layers shared by every route: CORS and request tracing

use axum::http::{header, Method};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

use crate::config::CorsConfig;

/// Browsers may cache a preflight answer this long
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

/// CORS for the record API
///
/// An empty origin list or `*` admits any origin; credentials are then
/// never advertised since browsers reject that combination.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(PREFLIGHT_MAX_AGE);

    let wildcard = config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*");
    if wildcard {
        if config.allow_credentials {
            tracing::warn!("CORS_ALLOW_CREDENTIALS ignored for a wildcard origin");
        }
        return base.allow_origin(Any);
    }

    let mut origins = Vec::with_capacity(config.allowed_origins.len());
    for origin in &config.allowed_origins {
        match origin.parse() {
            Ok(value) => origins.push(value),
            Err(_) => tracing::warn!(origin = %origin, "Skipping unparseable CORS origin"),
        }
    }

    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(config.allow_credentials)
}

/// Request spans at INFO, with latency on every response and 5xx logged as failures
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO).latency_unit(LatencyUnit::Micros))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR).latency_unit(LatencyUnit::Micros))
}
