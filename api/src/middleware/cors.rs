use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// Browser-based MCP connectors that are always allowed.
const CONNECTOR_ORIGINS: &[&str] = &[
    "https://chatgpt.com",
    "https://chat.openai.com",
    "https://claude.ai",
];

/// Build a CORS layer from the `PIXELA_CORS_ORIGINS` env var.
///
/// - Origins: comma-separated list (default: `http://localhost:3000`) plus the connector origins
/// - Methods: GET, POST, OPTIONS
/// - Headers: Content-Type, Mcp-Session-Id
/// - Max age: 3600s
pub fn build_cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins(std::env::var("PIXELA_CORS_ORIGINS").ok())
        .into_iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("mcp-session-id"),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

fn allowed_origins(raw: Option<String>) -> Vec<String> {
    let raw = raw.unwrap_or_else(|| "http://localhost:3000".to_string());
    let mut origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    for connector_origin in CONNECTOR_ORIGINS {
        if !origins
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(connector_origin))
        {
            origins.push((*connector_origin).to_string());
        }
    }
    origins
}
