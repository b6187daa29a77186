//! Serves the OpenAPI descriptor with a deployment-aware server URL.

use axum::http::header;
use axum::response::IntoResponse;

/// The descriptor shipped with the crate.
const DESCRIPTOR_YML: &str = include_str!("../../resources/basketapp.yml");

/// `GET /swagger/basketapp.yml`.
///
/// The advertised server URL points at the in-cluster service name so the
/// descriptor works from behind an ingress: `SERVICE_NAME` and
/// `SERVICE_PORT` override the defaults.
pub async fn descriptor() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/x-yaml")],
        render_descriptor(),
    )
}

fn render_descriptor() -> String {
    let service_name =
        std::env::var("SERVICE_NAME").unwrap_or_else(|_| "basketapp".to_string());
    let service_port = std::env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    format!(
        "{DESCRIPTOR_YML}servers:\n  - url: http://{service_name}:{service_port}/basketapp\n"
    )
}
