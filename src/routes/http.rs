// GET handlers: banner, version

use axum::response::IntoResponse;

use crate::version::{NAME, VERSION};

/// GET / - plain-text service banner.
pub(super) async fn banner_handler() -> impl IntoResponse {
    format!("{} {} - host monitor", NAME, VERSION)
}

/// GET /version - service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
