// HTTP routes

mod api;
mod error;
mod http;

pub use error::{ApiError, Envelope};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::history_repo::HistoryRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<HistoryRepo>,
    pub(crate) config: ServerConfig,
}

pub fn app(repo: Arc<HistoryRepo>, config: ServerConfig) -> Router {
    let gzip = config.server.gzip;
    let state = AppState { repo, config };

    let reports = Router::new()
        .route("/api/report_host", post(api::report_host)) // POST /api/report_host
        .route("/api/report_host_metric", post(api::report_host_metric)) // POST /api/report_host_metric
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_token,
        ));

    let router = Router::new()
        .route("/", get(http::banner_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/get_projects", get(api::get_projects)) // GET /api/get_projects
        .route("/api/get_hosts", get(api::get_hosts)) // GET /api/get_hosts?project=
        .route("/api/get_host", get(api::get_host)) // GET /api/get_host?id=
        .route("/api/get_host_metric", get(api::get_host_metric)) // GET /api/get_host_metric?id=&offset=&limit=
        .merge(reports)
        .layer(CorsLayer::new().allow_origin(Any));

    let router = if gzip {
        router.layer(CompressionLayer::new())
    } else {
        router
    };
    router.with_state(state)
}
