//! HTTP routes
//!
//! - `single`: single-address form (`/`)
//! - `bulk`: spreadsheet upload and report download (`/bulk`)
//! - `health`: liveness check

pub mod bulk;
pub mod health;
pub mod single;

use crate::AppState;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

/// Build all routes and attach the shared application state
pub fn build_routes(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(single::index_page).post(single::check_email_handler))
        .route(
            "/bulk",
            get(bulk::bulk_page)
                .post(bulk::bulk_upload_handler)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/health", get(health::health_handler))
        .with_state(state)
}
