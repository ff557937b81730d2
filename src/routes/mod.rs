//! Route modules for Markcheck Server

pub mod check;
pub mod download;
pub mod home;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health_check))
        .route("/check-pdf", post(check::check_pdf))
        .route("/download/:filename", get(download::download_result))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
