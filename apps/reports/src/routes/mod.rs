pub mod health;
pub mod reports;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/reports/render", post(reports::handle_render))
        .route("/api/v1/reports/document", post(reports::handle_document))
        .route(
            "/api/v1/reports/pdf/*key",
            get(reports::handle_get_pdf).delete(reports::handle_delete_pdf),
        )
        .with_state(state)
}
