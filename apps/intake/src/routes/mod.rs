pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::intake::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Site forms
        .route("/api/v1/applications", post(handlers::handle_application))
        .route("/api/v1/vacancies", post(handlers::handle_vacancy))
        .route("/api/v1/enquiries", post(handlers::handle_enquiry))
        .route(
            "/api/v1/submissions/:id",
            get(handlers::handle_get_submission),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
