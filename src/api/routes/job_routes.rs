use axum::{
    routing::{get, post},
    Router,
};

use crate::api::controller::job::JobController;
use crate::app_state::AppState;

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(JobController::list_templates))
        .route("/templates/{name}/defaults", get(JobController::template_defaults))
        .route("/render", post(JobController::render))
        .route("/render_custom", post(JobController::render_custom))
}
