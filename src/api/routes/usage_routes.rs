use axum::{routing::post, Router};

use crate::api::controller::usage::UsageController;
use crate::app_state::AppState;

pub fn usage_routes() -> Router<AppState> {
    Router::new()
        .route("/compute_hours", post(UsageController::compute_hours))
        .route("/node_uptime", post(UsageController::node_uptime))
}
