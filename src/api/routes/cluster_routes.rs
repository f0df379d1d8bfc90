use axum::{routing::get, Router};

use crate::api::controller::cluster::ClusterController;
use crate::app_state::AppState;

pub fn cluster_routes() -> Router<AppState> {
    Router::new()
        .route("/total_resources", get(ClusterController::total_resources))
        .route("/available_resources", get(ClusterController::available_resources))
        .route("/labels", get(ClusterController::labels))
}
