use axum::{
    routing::{get, post},
    Router,
};

use crate::api::controller::node::NodeController;
use crate::app_state::AppState;

pub fn node_routes() -> Router<AppState> {
    Router::new()
        .route("/labels", post(NodeController::labels))
        .route("/with_labels", post(NodeController::with_labels))
        .route("/gpus", post(NodeController::gpus))
        .route("/resources", post(NodeController::resources))
        .route("/conditions", get(NodeController::conditions))
        .route("/pressure", get(NodeController::pressure))
}
