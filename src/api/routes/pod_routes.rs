use axum::{
    routing::{get, post},
    Router,
};

use crate::api::controller::pod::PodController;
use crate::app_state::AppState;

pub fn pod_routes() -> Router<AppState> {
    Router::new()
        .route("/with_status", post(PodController::with_status))
        .route("/unschedulable", get(PodController::unschedulable))
}
