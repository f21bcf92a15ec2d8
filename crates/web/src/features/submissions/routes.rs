use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers::{list_submissions, stream_submissions, submit_climb, submit_lane, submit_task};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_submissions))
        .route("/tasks", post(submit_task))
        .route("/climbs", post(submit_climb))
        .route("/lanes", put(submit_lane))
        .route("/events", get(stream_submissions))
}
