use axum::{Router, routing::get};

use super::handlers::{get_leaderboard, get_speed_leaderboard, get_summary};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/leaderboard", get(get_leaderboard))
        .route("/speed", get(get_speed_leaderboard))
}
