use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{add_person, get_person, list_people, upload_roster};
use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_people).post(add_person))
        .route("/upload", post(upload_roster))
        .route("/:id", get(get_person))
}
