use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tally_storage::dto::{
    ranking::{LeaderboardEntry, LeaderboardFilter, SpeedLeaderboardEntry},
    summary::PersonSummary,
};

use crate::{app::AppState, error::WebError};

use super::services;

#[utoipa::path(
    get,
    path = "/api/rankings/summary",
    responses(
        (status = 200, description = "Completed and attempted counts per employee", body = Vec<PersonSummary>),
        (status = 503, description = "Submission history unavailable")
    ),
    tag = "rankings"
)]
pub async fn get_summary(State(state): State<AppState>) -> Result<Response, WebError> {
    let summary = services::get_summary(&state.tracker)?;

    Ok(Json(summary).into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/leaderboard",
    params(LeaderboardFilter),
    responses(
        (status = 200, description = "Climbers ranked by total score", body = Vec<LeaderboardEntry>),
        (status = 400, description = "Invalid query parameters"),
        (status = 503, description = "Submission history unavailable")
    ),
    tag = "rankings"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(filter): Query<LeaderboardFilter>,
) -> Result<Response, WebError> {
    let entries = services::get_leaderboard(&state.tracker, &filter)?;

    Ok(Json(entries).into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/speed",
    responses(
        (status = 200, description = "Speed climbers ranked by best lane time", body = Vec<SpeedLeaderboardEntry>),
        (status = 503, description = "Submission history unavailable")
    ),
    tag = "rankings"
)]
pub async fn get_speed_leaderboard(State(state): State<AppState>) -> Result<Response, WebError> {
    let entries = services::get_speed_leaderboard(&state.tracker)?;

    Ok(Json(entries).into_response())
}
