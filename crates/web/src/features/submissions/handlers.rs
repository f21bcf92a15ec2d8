use std::convert::Infallible;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::{self, Stream};
use tally_storage::{
    dto::submission::{
        RejectionResponse, SubmissionResponse, SubmitClimbRequest, SubmitLaneTimeRequest,
        SubmitTaskRequest,
    },
    models::Submission,
    services::{Effect, SubmissionRequest},
};
use tokio::sync::broadcast::error::RecvError;
use validator::Validate;

use crate::{app::AppState, error::WebError};

use super::services;

const RECORDED: &str = "Submission recorded successfully.";

async fn record(state: &AppState, request: SubmissionRequest) -> Result<Response, WebError> {
    let effect = services::submit(state.tracker.clone(), request).await?;

    let status = match effect {
        Effect::Append(_) => StatusCode::CREATED,
        Effect::UpdateInPlace(_) => StatusCode::OK,
    };
    let response = SubmissionResponse {
        message: RECORDED.to_string(),
        submission: effect.into_record(),
    };

    Ok((status, Json(response)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/submissions/tasks",
    request_body = SubmitTaskRequest,
    responses(
        (status = 201, description = "New task record created", body = SubmissionResponse),
        (status = 200, description = "Attempted task advanced to Completed", body = SubmissionResponse),
        (status = 400, description = "Invalid payload, item outside the department or status regression", body = RejectionResponse),
        (status = 404, description = "Employee not on the roster", body = RejectionResponse),
        (status = 409, description = "Task already completed", body = RejectionResponse),
        (status = 503, description = "Submission history unavailable")
    ),
    tag = "submissions"
)]
pub async fn submit_task(
    State(state): State<AppState>,
    payload: Result<Json<SubmitTaskRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(req) = payload?;
    req.validate()?;

    record(&state, req.into()).await
}

#[utoipa::path(
    post,
    path = "/api/submissions/climbs",
    request_body = SubmitClimbRequest,
    responses(
        (status = 201, description = "Climb recorded", body = SubmissionResponse),
        (status = 400, description = "Invalid payload, unknown route or top before zone", body = RejectionResponse),
        (status = 409, description = "Route already submitted for this climber", body = RejectionResponse),
        (status = 503, description = "Submission history unavailable")
    ),
    tag = "submissions"
)]
pub async fn submit_climb(
    State(state): State<AppState>,
    payload: Result<Json<SubmitClimbRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(req) = payload?;
    req.validate()?;

    record(&state, req.into()).await
}

#[utoipa::path(
    put,
    path = "/api/submissions/lanes",
    request_body = SubmitLaneTimeRequest,
    responses(
        (status = 201, description = "Lane time recorded", body = SubmissionResponse),
        (status = 400, description = "Invalid payload or lane outside the category", body = RejectionResponse),
        (status = 404, description = "Bib not on the roster", body = RejectionResponse),
        (status = 409, description = "Lane already timed for this bib", body = RejectionResponse),
        (status = 503, description = "Submission history unavailable")
    ),
    tag = "submissions"
)]
pub async fn submit_lane(
    State(state): State<AppState>,
    payload: Result<Json<SubmitLaneTimeRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(req) = payload?;
    req.validate()?;

    record(&state, req.into()).await
}

#[utoipa::path(
    get,
    path = "/api/submissions",
    responses(
        (status = 200, description = "Full submission history", body = Vec<Submission>),
        (status = 503, description = "Submission history unavailable")
    ),
    tag = "submissions"
)]
pub async fn list_submissions(State(state): State<AppState>) -> Result<Response, WebError> {
    let history = services::list_submissions(&state.tracker)?;

    Ok(Json(history).into_response())
}

#[utoipa::path(
    get,
    path = "/api/submissions/events",
    responses(
        (status = 200, description = "text/event-stream of accepted submissions")
    ),
    tag = "submissions"
)]
pub async fn stream_submissions(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.tracker.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(submission) => {
                    let event = match Event::default().event("submission").json_data(&submission) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::error!("Failed to encode submission event: {}", e);
                            continue;
                        }
                    };
                    return Some((Ok(event), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Submission stream lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
