use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tally_storage::{
    dto::person::{AddPersonRequest, PersonDetailResponse, RosterUploadResponse},
    models::Person,
};
use validator::Validate;

use crate::{
    app::AppState,
    error::WebError,
};

use super::services;

#[utoipa::path(
    get,
    path = "/api/people",
    responses(
        (status = 200, description = "List everyone on the roster", body = Vec<Person>)
    ),
    tag = "people"
)]
pub async fn list_people(State(state): State<AppState>) -> Result<Response, WebError> {
    let people = services::list_people(&state.roster)?;

    Ok(Json(people).into_response())
}

#[utoipa::path(
    get,
    path = "/api/people/{id}",
    params(
        ("id" = String, Path, description = "Employee id or bib")
    ),
    responses(
        (status = 200, description = "Roster entry with per-task status; empty when the id is unknown", body = PersonDetailResponse)
    ),
    tag = "people"
)]
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let detail = services::get_person(&state.roster, &state.tracker, &id)?;

    Ok(Json(detail).into_response())
}

#[utoipa::path(
    post,
    path = "/api/people",
    request_body = AddPersonRequest,
    responses(
        (status = 201, description = "Person added", body = Person),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Id already on the roster")
    ),
    tag = "people"
)]
pub async fn add_person(
    State(state): State<AppState>,
    Json(req): Json<AddPersonRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let person = services::add_person(&state.roster, req.into())?;

    Ok((StatusCode::CREATED, Json(person)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/people/upload",
    request_body(content = String, content_type = "text/csv", description = "id,name,departments,tasks rows"),
    responses(
        (status = 200, description = "Roster merged", body = RosterUploadResponse),
        (status = 400, description = "Unreadable CSV")
    ),
    tag = "people"
)]
pub async fn upload_roster(State(state): State<AppState>, body: String) -> Result<Response, WebError> {
    if body.trim().is_empty() {
        return Err(WebError::BadRequest("CSV body is empty".to_string()));
    }

    let added = services::upload_roster(&state.roster, &body)?;

    Ok(Json(RosterUploadResponse {
        message: format!("Uploaded {} new people.", added),
        added,
    })
    .into_response())
}
