use std::sync::Arc;

use tally_storage::{
    Tracker,
    models::Submission,
    services::{Effect, SubmissionRequest},
};

use crate::error::{WebError, WebResult};

/// Run a submission through the tracker. Validation and the write are blocking, so they
/// run off the async workers.
pub async fn submit(tracker: Arc<Tracker>, request: SubmissionRequest) -> WebResult<Effect> {
    let effect = tokio::task::spawn_blocking(move || tracker.submit(request))
        .await
        .map_err(|e| WebError::InternalServerError(format!("Submission task failed: {}", e)))??;

    Ok(effect)
}

/// List every stored submission in arrival order
pub fn list_submissions(tracker: &Tracker) -> WebResult<Vec<Submission>> {
    Ok(tracker.history()?)
}
