use tally_storage::{
    models::{Submission, SubmissionPayload},
    repository::{CatalogProvider, IdentityResolver},
    services::{
        Effect, SubmissionRequest, SubmissionValidator,
        validation::{ClimbSubmission, LaneSubmission, TaskSubmission},
    },
};
use tracing::{debug, warn};

use crate::{ImporterError, Result};

/// Re-runs a stored history through the validator from an empty start.
///
/// Every record must be accepted against the records before it. A record that would be
/// rejected today points at a hand-edited file, a changed roster or catalog, or a write
/// that bypassed the tracker.
pub struct HistoryReplayer<'a> {
    validator: &'a SubmissionValidator,
    catalog: &'a dyn CatalogProvider,
    identities: &'a dyn IdentityResolver,
}

impl<'a> HistoryReplayer<'a> {
    pub fn new(
        validator: &'a SubmissionValidator,
        catalog: &'a dyn CatalogProvider,
        identities: &'a dyn IdentityResolver,
    ) -> Self {
        Self {
            validator,
            catalog,
            identities,
        }
    }

    pub fn replay(&self, history: &[Submission]) -> Result<ReplayReport> {
        let mut report = ReplayReport::default();
        let mut replayed: Vec<Submission> = Vec::with_capacity(history.len());

        for (idx, record) in history.iter().enumerate() {
            let label = format!(
                "Record {} ({} / {})",
                idx + 1,
                record.person_id,
                record.item_id
            );

            if record.recorded_at < record.created_at {
                report
                    .warnings
                    .push(format!("{}: recorded before it was created", label));
            }

            let Some(request) = to_request(record) else {
                report
                    .warnings
                    .push(format!("{}: lane time is unreadable and was skipped", label));
                continue;
            };

            if let Some(person) = self.identities.resolve(&record.person_id)
                && person.name != record.person_name
            {
                report.warnings.push(format!(
                    "{}: stored name '{}' differs from roster name '{}'",
                    label, record.person_name, person.name
                ));
            }

            let verdict = self.validator.validate(
                &replayed,
                self.catalog,
                self.identities,
                &request,
                record.recorded_at,
            );

            match verdict {
                Ok(Effect::Append(_)) => {
                    debug!("{}: accepted", label);
                    replayed.push(record.clone());
                    report.accepted += 1;
                }
                Ok(Effect::UpdateInPlace(_)) => {
                    // Updates happen in place, so a stored history never holds the same key twice.
                    report.errors.push(format!(
                        "{}: duplicates an earlier record for the same item",
                        label
                    ));
                }
                Err(rejection) => {
                    report
                        .errors
                        .push(format!("{}: would be rejected: {}", label, rejection));
                }
            }
        }

        if !report.errors.is_empty() {
            Err(ImporterError::ValidationError(format!(
                "Replay failed with {} error(s): {}",
                report.errors.len(),
                report.errors.join("; ")
            )))
        } else {
            Ok(report)
        }
    }
}

fn to_request(record: &Submission) -> Option<SubmissionRequest> {
    let request = match &record.payload {
        SubmissionPayload::Task { status } => SubmissionRequest::Task(TaskSubmission {
            person_id: record.person_id.clone(),
            category_id: record.category_id.clone(),
            item_id: record.item_id.clone(),
            status: *status,
        }),
        SubmissionPayload::Climb(result) => SubmissionRequest::Climb(ClimbSubmission {
            person_id: record.person_id.clone(),
            route_id: record.item_id.clone(),
            attempts: result.attempts.clone(),
        }),
        SubmissionPayload::Lane { time } => SubmissionRequest::Lane(LaneSubmission {
            person_id: record.person_id.clone(),
            category_id: record.category_id.clone(),
            lane_id: record.item_id.clone(),
            time: (*time)?,
        }),
    };

    Some(request)
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub accepted: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ReplayReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}
