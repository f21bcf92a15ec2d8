use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{
    Attempt, ClimbResult, Person, Submission, SubmissionMode, SubmissionPayload, TaskStatus,
};
use crate::repository::{CatalogProvider, IdentityResolver};

/// Catalog category that climbing routes are listed under unless configured otherwise.
pub const DEFAULT_ROUTE_CATEGORY: &str = "routes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSubmission {
    pub person_id: String,
    pub category_id: String,
    pub item_id: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClimbSubmission {
    pub person_id: String,
    pub route_id: String,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneSubmission {
    pub person_id: String,
    pub category_id: String,
    pub lane_id: String,
    pub time: Decimal,
}

/// A request to record progress, already unmarshalled from whatever transport carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionRequest {
    Task(TaskSubmission),
    Climb(ClimbSubmission),
    Lane(LaneSubmission),
}

impl SubmissionRequest {
    pub fn mode(&self) -> SubmissionMode {
        match self {
            Self::Task(_) => SubmissionMode::Task,
            Self::Climb(_) => SubmissionMode::Climb,
            Self::Lane(_) => SubmissionMode::Lane,
        }
    }

    pub fn person_id(&self) -> &str {
        match self {
            Self::Task(t) => &t.person_id,
            Self::Climb(c) => &c.person_id,
            Self::Lane(l) => &l.person_id,
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            Self::Task(t) => &t.item_id,
            Self::Climb(c) => &c.route_id,
            Self::Lane(l) => &l.lane_id,
        }
    }
}

/// Why a submission was refused. Every rejection is final for that request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Person '{0}' not found")]
    PersonNotFound(String),

    #[error("'{item_id}' is not a valid item for category '{category_id}'")]
    ItemNotInCategory {
        item_id: String,
        category_id: String,
    },

    #[error("Task already marked as Completed. Cannot resubmit.")]
    AlreadyCompleted,

    #[error("Task already attempted. You must mark it as Completed.")]
    MustAdvanceFromAttempted,

    #[error("'{item_id}' was already submitted for '{person_id}'")]
    AlreadySubmitted { person_id: String, item_id: String },

    #[error("Attempt {attempt} records a top before any zone")]
    TopBeforeZone { attempt: u32 },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RejectionKind {
    PersonNotFound,
    ItemNotInCategory,
    AlreadyCompleted,
    MustAdvanceFromAttempted,
    AlreadySubmitted,
    TopBeforeZone,
    InvalidPayload,
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::PersonNotFound(_) => RejectionKind::PersonNotFound,
            Self::ItemNotInCategory { .. } => RejectionKind::ItemNotInCategory,
            Self::AlreadyCompleted => RejectionKind::AlreadyCompleted,
            Self::MustAdvanceFromAttempted => RejectionKind::MustAdvanceFromAttempted,
            Self::AlreadySubmitted { .. } => RejectionKind::AlreadySubmitted,
            Self::TopBeforeZone { .. } => RejectionKind::TopBeforeZone,
            Self::InvalidPayload(_) => RejectionKind::InvalidPayload,
        }
    }
}

/// The single history mutation an accepted submission causes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Append(Submission),
    /// Replaces the record with the same `submission_id`.
    UpdateInPlace(Submission),
}

impl Effect {
    pub fn record(&self) -> &Submission {
        match self {
            Self::Append(record) | Self::UpdateInPlace(record) => record,
        }
    }

    pub fn into_record(self) -> Submission {
        match self {
            Self::Append(record) | Self::UpdateInPlace(record) => record,
        }
    }
}

pub type Verdict = std::result::Result<Effect, Rejection>;

/// Decides whether a submission is legal given the prior history. Pure: it never touches a
/// store, so a rejected request can be retried without side effects.
#[derive(Debug, Clone)]
pub struct SubmissionValidator {
    mode: SubmissionMode,
    route_category: String,
}

impl SubmissionValidator {
    pub fn new(mode: SubmissionMode) -> Self {
        Self {
            mode,
            route_category: DEFAULT_ROUTE_CATEGORY.to_string(),
        }
    }

    pub fn with_route_category(mut self, category: impl Into<String>) -> Self {
        self.route_category = category.into();
        self
    }

    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    /// `history` must contain at least every prior submission of the requesting person, keyed
    /// by the id the identity resolver returns for them. All history checks use that id.
    pub fn validate(
        &self,
        history: &[Submission],
        catalog: &dyn CatalogProvider,
        identities: &dyn IdentityResolver,
        request: &SubmissionRequest,
        now: DateTime<Utc>,
    ) -> Verdict {
        if request.mode() != self.mode {
            return Err(Rejection::InvalidPayload(format!(
                "expected a {} submission, got {}",
                self.mode,
                request.mode()
            )));
        }

        match request {
            SubmissionRequest::Task(task) => {
                self.validate_task(history, catalog, identities, task, now)
            }
            SubmissionRequest::Climb(climb) => {
                self.validate_climb(history, catalog, identities, climb, now)
            }
            SubmissionRequest::Lane(lane) => {
                self.validate_lane(history, catalog, identities, lane, now)
            }
        }
    }

    fn validate_task(
        &self,
        history: &[Submission],
        catalog: &dyn CatalogProvider,
        identities: &dyn IdentityResolver,
        task: &TaskSubmission,
        now: DateTime<Utc>,
    ) -> Verdict {
        let person = identities
            .resolve(&task.person_id)
            .ok_or_else(|| Rejection::PersonNotFound(task.person_id.clone()))?;

        ensure_in_category(catalog, &person, &task.category_id, &task.item_id)?;

        let existing = history.iter().find(|s| {
            s.is_for(&person.person_id, &task.item_id) && s.payload.mode() == SubmissionMode::Task
        });

        let Some(existing) = existing else {
            return Ok(Effect::Append(Submission::new(
                &person.person_id,
                &person.name,
                &task.category_id,
                &task.item_id,
                SubmissionPayload::Task {
                    status: task.status,
                },
                now,
            )));
        };

        match existing.payload.task_status() {
            Some(status) if status.is_terminal() => Err(Rejection::AlreadyCompleted),
            Some(TaskStatus::Attempted) if task.status == TaskStatus::Attempted => {
                Err(Rejection::MustAdvanceFromAttempted)
            }
            _ => {
                let mut updated = existing.clone();
                updated.payload = SubmissionPayload::Task {
                    status: task.status,
                };
                updated.recorded_at = now;
                Ok(Effect::UpdateInPlace(updated))
            }
        }
    }

    fn validate_climb(
        &self,
        history: &[Submission],
        catalog: &dyn CatalogProvider,
        identities: &dyn IdentityResolver,
        climb: &ClimbSubmission,
        now: DateTime<Utc>,
    ) -> Verdict {
        if climb.person_id.trim().is_empty() {
            return Err(Rejection::InvalidPayload("climber is required".to_string()));
        }
        if climb.route_id.trim().is_empty() {
            return Err(Rejection::InvalidPayload("route is required".to_string()));
        }
        if climb.attempts.is_empty() {
            return Err(Rejection::InvalidPayload(
                "at least one attempt is required".to_string(),
            ));
        }

        let person = identities
            .resolve(&climb.person_id)
            .ok_or_else(|| Rejection::PersonNotFound(climb.person_id.clone()))?;

        ensure_in_category(catalog, &person, &self.route_category, &climb.route_id)?;

        check_attempt_order(&climb.attempts)?;

        ensure_first_submission(
            history,
            SubmissionMode::Climb,
            &person.person_id,
            &climb.route_id,
        )?;

        Ok(Effect::Append(Submission::new(
            &person.person_id,
            &person.name,
            &self.route_category,
            &climb.route_id,
            SubmissionPayload::Climb(ClimbResult::from_attempts(&climb.attempts)),
            now,
        )))
    }

    fn validate_lane(
        &self,
        history: &[Submission],
        catalog: &dyn CatalogProvider,
        identities: &dyn IdentityResolver,
        lane: &LaneSubmission,
        now: DateTime<Utc>,
    ) -> Verdict {
        if lane.person_id.trim().is_empty() {
            return Err(Rejection::InvalidPayload("bib is required".to_string()));
        }
        if lane.category_id.trim().is_empty() || lane.lane_id.trim().is_empty() {
            return Err(Rejection::InvalidPayload(
                "category and lane are required".to_string(),
            ));
        }
        if lane.time <= Decimal::ZERO {
            return Err(Rejection::InvalidPayload(format!(
                "lane time must be positive, got {}",
                lane.time
            )));
        }

        let person = identities
            .resolve(&lane.person_id)
            .ok_or_else(|| Rejection::PersonNotFound(lane.person_id.clone()))?;

        ensure_in_category(catalog, &person, &lane.category_id, &lane.lane_id)?;

        ensure_first_submission(history, SubmissionMode::Lane, &person.person_id, &lane.lane_id)?;

        Ok(Effect::Append(Submission::new(
            &person.person_id,
            &person.name,
            &lane.category_id,
            &lane.lane_id,
            SubmissionPayload::Lane {
                time: Some(lane.time),
            },
            now,
        )))
    }
}

/// Scans attempts in order; a top is only legal once a zone has been reached, either on an
/// earlier attempt or on the same one.
pub fn check_attempt_order(attempts: &[Attempt]) -> std::result::Result<(), Rejection> {
    let mut zone_achieved = false;

    for (idx, attempt) in attempts.iter().enumerate() {
        if attempt.top && !zone_achieved && !attempt.zone {
            return Err(Rejection::TopBeforeZone {
                attempt: idx as u32 + 1,
            });
        }
        if attempt.zone {
            zone_achieved = true;
        }
    }

    Ok(())
}

fn ensure_in_category(
    catalog: &dyn CatalogProvider,
    person: &Person,
    category_id: &str,
    item_id: &str,
) -> std::result::Result<(), Rejection> {
    if person.is_eligible_for(category_id) && catalog.contains(category_id, item_id) {
        Ok(())
    } else {
        Err(Rejection::ItemNotInCategory {
            item_id: item_id.to_string(),
            category_id: category_id.to_string(),
        })
    }
}

fn ensure_first_submission(
    history: &[Submission],
    mode: SubmissionMode,
    person_id: &str,
    item_id: &str,
) -> std::result::Result<(), Rejection> {
    let duplicate = history
        .iter()
        .any(|s| s.payload.mode() == mode && s.is_for(person_id, item_id));

    if duplicate {
        Err(Rejection::AlreadySubmitted {
            person_id: person_id.to_string(),
            item_id: item_id.to_string(),
        })
    } else {
        Ok(())
    }
}
