use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Attempt, Submission, TaskStatus};
use crate::services::validation::{
    ClimbSubmission, LaneSubmission, RejectionKind, SubmissionRequest, TaskSubmission,
};

/// Request payload for recording progress on a department task
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskRequest {
    #[validate(length(min = 1, max = 64, message = "Employee id must be between 1 and 64 characters"))]
    pub employee_id: String,

    /// Ignored: the roster name is recorded. Accepted for compatibility with older forms.
    #[validate(length(max = 255))]
    pub employee_name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Department is required"))]
    pub department: String,

    #[validate(length(min = 1, max = 255, message = "Task is required"))]
    pub task: String,

    pub status: TaskStatus,
}

/// Request payload for recording a climber's attempts on a route
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitClimbRequest {
    #[validate(length(max = 255))]
    pub climber: String,

    #[validate(length(max = 255))]
    pub route: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "At most 100 attempts can be recorded"))]
    pub attempts: Vec<Attempt>,
}

/// Request payload for recording a timed run on a speed lane
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitLaneTimeRequest {
    #[validate(length(max = 64))]
    pub bib: String,

    /// Display only; the roster name is recorded.
    #[validate(length(max = 255))]
    pub climber: Option<String>,

    #[validate(length(max = 255))]
    pub category: String,

    #[validate(length(max = 255))]
    pub lane: String,

    #[schema(value_type = f64)]
    pub time: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub message: String,
    pub submission: Submission,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RejectionResponse {
    pub error: String,
    pub reason: RejectionKind,
}

impl From<SubmitTaskRequest> for SubmissionRequest {
    fn from(req: SubmitTaskRequest) -> Self {
        SubmissionRequest::Task(TaskSubmission {
            person_id: req.employee_id.trim().to_string(),
            category_id: req.department,
            item_id: req.task,
            status: req.status,
        })
    }
}

impl From<SubmitClimbRequest> for SubmissionRequest {
    fn from(req: SubmitClimbRequest) -> Self {
        SubmissionRequest::Climb(ClimbSubmission {
            person_id: req.climber.trim().to_string(),
            route_id: req.route,
            attempts: req.attempts,
        })
    }
}

impl From<SubmitLaneTimeRequest> for SubmissionRequest {
    fn from(req: SubmitLaneTimeRequest) -> Self {
        SubmissionRequest::Lane(LaneSubmission {
            person_id: req.bib.trim().to_string(),
            category_id: req.category,
            lane_id: req.lane,
            time: req.time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_request_uses_form_field_names() {
        let req: SubmitTaskRequest = serde_json::from_str(
            r#"{"employeeId":" E1 ","employeeName":"Dana","department":"Assembly","task":"11","status":"Attempted"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());

        let SubmissionRequest::Task(task) = SubmissionRequest::from(req) else {
            panic!("expected a task request");
        };
        assert_eq!(task.person_id, "E1");
        assert_eq!(task.category_id, "Assembly");
        assert_eq!(task.status, TaskStatus::Attempted);
    }

    #[test]
    fn test_task_request_requires_department() {
        let req = SubmitTaskRequest {
            employee_id: "E1".to_string(),
            employee_name: None,
            department: String::new(),
            task: "11".to_string(),
            status: TaskStatus::Completed,
        };
        let errors = req.validate().unwrap_err();
        assert!(
            errors
                .field_errors()
                .keys()
                .any(|field| field.to_string() == "department")
        );
    }

    #[test]
    fn test_lane_time_accepts_json_number() {
        let req: SubmitLaneTimeRequest = serde_json::from_str(
            r#"{"bib":"101","climber":"Rio","category":"Novice","lane":"Lane A","time":12.34}"#,
        )
        .unwrap();
        assert_eq!(req.time, Decimal::new(1234, 2));
    }
}
