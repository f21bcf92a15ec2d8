use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::attempt::ClimbResult;

/// Outcome of a tracked task. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TaskStatus {
    Attempted,
    Completed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attempted => write!(f, "Attempted"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// Which payload shape a tracker instance accepts. Fixed by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    Task,
    Climb,
    Lane,
}

impl FromStr for SubmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "task" | "tasks" => Ok(Self::Task),
            "climb" | "climbing" => Ok(Self::Climb),
            "lane" | "speed" => Ok(Self::Lane),
            other => Err(format!(
                "unknown submission mode '{other}', expected task, climb or lane"
            )),
        }
    }
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Climb => write!(f, "climb"),
            Self::Lane => write!(f, "lane"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SubmissionPayload {
    Task {
        status: TaskStatus,
    },
    Climb(ClimbResult),
    Lane {
        /// Seconds. Unparseable values in the history file load as `None`.
        #[serde(default, deserialize_with = "lenient_decimal")]
        #[schema(value_type = Option<f64>)]
        time: Option<Decimal>,
    },
}

impl SubmissionPayload {
    pub fn mode(&self) -> SubmissionMode {
        match self {
            Self::Task { .. } => SubmissionMode::Task,
            Self::Climb(_) => SubmissionMode::Climb,
            Self::Lane { .. } => SubmissionMode::Lane,
        }
    }

    pub fn task_status(&self) -> Option<TaskStatus> {
        match self {
            Self::Task { status } => Some(*status),
            _ => None,
        }
    }
}

/// One accepted event in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub submission_id: Uuid,
    pub person_id: String,
    pub person_name: String,
    pub category_id: String,
    pub item_id: String,
    pub payload: SubmissionPayload,
    pub created_at: DateTime<Utc>,
    /// Refreshed whenever the record is updated in place.
    pub recorded_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        person_id: impl Into<String>,
        person_name: impl Into<String>,
        category_id: impl Into<String>,
        item_id: impl Into<String>,
        payload: SubmissionPayload,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            submission_id: Uuid::new_v4(),
            person_id: person_id.into(),
            person_name: person_name.into(),
            category_id: category_id.into(),
            item_id: item_id.into(),
            payload,
            created_at: at,
            recorded_at: at,
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.person_id, &self.item_id)
    }

    pub fn is_for(&self, person_id: &str, item_id: &str) -> bool {
        self.person_id == person_id && self.item_id == item_id
    }
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.to_string().parse().ok(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_completed_is_terminal() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(!TaskStatus::Attempted.is_terminal());
    }

    fn lane_from_json(time: &str) -> SubmissionPayload {
        serde_json::from_str(&format!(r#"{{"kind":"lane","time":{time}}}"#)).unwrap()
    }

    #[test]
    fn test_lane_time_accepts_numbers_and_strings() {
        assert_eq!(
            lane_from_json("12.5"),
            SubmissionPayload::Lane {
                time: Some(Decimal::new(125, 1))
            }
        );
        assert_eq!(
            lane_from_json(r#"" 9.81 ""#),
            SubmissionPayload::Lane {
                time: Some(Decimal::new(981, 2))
            }
        );
    }

    #[test]
    fn test_unparseable_lane_time_is_absent() {
        assert_eq!(lane_from_json(r#""fast""#), SubmissionPayload::Lane { time: None });
        assert_eq!(lane_from_json("null"), SubmissionPayload::Lane { time: None });
    }

    #[test]
    fn test_task_payload_shape() {
        let payload = SubmissionPayload::Task {
            status: TaskStatus::Completed,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "task");
        assert_eq!(json["status"], "Completed");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Climbing".parse::<SubmissionMode>(), Ok(SubmissionMode::Climb));
        assert_eq!("speed".parse::<SubmissionMode>(), Ok(SubmissionMode::Lane));
        assert!("bouldering".parse::<SubmissionMode>().is_err());
    }
}
