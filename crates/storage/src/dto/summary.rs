use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Completed/attempted task counts for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PersonSummary {
    #[serde(rename = "employeeId")]
    pub person_id: String,
    #[serde(rename = "employeeName")]
    pub person_name: String,
    #[serde(rename = "Completed")]
    pub completed: u32,
    #[serde(rename = "Attempted")]
    pub attempted: u32,
}

impl PersonSummary {
    pub fn new(person_id: impl Into<String>, person_name: impl Into<String>) -> Self {
        Self {
            person_id: person_id.into(),
            person_name: person_name.into(),
            completed: 0,
            attempted: 0,
        }
    }
}
