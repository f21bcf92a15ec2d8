use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Person, TaskStatus};

/// Request payload for adding someone to the roster at runtime
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddPersonRequest {
    #[validate(length(min = 1, max = 64, message = "Id must be between 1 and 64 characters"))]
    #[validate(custom(function = "validate_person_id"))]
    pub id: String,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[serde(default, alias = "department")]
    #[validate(custom(function = "validate_labels"))]
    pub departments: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_labels"))]
    pub tasks: Vec<String>,
}

/// A roster entry together with the derived status of each item the person has submitted
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetailResponse {
    pub name: String,
    pub departments: Vec<String>,
    pub tasks: Vec<String>,
    pub task_status: BTreeMap<String, TaskStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RosterUploadResponse {
    pub message: String,
    pub added: usize,
}

// Validation helpers
fn validate_person_id(id: &str) -> Result<(), validator::ValidationError> {
    if id.trim() == id && !id.contains(',') {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_person_id"))
    }
}

fn validate_labels(labels: &[String]) -> Result<(), validator::ValidationError> {
    if labels.iter().all(|l| !l.trim().is_empty() && !l.contains(';')) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_label"))
    }
}

impl From<AddPersonRequest> for Person {
    fn from(req: AddPersonRequest) -> Self {
        Person::new(req.id, req.name)
            .with_categories(req.departments)
            .with_items(req.tasks)
    }
}

impl PersonDetailResponse {
    pub fn new(person: Option<Person>, task_status: BTreeMap<String, TaskStatus>) -> Self {
        match person {
            Some(person) => Self {
                name: person.name,
                departments: person.categories,
                tasks: person.items,
                task_status,
            },
            None => Self {
                name: String::new(),
                departments: Vec::new(),
                tasks: Vec::new(),
                task_status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_person_accepts_singular_department_key() {
        let req: AddPersonRequest = serde_json::from_str(
            r#"{"id":"E9","name":"Lee","department":["Assembly"],"tasks":["11"]}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        let person = Person::from(req);
        assert_eq!(person.categories, vec!["Assembly"]);
    }

    #[test]
    fn test_add_person_rejects_padded_id() {
        let req = AddPersonRequest {
            id: " E9".to_string(),
            name: "Lee".to_string(),
            departments: vec![],
            tasks: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_unknown_person_detail_is_empty() {
        let detail = PersonDetailResponse::new(None, BTreeMap::new());
        assert!(detail.name.is_empty());
        assert!(detail.tasks.is_empty());
    }
}
