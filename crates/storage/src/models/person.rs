use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Someone who submits progress: an employee, a bib-numbered climber, or an open-entry climber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(alias = "person_id")]
    pub person_id: String,
    pub name: String,
    /// Categories the person may submit under. Empty means unrestricted.
    #[serde(default, alias = "departments")]
    pub categories: Vec<String>,
    /// Items assigned to the person (tasks, for employees).
    #[serde(default, alias = "tasks")]
    pub items: Vec<String>,
}

impl Person {
    pub fn new(person_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            person_id: person_id.into(),
            name: name.into(),
            categories: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_eligible_for(&self, category_id: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_person_is_eligible_everywhere() {
        let person = Person::new("Alice", "Alice");
        assert!(person.is_eligible_for("Route Set A"));
    }

    #[test]
    fn test_department_membership_restricts_eligibility() {
        let person = Person::new("E1", "Dana").with_categories(["Assembly", "Packing"]);
        assert!(person.is_eligible_for("Packing"));
        assert!(!person.is_eligible_for("Shipping"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let person = Person::new("E7", "Kim").with_categories(["QA"]);
        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(value["personId"], "E7");
        assert!(value.get("person_id").is_none());

        let back: Person = serde_json::from_value(value).unwrap();
        assert_eq!(back, person);
    }

    #[test]
    fn test_deserializes_legacy_roster_field_names() {
        let json = r#"{"person_id":"E7","name":"Kim","departments":["QA"],"tasks":["11","12"]}"#;
        let person: Person = serde_json::from_str(json).unwrap();
        assert_eq!(person.categories, vec!["QA"]);
        assert_eq!(person.items, vec!["11", "12"]);
    }
}
