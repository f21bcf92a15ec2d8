use std::collections::HashSet;

use tally_storage::{models::Person, repository::Roster};
use tracing::warn;

use crate::{ImporterError, Result};

/// Checks roster CSV rows before they are merged into the live roster.
pub struct RosterImporter;

impl RosterImporter {
    pub fn validate(people: &[Person]) -> Result<RosterReport> {
        let mut report = RosterReport::default();

        if people.is_empty() {
            report
                .warnings
                .push("Roster file contains no people".to_string());
        }

        let mut ids = HashSet::new();
        for person in people {
            if person.name.trim().is_empty() {
                report
                    .errors
                    .push(format!("Person '{}' has an empty name", person.person_id));
            }
            if !ids.insert(person.person_id.as_str()) {
                report
                    .errors
                    .push(format!("Duplicate person id: '{}'", person.person_id));
            }

            if person.categories.is_empty() {
                report.warnings.push(format!(
                    "Person '{}' has no department and may submit for any",
                    person.person_id
                ));
            } else if person.items.is_empty() {
                report
                    .warnings
                    .push(format!("Person '{}' has no tasks assigned", person.person_id));
            }
        }

        if !report.errors.is_empty() {
            Err(ImporterError::ValidationError(format!(
                "Validation failed with {} error(s): {}",
                report.errors.len(),
                report.errors.join("; ")
            )))
        } else {
            Ok(report)
        }
    }

    /// Parses and validates `csv`, then merges it into `roster` unless `validate_only` is set.
    /// People already on the roster are reported as skipped and left untouched.
    pub fn import(csv: &str, roster: &Roster, validate_only: bool) -> Result<RosterReport> {
        let people = Roster::parse_csv(csv)?;
        let mut report = Self::validate(&people)?;
        report.parsed = people.len();

        if validate_only {
            return Ok(report);
        }

        let incoming: Vec<String> = people.iter().map(|p| p.person_id.clone()).collect();
        report.added = roster.merge(people)?;
        report.skipped = incoming
            .into_iter()
            .filter(|id| !report.added.contains(id))
            .collect();

        Ok(report)
    }
}

#[derive(Debug, Default)]
pub struct RosterReport {
    pub parsed: usize,
    pub added: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl RosterReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}
