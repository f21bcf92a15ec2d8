use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;

use crate::error::{Result, StorageError};
use crate::models::Person;

use super::catalog::CatalogProvider;
use super::json_file;

/// One roster CSV row. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    name: String,
    #[serde(default, alias = "department")]
    departments: String,
    #[serde(default)]
    tasks: String,
}

/// Maps an external id (employee id, bib number, climber name) to a known person.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, person_id: &str) -> Option<Person>;
}

/// Open competitions: any non-empty name is its own identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRegistration;

impl IdentityResolver for OpenRegistration {
    fn resolve(&self, person_id: &str) -> Option<Person> {
        let name = person_id.trim();
        (!name.is_empty()).then(|| Person::new(name, name))
    }
}

/// People known to the tracker: a CSV roster overlaid with entries added at runtime.
///
/// Runtime additions are written to the ad-hoc file (when configured) so they survive a
/// restart. Ad-hoc entries override CSV rows with the same id.
#[derive(Debug, Default)]
pub struct Roster {
    people: RwLock<BTreeMap<String, Person>>,
    adhoc_path: Option<PathBuf>,
}

impl Roster {
    pub fn from_people(people: Vec<Person>) -> Self {
        Self {
            people: RwLock::new(
                people
                    .into_iter()
                    .map(|p| (p.person_id.clone(), p))
                    .collect(),
            ),
            adhoc_path: None,
        }
    }

    pub fn load(csv_path: Option<&Path>, adhoc_path: Option<PathBuf>) -> Result<Self> {
        let mut people = BTreeMap::new();

        if let Some(csv_path) = csv_path {
            if csv_path.exists() {
                let text = std::fs::read_to_string(csv_path)?;
                let rows = Self::parse_csv(&text)?;
                tracing::info!("Loaded {} roster row(s) from {}", rows.len(), csv_path.display());
                people.extend(rows.into_iter().map(|p| (p.person_id.clone(), p)));
            } else {
                tracing::warn!("Roster CSV {} not found, starting without it", csv_path.display());
            }
        }

        if let Some(adhoc_path) = &adhoc_path {
            let adhoc: Vec<Person> = json_file::load(adhoc_path)?;
            if !adhoc.is_empty() {
                tracing::info!(
                    "Loaded {} ad-hoc roster entr(ies) from {}",
                    adhoc.len(),
                    adhoc_path.display()
                );
            }
            people.extend(adhoc.into_iter().map(|p| (p.person_id.clone(), p)));
        }

        Ok(Self {
            people: RwLock::new(people),
            adhoc_path,
        })
    }

    /// Parses `id,name,departments,tasks` rows; list columns are `;`-separated. Columns are
    /// matched by header name, case-insensitively, and `departments`/`tasks` are optional.
    pub fn parse_csv(text: &str) -> Result<Vec<Person>> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: StringRecord = reader
            .headers()
            .map_err(roster_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_lowercase())
            .collect();

        if headers.iter().all(str::is_empty) {
            return Ok(Vec::new());
        }
        if !headers.iter().any(|h| h == "id") {
            return Err(StorageError::Roster("header is missing an 'id' column".to_string()));
        }
        if !headers.iter().any(|h| h == "name") {
            return Err(StorageError::Roster("header is missing a 'name' column".to_string()));
        }
        reader.set_headers(headers.clone());

        let mut people = Vec::new();

        for record in reader.records() {
            let record = record.map_err(roster_error)?;
            let row: RosterRow = record.deserialize(Some(&headers)).map_err(roster_error)?;

            if row.id.is_empty() {
                tracing::warn!(
                    "Skipping roster line {}: empty id",
                    record.position().map_or(0, |p| p.line())
                );
                continue;
            }

            people.push(
                Person::new(row.id, row.name)
                    .with_categories(split_list(&row.departments))
                    .with_items(split_list(&row.tasks)),
            );
        }

        Ok(people)
    }

    pub fn list(&self) -> Result<Vec<Person>> {
        let people = self.people.read().map_err(|_| StorageError::poisoned("roster"))?;
        Ok(people.values().cloned().collect())
    }

    pub fn get(&self, person_id: &str) -> Result<Option<Person>> {
        let people = self.people.read().map_err(|_| StorageError::poisoned("roster"))?;
        Ok(people.get(person_id).cloned())
    }

    /// Adds one person; an existing id is a constraint violation.
    pub fn add(&self, person: Person) -> Result<()> {
        let mut people = self.people.write().map_err(|_| StorageError::poisoned("roster"))?;

        if people.contains_key(&person.person_id) {
            return Err(StorageError::ConstraintViolation(format!(
                "Person id '{}' already exists",
                person.person_id
            )));
        }

        self.persist_adhoc(std::slice::from_ref(&person))?;
        tracing::info!("Added person {} to the roster", person.person_id);
        people.insert(person.person_id.clone(), person);

        Ok(())
    }

    /// Adds every person whose id is not yet known and returns the ids that were added.
    /// Known ids are left untouched.
    pub fn merge(&self, incoming: Vec<Person>) -> Result<Vec<String>> {
        let mut people = self.people.write().map_err(|_| StorageError::poisoned("roster"))?;

        let mut additions: Vec<Person> = Vec::new();
        for person in incoming {
            let duplicate = people.contains_key(&person.person_id)
                || additions.iter().any(|p| p.person_id == person.person_id);
            if !duplicate {
                additions.push(person);
            }
        }

        self.persist_adhoc(&additions)?;

        let added: Vec<String> = additions.iter().map(|p| p.person_id.clone()).collect();
        people.extend(additions.into_iter().map(|p| (p.person_id.clone(), p)));

        Ok(added)
    }

    fn persist_adhoc(&self, additions: &[Person]) -> Result<()> {
        let Some(path) = &self.adhoc_path else {
            return Ok(());
        };
        if additions.is_empty() {
            return Ok(());
        }

        let mut adhoc: Vec<Person> = json_file::load(path)?;
        adhoc.retain(|p| !additions.iter().any(|a| a.person_id == p.person_id));
        adhoc.extend(additions.iter().cloned());

        json_file::save(path, &adhoc)
    }
}

impl IdentityResolver for Roster {
    fn resolve(&self, person_id: &str) -> Option<Person> {
        match self.get(person_id) {
            Ok(person) => person,
            Err(e) => {
                tracing::error!("Roster lookup failed: {}", e);
                None
            }
        }
    }
}

/// Without a catalog file, a department's valid items are the tasks assigned to its members.
impl CatalogProvider for Roster {
    fn valid_items_for(&self, category_id: &str) -> BTreeSet<String> {
        let Ok(people) = self.people.read() else {
            tracing::error!("Roster lock poisoned while building catalog");
            return BTreeSet::new();
        };

        people
            .values()
            .filter(|p| p.categories.iter().any(|c| c == category_id))
            .flat_map(|p| p.items.iter().cloned())
            .collect()
    }
}

fn split_list(field: &str) -> Vec<String> {
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn roster_error(error: csv::Error) -> StorageError {
    StorageError::Roster(error.to_string())
}
