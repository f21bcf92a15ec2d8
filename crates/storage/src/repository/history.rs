use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{Result, StorageError};
use crate::models::Submission;

use super::json_file;

/// Ordered submission log. Implementations must make `append` and `update_in_place` atomic from
/// the point of view of concurrent readers.
pub trait HistoryStore: Send + Sync {
    /// Snapshot of the full history, in submission order.
    fn all_records(&self) -> Result<Vec<Submission>>;

    fn records_for_person(&self, person_id: &str) -> Result<Vec<Submission>> {
        Ok(self
            .all_records()?
            .into_iter()
            .filter(|s| s.person_id == person_id)
            .collect())
    }

    fn append(&self, record: Submission) -> Result<()>;

    /// Replaces the record that has the same `submission_id`.
    fn update_in_place(&self, record: Submission) -> Result<()>;
}

fn replace_by_id(records: &mut [Submission], record: Submission) -> Result<()> {
    let slot = records
        .iter_mut()
        .find(|s| s.submission_id == record.submission_id)
        .ok_or(StorageError::NotFound)?;
    *slot = record;
    Ok(())
}

#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<Submission>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Submission>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl HistoryStore for InMemoryHistory {
    fn all_records(&self) -> Result<Vec<Submission>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::poisoned("history"))?;
        Ok(records.clone())
    }

    fn records_for_person(&self, person_id: &str) -> Result<Vec<Submission>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::poisoned("history"))?;
        Ok(records
            .iter()
            .filter(|s| s.person_id == person_id)
            .cloned()
            .collect())
    }

    fn append(&self, record: Submission) -> Result<()> {
        self.records
            .write()
            .map_err(|_| StorageError::poisoned("history"))?
            .push(record);
        Ok(())
    }

    fn update_in_place(&self, record: Submission) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::poisoned("history"))?;
        replace_by_id(&mut records, record)
    }
}

/// History kept in memory and flushed to a pretty-printed JSON array after every write.
///
/// The in-memory copy is only swapped once the file write has committed, so a failed flush
/// leaves both the file and the visible history untouched.
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    records: RwLock<Vec<Submission>>,
}

impl JsonFileHistory {
    /// Loads the history at `path`. A missing file is an empty history; an unreadable one is
    /// `StoreUnavailable`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Vec<Submission> = json_file::load(&path)?;

        tracing::info!(
            "Loaded {} submission(s) from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    fn write_with<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Submission>) -> Result<()>,
    {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::poisoned("history"))?;

        let mut next = records.clone();
        change(&mut next)?;
        json_file::save(&self.path, &next)?;
        *records = next;

        Ok(())
    }
}

impl HistoryStore for JsonFileHistory {
    fn all_records(&self) -> Result<Vec<Submission>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::poisoned("history"))?;
        Ok(records.clone())
    }

    fn append(&self, record: Submission) -> Result<()> {
        self.write_with(|records| {
            records.push(record);
            Ok(())
        })
    }

    fn update_in_place(&self, record: Submission) -> Result<()> {
        self.write_with(|records| replace_by_id(records, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubmissionPayload, TaskStatus};
    use chrono::Utc;
    use tempfile::tempdir;

    fn attempted(person: &str, item: &str) -> Submission {
        Submission::new(
            person,
            person,
            "Assembly",
            item,
            SubmissionPayload::Task {
                status: TaskStatus::Attempted,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempdir().unwrap();
        let store = JsonFileHistory::open(dir.path().join("submissions.json")).unwrap();
        assert!(store.all_records().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_unavailable_not_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("submissions.json");
        std::fs::write(&path, "[{\"submissionId\": ").unwrap();

        let err = JsonFileHistory::open(&path).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_writes_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("submissions.json");

        let store = JsonFileHistory::open(&path).unwrap();
        let record = attempted("E1", "11");
        store.append(record.clone()).unwrap();
        store.append(attempted("E2", "21")).unwrap();

        let mut completed = record.clone();
        completed.payload = SubmissionPayload::Task {
            status: TaskStatus::Completed,
        };
        store.update_in_place(completed.clone()).unwrap();

        let reopened = JsonFileHistory::open(&path).unwrap();
        let records = reopened.all_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], completed);
        assert_eq!(reopened.records_for_person("E2").unwrap().len(), 1);
    }

    #[test]
    fn test_update_of_unknown_record_changes_nothing() {
        let store = InMemoryHistory::with_records(vec![attempted("E1", "11")]);
        let before = store.all_records().unwrap();

        let err = store.update_in_place(attempted("E1", "11")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
        assert_eq!(store.all_records().unwrap(), before);
    }
}
