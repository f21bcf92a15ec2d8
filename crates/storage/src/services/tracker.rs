use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::dto::ranking::{LeaderboardEntry, SpeedLeaderboardEntry};
use crate::dto::summary::PersonSummary;
use crate::error::StorageError;
use crate::models::{ScoringPolicy, Submission, SubmissionMode, TaskStatus};
use crate::repository::{CatalogProvider, HistoryStore, IdentityResolver};

use super::scoring::{self, ScoreAggregator};
use super::validation::{Effect, Rejection, SubmissionRequest, SubmissionValidator};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Wires the validator and aggregator to their collaborators.
///
/// Submissions are serialized: the history snapshot, the validation and the write all happen
/// under one guard, so two requests for the same key can never both be accepted. Reads only
/// take a snapshot and never wait on that guard.
pub struct Tracker {
    store: Arc<dyn HistoryStore>,
    catalog: Arc<dyn CatalogProvider>,
    identities: Arc<dyn IdentityResolver>,
    validator: SubmissionValidator,
    aggregator: ScoreAggregator,
    write_guard: Mutex<()>,
    events: broadcast::Sender<Submission>,
}

impl Tracker {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        catalog: Arc<dyn CatalogProvider>,
        identities: Arc<dyn IdentityResolver>,
        validator: SubmissionValidator,
        aggregator: ScoreAggregator,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            store,
            catalog,
            identities,
            validator,
            aggregator,
            write_guard: Mutex::new(()),
            events,
        }
    }

    pub fn mode(&self) -> SubmissionMode {
        self.validator.mode()
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.aggregator.policy()
    }

    pub fn submit(&self, request: SubmissionRequest) -> Result<Effect, SubmitError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| StorageError::poisoned("submission"))?;

        // History is keyed by the resolved id; unknown people are rejected by the validator.
        let person_id = self
            .identities
            .resolve(request.person_id())
            .map(|person| person.person_id)
            .unwrap_or_else(|| request.person_id().to_string());
        let history = self.store.records_for_person(&person_id)?;
        let verdict = self.validator.validate(
            &history,
            self.catalog.as_ref(),
            self.identities.as_ref(),
            &request,
            Utc::now(),
        );

        let effect = match verdict {
            Ok(effect) => effect,
            Err(rejection) => {
                tracing::warn!(
                    "Rejected {} submission for {} / {}: {}",
                    request.mode(),
                    request.person_id(),
                    request.item_id(),
                    rejection
                );
                return Err(rejection.into());
            }
        };

        match &effect {
            Effect::Append(record) => self.store.append(record.clone())?,
            Effect::UpdateInPlace(record) => self.store.update_in_place(record.clone())?,
        }

        let record = effect.record();
        tracing::info!(
            "Recorded {} submission {} for {} / {}",
            record.payload.mode(),
            record.submission_id,
            record.person_id,
            record.item_id
        );

        if self.events.send(record.clone()).is_err() {
            tracing::debug!("No live subscribers for submission {}", record.submission_id);
        }

        Ok(effect)
    }

    /// Receives every accepted submission from now on. Slow receivers miss messages rather
    /// than holding up writers.
    pub fn subscribe(&self) -> broadcast::Receiver<Submission> {
        self.events.subscribe()
    }

    pub fn history(&self) -> Result<Vec<Submission>, StorageError> {
        self.store.all_records()
    }

    pub fn summary(&self) -> Result<Vec<PersonSummary>, StorageError> {
        Ok(self.aggregator.summarize(&self.store.all_records()?))
    }

    pub fn leaderboard(
        &self,
        policy: Option<ScoringPolicy>,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let history = self.store.all_records()?;
        Ok(match policy {
            Some(policy) => self.aggregator.aggregate_with(&history, policy),
            None => self.aggregator.aggregate(&history),
        })
    }

    pub fn speed_leaderboard(&self) -> Result<Vec<SpeedLeaderboardEntry>, StorageError> {
        Ok(self.aggregator.speed_leaderboard(&self.store.all_records()?))
    }

    pub fn status_index(&self, person_id: &str) -> Result<BTreeMap<String, TaskStatus>, StorageError> {
        let history = self.store.records_for_person(person_id)?;
        Ok(scoring::status_index(&history, person_id))
    }
}
