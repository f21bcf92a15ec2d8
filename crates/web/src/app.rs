use std::sync::Arc;

use anyhow::{Context, bail};
use axum::Router;
use tally_storage::{
    Tracker,
    models::{Catalog, SubmissionMode},
    repository::{CatalogProvider, IdentityResolver, JsonFileHistory, OpenRegistration, Roster},
    services::{ScoreAggregator, SubmissionValidator},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::features::{people, rankings, submissions};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub roster: Arc<Roster>,
}

impl AppState {
    pub fn new(tracker: Arc<Tracker>, roster: Arc<Roster>) -> Self {
        Self { tracker, roster }
    }

    /// Loads the roster and history from disk and picks the catalog and identity source that
    /// fit the configured mode.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let roster = Arc::new(
            Roster::load(config.roster_csv.as_deref(), Some(config.adhoc_roster_path()))
                .context("Failed to load roster")?,
        );

        let store = Arc::new(
            JsonFileHistory::open(config.history_path())
                .context("Failed to load submission history")?,
        );

        let catalog: Arc<dyn CatalogProvider> = match (&config.catalog_path, config.mode) {
            (Some(path), _) => Arc::new(Catalog::from_file(path).context("Failed to load catalog")?),
            (None, SubmissionMode::Task) => roster.clone(),
            (None, SubmissionMode::Lane) => Arc::new(Catalog::speed_lanes()),
            (None, SubmissionMode::Climb) => bail!("CATALOG_PATH is required in climb mode"),
        };

        let identities: Arc<dyn IdentityResolver> = match config.mode {
            SubmissionMode::Climb => Arc::new(OpenRegistration),
            SubmissionMode::Task | SubmissionMode::Lane => roster.clone(),
        };

        let validator =
            SubmissionValidator::new(config.mode).with_route_category(&config.route_category);
        let tracker = Tracker::new(
            store,
            catalog,
            identities,
            validator,
            ScoreAggregator::new(config.policy),
        );

        tracing::info!(
            "Tracker ready in {} mode with {} scoring",
            tracker.mode(),
            tracker.policy()
        );

        Ok(Self::new(Arc::new(tracker), roster))
    }
}

pub fn router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/submissions", submissions::routes::routes())
        .nest("/api/people", people::routes::routes())
        .nest("/api/rankings", rankings::routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tally_storage::{
        models::{Person, ScoringPolicy},
        repository::InMemoryHistory,
    };
    use tower::ServiceExt;

    fn state(mode: SubmissionMode) -> AppState {
        let roster = Arc::new(Roster::from_people(vec![
            Person::new("E1", "Dana")
                .with_categories(["Assembly"])
                .with_items(["11", "12"]),
            Person::new("101", "Rio"),
        ]));

        let (catalog, identities): (Arc<dyn CatalogProvider>, Arc<dyn IdentityResolver>) =
            match mode {
                SubmissionMode::Task => (roster.clone(), roster.clone()),
                SubmissionMode::Lane => (Arc::new(Catalog::speed_lanes()), roster.clone()),
                SubmissionMode::Climb => (
                    Arc::new(Catalog::new().with_category("routes", ["Route 1", "Route 2"])),
                    Arc::new(OpenRegistration),
                ),
            };

        let tracker = Tracker::new(
            Arc::new(InMemoryHistory::new()),
            catalog,
            identities,
            SubmissionValidator::new(mode),
            ScoreAggregator::new(ScoringPolicy::Flat),
        );

        AppState::new(Arc::new(tracker), roster)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    fn task_body(status: &str) -> Value {
        json!({
            "employeeId": "E1",
            "employeeName": "Dana",
            "department": "Assembly",
            "task": "11",
            "status": status
        })
    }

    fn config(data_dir: &std::path::Path, mode: SubmissionMode) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: data_dir.to_path_buf(),
            mode,
            policy: ScoringPolicy::Additive,
            roster_csv: None,
            catalog_path: None,
            route_category: "routes".to_string(),
        }
    }

    #[test]
    fn test_climb_mode_requires_catalog() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppState::from_config(&config(dir.path(), SubmissionMode::Climb)).is_err());

        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, r#"{"routes":["Route 1"]}"#).unwrap();
        let mut climb = config(dir.path(), SubmissionMode::Climb);
        climb.catalog_path = Some(catalog);
        assert!(AppState::from_config(&climb).is_ok());
    }

    #[test]
    fn test_corrupt_history_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("submissions.json"), "not json").unwrap();
        assert!(AppState::from_config(&config(dir.path(), SubmissionMode::Lane)).is_err());
    }

    #[tokio::test]
    async fn test_task_flow_over_http() {
        let app = router().with_state(state(SubmissionMode::Task));

        let (status, body) =
            send(&app, Method::POST, "/api/submissions/tasks", Some(task_body("Attempted"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["submission"]["personName"], "Dana");

        let (status, body) =
            send(&app, Method::POST, "/api/submissions/tasks", Some(task_body("Attempted"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "MustAdvanceFromAttempted");

        let (status, _) =
            send(&app, Method::POST, "/api/submissions/tasks", Some(task_body("Completed"))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, Method::POST, "/api/submissions/tasks", Some(task_body("Completed"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["reason"], "AlreadyCompleted");

        let (status, body) = send(&app, Method::GET, "/api/rankings/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"employeeId": "E1", "employeeName": "Dana", "Completed": 1, "Attempted": 0}]));

        let (_, body) = send(&app, Method::GET, "/api/people/E1", None).await;
        assert_eq!(body["taskStatus"]["11"], "Completed");
    }

    #[tokio::test]
    async fn test_unknown_employee_is_not_found() {
        let app = router().with_state(state(SubmissionMode::Task));
        let mut body = task_body("Attempted");
        body["employeeId"] = json!("E404");

        let (status, body) = send(&app, Method::POST, "/api/submissions/tasks", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["reason"], "PersonNotFound");
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_payload() {
        let app = router().with_state(state(SubmissionMode::Climb));
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/submissions/climbs",
            Some(json!({"climber": "Alice", "route": "Route 1", "attempts": [{"zone": "yes"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "InvalidPayload");
    }

    #[tokio::test]
    async fn test_climb_leaderboard_over_http() {
        let app = router().with_state(state(SubmissionMode::Climb));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/submissions/climbs",
            Some(json!({
                "climber": "Alice",
                "route": "Route 1",
                "attempts": [{"zone": true, "top": false}, {"zone": false, "top": true}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["submission"]["payload"]["topOnAttempt"], 2);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/submissions/climbs",
            Some(json!({"climber": "Bob", "route": "Route 1", "attempts": [{"zone": false, "top": true}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "TopBeforeZone");

        let (_, flat) = send(&app, Method::GET, "/api/rankings/leaderboard", None).await;
        assert_eq!(flat[0]["rank"], 1);
        assert_eq!(flat[0]["totalScore"], "24.9");

        let (_, additive) =
            send(&app, Method::GET, "/api/rankings/leaderboard?policy=additive", None).await;
        assert_eq!(additive[0]["totalScore"], "24.9");
        assert_eq!(additive[0]["routes"][0]["status"], "top");
    }

    #[tokio::test]
    async fn test_lane_times_and_speed_board() {
        let app = router().with_state(state(SubmissionMode::Lane));
        let lane = |lane: &str, time: f64| {
            json!({"bib": "101", "climber": "Rio", "category": "Novice", "lane": lane, "time": time})
        };

        let (status, _) = send(&app, Method::PUT, "/api/submissions/lanes", Some(lane("Lane A", 14.5))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, Method::PUT, "/api/submissions/lanes", Some(lane("Lane B", 12.25))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app, Method::PUT, "/api/submissions/lanes", Some(lane("Lane B", 11.0))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["reason"], "AlreadySubmitted");

        let (_, board) = send(&app, Method::GET, "/api/rankings/speed", None).await;
        assert_eq!(board[0]["bib"], "101");
        assert_eq!(board[0]["bestTime"], "12.25");
    }

    #[tokio::test]
    async fn test_people_endpoints() {
        let app = router().with_state(state(SubmissionMode::Task));

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/people",
            Some(json!({"id": "E1", "name": "Dup"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let upload = Request::builder()
            .method(Method::POST)
            .uri("/api/people/upload")
            .header("content-type", "text/csv")
            .body(Body::from("id,name,departments,tasks\nE1,Dana,Assembly,11\nE5,Ola,Packing,21\n"))
            .unwrap();
        let response = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["added"], 1);

        let (_, body) = send(&app, Method::GET, "/api/people/E5", None).await;
        assert_eq!(body["name"], "Ola");

        let (status, body) = send(&app, Method::GET, "/api/people/nobody", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "");
    }
}
