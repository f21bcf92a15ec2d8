use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tally_storage::models::{ScoringPolicy, SubmissionMode};
use tally_storage::services::validation::DEFAULT_ROUTE_CATEGORY;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub mode: SubmissionMode,
    pub policy: ScoringPolicy,
    pub roster_csv: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub route_category: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a number")?,
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            mode: std::env::var("SUBMISSION_MODE")
                .unwrap_or_else(|_| "task".to_string())
                .parse()
                .map_err(|e: String| anyhow!("Cannot parse SUBMISSION_MODE: {}", e))?,
            policy: std::env::var("SCORING_POLICY")
                .unwrap_or_else(|_| "additive".to_string())
                .parse()
                .map_err(|e: String| anyhow!("Cannot parse SCORING_POLICY: {}", e))?,
            roster_csv: std::env::var("ROSTER_CSV").ok().map(PathBuf::from),
            catalog_path: std::env::var("CATALOG_PATH").ok().map(PathBuf::from),
            route_category: std::env::var("ROUTE_CATEGORY")
                .unwrap_or_else(|_| DEFAULT_ROUTE_CATEGORY.to_string()),
        })
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("submissions.json")
    }

    pub fn adhoc_roster_path(&self) -> PathBuf {
        self.data_dir.join("adhoc-people.json")
    }
}
