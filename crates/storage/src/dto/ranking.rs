use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{RouteStatus, ScoringPolicy};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LeaderboardFilter {
    /// Overrides the configured scoring policy for this request
    pub policy: Option<ScoringPolicy>,
}

/// One climber's standing on the route leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub person_id: String,
    pub name: String,
    pub total_score: Decimal,
    pub routes: Vec<RouteScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteScore {
    pub route: String,
    pub status: RouteStatus,
    pub total_attempts: u32,
    pub zone_on_attempt: Option<u32>,
    pub top_on_attempt: Option<u32>,
    pub score: Decimal,
}

/// One climber's standing on the fastest-time leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpeedLeaderboardEntry {
    pub rank: i64,
    pub bib: String,
    pub climber: String,
    pub category: String,
    /// Fastest valid lane time; absent when no recorded time could be read
    pub best_time: Option<Decimal>,
    pub lane_times: Vec<LaneTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaneTime {
    pub lane: String,
    pub time: Option<Decimal>,
}
