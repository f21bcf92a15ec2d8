use tally_storage::{
    Tracker,
    dto::{
        ranking::{LeaderboardEntry, LeaderboardFilter, SpeedLeaderboardEntry},
        summary::PersonSummary,
    },
    error::Result,
};

/// Completed/attempted counts per person
pub fn get_summary(tracker: &Tracker) -> Result<Vec<PersonSummary>> {
    tracker.summary()
}

/// Route leaderboard, scored with the filter's policy or the configured one
pub fn get_leaderboard(tracker: &Tracker, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardEntry>> {
    tracker.leaderboard(filter.policy)
}

/// Speed leaderboard by best lane time
pub fn get_speed_leaderboard(tracker: &Tracker) -> Result<Vec<SpeedLeaderboardEntry>> {
    tracker.speed_leaderboard()
}
