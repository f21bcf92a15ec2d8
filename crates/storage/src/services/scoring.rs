use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;

use crate::dto::ranking::{LaneTime, LeaderboardEntry, RouteScore, SpeedLeaderboardEntry};
use crate::dto::summary::PersonSummary;
use crate::models::{ClimbResult, ScoringPolicy, Submission, SubmissionMode, SubmissionPayload, TaskStatus};

/// Points lost on the given 1-based attempt: 0.1 for every attempt after the first.
pub fn penalty(attempt: u32) -> Decimal {
    ScoringPolicy::PENALTY_PER_ATTEMPT * Decimal::from(attempt.saturating_sub(1))
}

/// Score for one route, rounded to 2 decimal places. Never negative.
pub fn route_score(result: &ClimbResult, policy: ScoringPolicy) -> Decimal {
    let milestone = |base: Decimal, attempt: Option<u32>| {
        (base - penalty(attempt.unwrap_or(1))).max(Decimal::ZERO)
    };

    let score = match policy {
        ScoringPolicy::Additive => {
            let zone = if result.has_zone {
                milestone(ScoringPolicy::ZONE_POINTS, result.zone_on_attempt)
            } else {
                Decimal::ZERO
            };
            let top = if result.has_top {
                milestone(ScoringPolicy::TOP_POINTS, result.top_on_attempt)
            } else {
                Decimal::ZERO
            };
            zone + top
        }
        ScoringPolicy::Flat => {
            if result.has_top {
                milestone(ScoringPolicy::FLAT_POINTS, result.top_on_attempt)
            } else if result.has_zone {
                milestone(ScoringPolicy::FLAT_POINTS, result.zone_on_attempt)
            } else {
                Decimal::ZERO
            }
        }
    };

    score.round_dp(2)
}

/// Competition ranks for keys that are already sorted best-first: equal keys share the rank of
/// the first of them and the next distinct key resumes at its 1-based position.
pub fn competition_ranks<K: PartialEq>(sorted_keys: &[K]) -> Vec<i64> {
    let mut ranks: Vec<i64> = Vec::with_capacity(sorted_keys.len());

    for (idx, key) in sorted_keys.iter().enumerate() {
        let rank = match ranks.last() {
            Some(&previous) if sorted_keys[idx - 1] == *key => previous,
            _ => idx as i64 + 1,
        };
        ranks.push(rank);
    }

    ranks
}

/// First record per (person, item) for the given payload kind, in history order. Later
/// duplicates are dropped, never merged.
pub fn first_per_key(history: &[Submission], mode: SubmissionMode) -> Vec<&Submission> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut firsts = Vec::new();

    for record in history {
        if record.payload.mode() == mode && seen.insert(record.key()) {
            firsts.push(record);
        }
    }

    firsts
}

/// Completed/attempted counts per person, in the order people first appear.
pub fn summarize(history: &[Submission]) -> Vec<PersonSummary> {
    let mut summaries: Vec<PersonSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in first_per_key(history, SubmissionMode::Task) {
        let slot = *index.entry(&record.person_id).or_insert_with(|| {
            summaries.push(PersonSummary::new(&record.person_id, &record.person_name));
            summaries.len() - 1
        });

        match record.payload.task_status() {
            Some(TaskStatus::Completed) => summaries[slot].completed += 1,
            Some(TaskStatus::Attempted) => summaries[slot].attempted += 1,
            None => {}
        }
    }

    summaries
}

/// Current status of every item a person has submitted. Rebuilt from the history on each call.
pub fn status_index(history: &[Submission], person_id: &str) -> BTreeMap<String, TaskStatus> {
    first_per_key(history, SubmissionMode::Task)
        .into_iter()
        .filter(|s| s.person_id == person_id)
        .filter_map(|s| s.payload.task_status().map(|status| (s.item_id.clone(), status)))
        .collect()
}

/// Route leaderboard: totals descending, ties share a rank. Equal totals are listed by name,
/// then person id.
pub fn aggregate(history: &[Submission], policy: ScoringPolicy) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in first_per_key(history, SubmissionMode::Climb) {
        let SubmissionPayload::Climb(result) = &record.payload else {
            continue;
        };

        let slot = *index.entry(&record.person_id).or_insert_with(|| {
            entries.push(LeaderboardEntry {
                rank: 0,
                person_id: record.person_id.clone(),
                name: record.person_name.clone(),
                total_score: Decimal::ZERO,
                routes: Vec::new(),
            });
            entries.len() - 1
        });

        let score = route_score(result, policy);
        let entry = &mut entries[slot];
        entry.total_score += score;
        entry.routes.push(RouteScore {
            route: record.item_id.clone(),
            status: result.status(),
            total_attempts: result.total_attempts,
            zone_on_attempt: result.zone_on_attempt,
            top_on_attempt: result.top_on_attempt,
            score,
        });
    }

    entries.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.person_id.cmp(&b.person_id))
    });

    let totals: Vec<Decimal> = entries.iter().map(|e| e.total_score).collect();
    for (entry, rank) in entries.iter_mut().zip(competition_ranks(&totals)) {
        entry.rank = rank;
    }

    entries
}

/// Fastest-time leaderboard: best lane time ascending, ties share a rank. People with no
/// readable time are listed last.
pub fn speed_leaderboard(history: &[Submission]) -> Vec<SpeedLeaderboardEntry> {
    let mut entries: Vec<SpeedLeaderboardEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in first_per_key(history, SubmissionMode::Lane) {
        let SubmissionPayload::Lane { time } = &record.payload else {
            continue;
        };

        let slot = *index.entry(&record.person_id).or_insert_with(|| {
            entries.push(SpeedLeaderboardEntry {
                rank: 0,
                bib: record.person_id.clone(),
                climber: record.person_name.clone(),
                category: record.category_id.clone(),
                best_time: None,
                lane_times: Vec::new(),
            });
            entries.len() - 1
        });

        let entry = &mut entries[slot];
        entry.lane_times.push(LaneTime {
            lane: record.item_id.clone(),
            time: *time,
        });
        entry.best_time = match (entry.best_time, *time) {
            (Some(best), Some(t)) => Some(best.min(t)),
            (best, t) => best.or(t),
        };
    }

    entries.sort_by(|a, b| {
        fastest_first(a.best_time, b.best_time)
            .then_with(|| a.climber.cmp(&b.climber))
            .then_with(|| a.bib.cmp(&b.bib))
    });

    let times: Vec<Option<Decimal>> = entries.iter().map(|e| e.best_time).collect();
    for (entry, rank) in entries.iter_mut().zip(competition_ranks(&times)) {
        entry.rank = rank;
    }

    entries
}

fn fastest_first(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Scoring entry point with the competition's policy fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreAggregator {
    policy: ScoringPolicy,
}

impl ScoreAggregator {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn aggregate(&self, history: &[Submission]) -> Vec<LeaderboardEntry> {
        aggregate(history, self.policy)
    }

    pub fn aggregate_with(&self, history: &[Submission], policy: ScoringPolicy) -> Vec<LeaderboardEntry> {
        aggregate(history, policy)
    }

    pub fn summarize(&self, history: &[Submission]) -> Vec<PersonSummary> {
        summarize(history)
    }

    pub fn speed_leaderboard(&self, history: &[Submission]) -> Vec<SpeedLeaderboardEntry> {
        speed_leaderboard(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attempt, RouteStatus};
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn climb(person: &str, route: &str, attempts: &[(bool, bool)]) -> Submission {
        let attempts: Vec<Attempt> = attempts.iter().map(|&(z, t)| Attempt::new(z, t)).collect();
        Submission::new(
            person,
            person,
            "routes",
            route,
            SubmissionPayload::Climb(ClimbResult::from_attempts(&attempts)),
            Utc::now(),
        )
    }

    fn task(person: &str, name: &str, item: &str, status: TaskStatus) -> Submission {
        Submission::new(person, name, "Assembly", item, SubmissionPayload::Task { status }, Utc::now())
    }

    fn lane(bib: &str, lane: &str, time: Option<&str>) -> Submission {
        Submission::new(
            bib,
            format!("Climber {bib}"),
            "Open",
            lane,
            SubmissionPayload::Lane {
                time: time.map(dec),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_penalty_per_attempt() {
        assert_eq!(penalty(0), Decimal::ZERO);
        assert_eq!(penalty(1), Decimal::ZERO);
        assert_eq!(penalty(3), dec("0.2"));
    }

    #[test]
    fn test_zone_on_third_attempt_additive() {
        let record = climb("Bo", "Route 1", &[(false, false), (false, false), (true, false)]);
        let SubmissionPayload::Climb(result) = &record.payload else {
            unreachable!()
        };
        assert_eq!(route_score(result, ScoringPolicy::Additive), dec("9.8"));
    }

    #[test]
    fn test_additive_penalizes_zone_and_top_independently() {
        let result = ClimbResult::from_attempts(&[
            Attempt::new(true, false),
            Attempt::new(false, false),
            Attempt::new(false, true),
        ]);
        // 10 + (15 - 0.2)
        assert_eq!(route_score(&result, ScoringPolicy::Additive), dec("24.8"));
    }

    #[test]
    fn test_flat_uses_top_attempt_when_topped() {
        let result = ClimbResult::from_attempts(&[Attempt::new(true, false), Attempt::new(false, true)]);
        assert_eq!(route_score(&result, ScoringPolicy::Flat), dec("24.9"));
    }

    #[test]
    fn test_flat_zone_only_and_no_milestone() {
        let zone_only = ClimbResult::from_attempts(&[Attempt::new(false, false), Attempt::new(true, false)]);
        assert_eq!(route_score(&zone_only, ScoringPolicy::Flat), dec("24.9"));

        let nothing = ClimbResult::from_attempts(&[Attempt::new(false, false)]);
        assert_eq!(route_score(&nothing, ScoringPolicy::Flat), Decimal::ZERO);
        assert_eq!(route_score(&nothing, ScoringPolicy::Additive), Decimal::ZERO);
    }

    #[test]
    fn test_competition_ranks_share_ties() {
        assert_eq!(competition_ranks(&[30, 30, 10, 5]), vec![1, 1, 3, 4]);
        assert_eq!(competition_ranks(&[30, 30, 20]), vec![1, 1, 3]);
        assert_eq!(competition_ranks(&[7, 7, 7]), vec![1, 1, 1]);
        assert!(competition_ranks::<i32>(&[]).is_empty());
    }

    #[test]
    fn test_leaderboard_ranks_and_sums_routes() {
        let history = vec![
            climb("Alice", "Route 1", &[(true, true)]),
            climb("Alice", "Route 2", &[(true, false)]),
            climb("Bob", "Route 1", &[(true, true)]),
            climb("Bob", "Route 2", &[(true, false)]),
            climb("Cara", "Route 1", &[(true, false), (false, true)]),
            climb("Dev", "Route 1", &[(false, false)]),
        ];

        let board = aggregate(&history, ScoringPolicy::Additive);
        let summary: Vec<(&str, i64, Decimal)> = board
            .iter()
            .map(|e| (e.person_id.as_str(), e.rank, e.total_score))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("Alice", 1, dec("35")),
                ("Bob", 1, dec("35")),
                ("Cara", 3, dec("24.9")),
                ("Dev", 4, Decimal::ZERO),
            ]
        );
        assert_eq!(board[0].routes.len(), 2);
        assert_eq!(board[0].routes[1].status, RouteStatus::Zone);
        assert_eq!(board[3].routes[0].status, RouteStatus::None);
    }

    #[test]
    fn test_leaderboard_is_deterministic() {
        let history = vec![
            climb("Zed", "Route 1", &[(true, false)]),
            climb("Amy", "Route 1", &[(true, false)]),
            climb("Kai", "Route 1", &[(false, false), (true, true)]),
        ];
        let first = aggregate(&history, ScoringPolicy::Flat);
        let second = aggregate(&history, ScoringPolicy::Flat);
        assert_eq!(first, second);
        assert_eq!(first[0].person_id, "Amy");
        assert_eq!(first[1].person_id, "Zed");
    }

    #[test]
    fn test_duplicate_climbs_count_once() {
        let history = vec![
            climb("Alice", "Route 1", &[(true, false)]),
            climb("Alice", "Route 1", &[(true, true)]),
        ];
        let board = aggregate(&history, ScoringPolicy::Additive);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].routes.len(), 1);
        assert_eq!(board[0].total_score, dec("10"));
    }

    #[test]
    fn test_summary_counts_first_record_per_task() {
        let history = vec![
            task("E1", "Dana", "11", TaskStatus::Completed),
            task("E2", "Sam", "21", TaskStatus::Attempted),
            task("E1", "Dana (renamed)", "12", TaskStatus::Attempted),
            task("E1", "Dana", "11", TaskStatus::Attempted),
        ];

        let summaries = summarize(&history);
        assert_eq!(
            summaries,
            vec![
                PersonSummary {
                    person_id: "E1".to_string(),
                    person_name: "Dana".to_string(),
                    completed: 1,
                    attempted: 1,
                },
                PersonSummary {
                    person_id: "E2".to_string(),
                    person_name: "Sam".to_string(),
                    completed: 0,
                    attempted: 1,
                },
            ]
        );
    }

    #[test]
    fn test_status_index_for_one_person() {
        let history = vec![
            task("E1", "Dana", "11", TaskStatus::Completed),
            task("E1", "Dana", "12", TaskStatus::Attempted),
            task("E2", "Sam", "11", TaskStatus::Attempted),
        ];
        let index = status_index(&history, "E1");
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("11"), Some(&TaskStatus::Completed));
        assert_eq!(index.get("12"), Some(&TaskStatus::Attempted));
    }

    #[test]
    fn test_speed_leaderboard_uses_best_lane() {
        let history = vec![
            lane("7", "Lane E", Some("14.20")),
            lane("7", "Lane F", Some("12.05")),
            lane("3", "Lane E", Some("12.05")),
            lane("9", "Lane E", Some("13.00")),
            lane("4", "Lane E", None),
        ];

        let board = speed_leaderboard(&history);
        let ranked: Vec<(&str, i64, Option<Decimal>)> = board
            .iter()
            .map(|e| (e.bib.as_str(), e.rank, e.best_time))
            .collect();

        assert_eq!(
            ranked,
            vec![
                ("3", 1, Some(dec("12.05"))),
                ("7", 1, Some(dec("12.05"))),
                ("9", 3, Some(dec("13.00"))),
                ("4", 4, None),
            ]
        );
        assert_eq!(board[1].lane_times.len(), 2);
    }

    #[test]
    fn test_aggregation_ignores_other_payload_kinds() {
        let history = vec![
            task("E1", "Dana", "11", TaskStatus::Completed),
            lane("7", "Lane E", Some("14.20")),
        ];
        assert!(aggregate(&history, ScoringPolicy::Additive).is_empty());
        assert_eq!(summarize(&history).len(), 1);
        assert_eq!(speed_leaderboard(&history).len(), 1);
    }
}
