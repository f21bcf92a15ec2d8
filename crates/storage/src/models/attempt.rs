use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One try on a climbing route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attempt {
    pub zone: bool,
    pub top: bool,
}

impl Attempt {
    pub fn new(zone: bool, top: bool) -> Self {
        Self { zone, top }
    }
}

/// Highest milestone reached on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Top,
    Zone,
    None,
}

/// Persisted outcome of a climb: the raw attempt sequence plus the milestones derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClimbResult {
    pub attempts: Vec<Attempt>,
    pub total_attempts: u32,
    pub has_zone: bool,
    pub has_top: bool,
    /// 1-based index of the first attempt that reached the zone
    pub zone_on_attempt: Option<u32>,
    /// 1-based index of the first attempt that topped the route
    pub top_on_attempt: Option<u32>,
}

impl ClimbResult {
    /// Derives milestones from an attempt sequence. Ordering rules are enforced by the
    /// validator, not here.
    pub fn from_attempts(attempts: &[Attempt]) -> Self {
        let first = |pred: fn(&Attempt) -> bool| {
            attempts
                .iter()
                .position(pred)
                .map(|idx| idx as u32 + 1)
        };

        let zone_on_attempt = first(|a| a.zone);
        let top_on_attempt = first(|a| a.top);

        Self {
            attempts: attempts.to_vec(),
            total_attempts: attempts.len() as u32,
            has_zone: zone_on_attempt.is_some(),
            has_top: top_on_attempt.is_some(),
            zone_on_attempt,
            top_on_attempt,
        }
    }

    pub fn status(&self) -> RouteStatus {
        if self.has_top {
            RouteStatus::Top
        } else if self.has_zone {
            RouteStatus::Zone
        } else {
            RouteStatus::None
        }
    }
}
