use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How a climb is converted into points. Chosen per competition, never inferred from data.
///
/// Additive: zone worth 10, top worth a further 15, each reduced by its own attempt penalty.
/// Flat: any milestone is worth 25, reduced once by the penalty of the attempt that reached
/// the highest milestone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    #[default]
    Additive,
    Flat,
}

impl ScoringPolicy {
    pub const ZONE_POINTS: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
    pub const TOP_POINTS: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
    pub const FLAT_POINTS: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
    /// Deducted for every attempt after the first.
    pub const PENALTY_PER_ATTEMPT: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
}

impl FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "additive" => Ok(Self::Additive),
            "flat" => Ok(Self::Flat),
            other => Err(format!(
                "unknown scoring policy '{other}', expected additive or flat"
            )),
        }
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Additive => write!(f, "additive"),
            Self::Flat => write!(f, "flat"),
        }
    }
}
