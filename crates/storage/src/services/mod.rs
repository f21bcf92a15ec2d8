pub mod scoring;
pub mod tracker;
pub mod validation;

pub use scoring::ScoreAggregator;
pub use tracker::{SubmitError, Tracker};
pub use validation::{Effect, Rejection, RejectionKind, SubmissionRequest, SubmissionValidator};
