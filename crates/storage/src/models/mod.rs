mod attempt;
mod catalog;
mod person;
mod scoring_policy;
mod submission;

pub use attempt::{Attempt, ClimbResult, RouteStatus};
pub use catalog::Catalog;
pub use person::Person;
pub use scoring_policy::ScoringPolicy;
pub use submission::{Submission, SubmissionMode, SubmissionPayload, TaskStatus};
