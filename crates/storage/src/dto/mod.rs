pub mod person;
pub mod ranking;
pub mod submission;
pub mod summary;
