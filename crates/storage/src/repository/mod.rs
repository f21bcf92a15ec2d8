pub mod catalog;
pub mod history;
mod json_file;
pub mod roster;

pub use catalog::CatalogProvider;
pub use history::{HistoryStore, InMemoryHistory, JsonFileHistory};
pub use roster::{IdentityResolver, OpenRegistration, Roster};
