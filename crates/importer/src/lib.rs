pub mod error;
pub mod replay;
pub mod roster_import;

pub use error::{ImporterError, Result};
pub use replay::{HistoryReplayer, ReplayReport};
pub use roster_import::{RosterImporter, RosterReport};
