//! Transactional curation ledger: journals, and the proposed entities,
//! relations, and concept candidates awaiting human accept/reject review.

pub mod errors;
pub mod schema;
pub mod store;

pub use errors::CurationError;
pub use store::{CurationItem, CurationStats, CurationStore, ItemStatus, JournalOverallStatus, NewItem, PendingCurationTasks};
