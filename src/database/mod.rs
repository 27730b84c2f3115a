pub mod journal;
pub mod models;
pub mod store;

pub use journal::{JournalKind, JournalRepository};
pub use models::*;
pub use store::{Filter, Patch, Record, RecordStore, Table};
