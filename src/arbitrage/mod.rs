pub mod mock;
pub mod ordering;
pub mod service;

pub use ordering::{OrderSpec, SortField};
pub use service::{ArbitrageService, ExecutionOutcome};
