pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{create_router, ActionResponse, AppState};
pub use server::{build_state, ApiServer};
