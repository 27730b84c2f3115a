use thiserror::Error;

/// Failures surfaced by the record store, the query/mutation services and
/// their collaborators. None of these are fatal to the process.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Remote backend error: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
