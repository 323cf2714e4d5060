//! Service façade errors

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request was malformed or combined fields that cannot go together.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl ServiceError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        ServiceError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(self, ServiceError::InvalidRequest { .. })
    }
}

impl From<ServiceError> for crate::Error {
    fn from(err: ServiceError) -> Self {
        crate::Error::Service(err)
    }
}
