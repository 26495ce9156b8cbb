//! Mapping from error kinds to response status codes.
//!
//! The transport itself lives outside this crate; whatever serves requests
//! uses [`ErrorResponse::from_error`] to turn a failed operation into a
//! status and a body.

use catalog::{CatalogError, ErrorKind};
use serde::{Deserialize, Serialize};

/// Response status for each error kind
pub fn status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Validation => 400,
        ErrorKind::NotFound => 404,
        ErrorKind::AlreadyExists => 409,
        ErrorKind::Internal => 500,
    }
}

/// Body sent with a failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Status plus body for a failed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: ErrorBody,
}

impl ErrorResponse {
    pub fn from_error(err: &CatalogError) -> Self {
        Self {
            status: status_code(err.kind()),
            body: ErrorBody {
                error: err.to_string(),
            },
        }
    }
}
