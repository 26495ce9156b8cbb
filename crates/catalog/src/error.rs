//! Error types shared by the catalog, the relation indexes and the services.
//!
//! Every failure carries enough context to be logged on its own, and every
//! failure can be classified into one of four [`ErrorKind`]s. The boundary
//! layer maps kinds to response codes; nothing below it downgrades a kind.

use std::fmt;
use std::sync::PoisonError;
use thiserror::Error;

/// Which kind of record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Film,
    User,
    Genre,
    Mpa,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Film => "film",
            EntityKind::User => "user",
            EntityKind::Genre => "genre",
            EntityKind::Mpa => "MPA rating",
        };
        f.write_str(name)
    }
}

/// Coarse classification used at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    AlreadyExists,
    Internal,
}

/// Errors produced by catalog storage, relation indexes and services
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A payload failed field validation
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Referenced record doesn't exist
    #[error("No {entity} with id {id}")]
    NotFound { entity: EntityKind, id: u64 },

    /// Creation or update collides with a uniqueness key
    #[error("A {entity} with {field} '{value}' already exists")]
    AlreadyExists {
        entity: EntityKind,
        field: &'static str,
        value: String,
    },

    /// I/O error while reading seed data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Line in a seed file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    /// Broken invariant or infrastructure failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CatalogError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: EntityKind, id: u64) -> Self {
        CatalogError::NotFound { entity, id }
    }

    /// Build the error for a lock whose holder panicked.
    pub fn poisoned<T>(what: &str) -> impl FnOnce(PoisonError<T>) -> Self + '_ {
        move |_| CatalogError::Internal(format!("{what} lock poisoned"))
    }

    /// Classify this error for the boundary layer.
    ///
    /// Seed-data I/O and parse failures are infrastructure problems, so they
    /// count as internal.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation { .. } => ErrorKind::Validation,
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
            CatalogError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CatalogError::Io(_) | CatalogError::Parse { .. } | CatalogError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Convenience type alias for Results in the catalog and the crates built on it
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CatalogError::validation("name", "blank").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CatalogError::not_found(EntityKind::Film, 7).kind(),
            ErrorKind::NotFound
        );
        let conflict = CatalogError::AlreadyExists {
            entity: EntityKind::User,
            field: "email",
            value: "a@b.c".to_string(),
        };
        assert_eq!(conflict.kind(), ErrorKind::AlreadyExists);
        assert_eq!(
            CatalogError::Internal("boom".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let err = CatalogError::not_found(EntityKind::User, 42);
        assert_eq!(err.to_string(), "No user with id 42");
    }

    #[test]
    fn test_poisoned_lock_is_internal() {
        let lock = Arc::new(Mutex::new(0));
        let cloned = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let err = lock.lock().map_err(CatalogError::poisoned("test")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
