//! # Catalog Crate
//!
//! Films, users and the store that owns them.
//!
//! ## Main Components
//!
//! - **types**: Domain types (Film, User, Mpa, Genre) and id aliases
//! - **error**: The error taxonomy shared by every crate in the workspace
//! - **store**: The `EntityStore` contract and its in-memory implementation
//! - **validation**: Field checks run in front of create/update
//! - **reference**: Lookups over the closed MPA and genre sets
//! - **parser**: Seed data files
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{EntityStore, FilmStore};
//!
//! let films = FilmStore::new();
//! let film = films.create(payload)?;
//! assert_eq!(films.get(film.id)?.name, film.name);
//! ```

pub mod error;
pub mod types;
pub mod store;
pub mod validation;
pub mod reference;
pub mod parser;

// Re-export commonly used types for convenience
pub use error::{CatalogError, EntityKind, ErrorKind, Result};
pub use parser::SeedData;
pub use store::{
    Entity, EntityStore, FilmStore, IdAllocator, InMemoryStore, SequentialIds, UserStore,
};
pub use types::{
    // Type aliases
    FilmId,
    UserId,
    // Core types
    Film,
    User,
    // Reference sets
    Genre,
    Mpa,
    // Constants
    CINEMA_BIRTHDAY,
    MAX_DESCRIPTION_LEN,
};
