//! Lookups over the closed MPA and genre reference sets.

use crate::error::{CatalogError, EntityKind, Result};
use crate::types::{Genre, Mpa};

/// Resolve an MPA rating by its numeric id
pub fn mpa_by_id(id: u32) -> Result<Mpa> {
    Mpa::ALL
        .into_iter()
        .find(|mpa| mpa.id() == id)
        .ok_or_else(|| CatalogError::not_found(EntityKind::Mpa, u64::from(id)))
}

/// Resolve a genre by its numeric id
pub fn genre_by_id(id: u32) -> Result<Genre> {
    Genre::ALL
        .into_iter()
        .find(|genre| genre.id() == id)
        .ok_or_else(|| CatalogError::not_found(EntityKind::Genre, u64::from(id)))
}

/// All MPA ratings in id order
pub fn all_mpa() -> Vec<Mpa> {
    Mpa::ALL.to_vec()
}

/// All genres in id order
pub fn all_genres() -> Vec<Genre> {
    Genre::ALL.to_vec()
}
