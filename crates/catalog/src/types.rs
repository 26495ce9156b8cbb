//! Core domain types for the film catalog.
//!
//! Films and users are plain data: they carry no behaviour beyond what the
//! store needs to enforce identity and uniqueness. Closed reference sets (MPA
//! ratings and genres) are enums so an out-of-range value can't be built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a film, assigned by the store on creation
pub type FilmId = u64;

/// Unique identifier for a user, assigned by the store on creation
pub type UserId = u64;

/// Release dates earlier than this are rejected (the first public film screening)
pub const CINEMA_BIRTHDAY: NaiveDate = match NaiveDate::from_ymd_opt(1895, 12, 28) {
    Some(date) => date,
    None => panic!("invalid cinema birthday"),
};

/// Longest accepted film description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 200;

// =============================================================================
// Reference Data
// =============================================================================

/// MPA film rating classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mpa {
    G,
    Pg,
    Pg13,
    R,
    Nc17,
}

impl Mpa {
    pub const ALL: [Mpa; 5] = [Mpa::G, Mpa::Pg, Mpa::Pg13, Mpa::R, Mpa::Nc17];

    /// Stable numeric id used in seed files and by API clients
    pub fn id(self) -> u32 {
        match self {
            Mpa::G => 1,
            Mpa::Pg => 2,
            Mpa::Pg13 => 3,
            Mpa::R => 4,
            Mpa::Nc17 => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mpa::G => "G",
            Mpa::Pg => "PG",
            Mpa::Pg13 => "PG-13",
            Mpa::R => "R",
            Mpa::Nc17 => "NC-17",
        }
    }
}

impl fmt::Display for Mpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Film genres
///
/// Ordered by id, so a `BTreeSet<Genre>` iterates in id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Comedy,
    Drama,
    Animation,
    Thriller,
    Documentary,
    Action,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Comedy,
        Genre::Drama,
        Genre::Animation,
        Genre::Thriller,
        Genre::Documentary,
        Genre::Action,
    ];

    pub fn id(self) -> u32 {
        match self {
            Genre::Comedy => 1,
            Genre::Drama => 2,
            Genre::Animation => 3,
            Genre::Thriller => 4,
            Genre::Documentary => 5,
            Genre::Action => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Animation => "Animation",
            Genre::Thriller => "Thriller",
            Genre::Documentary => "Documentary",
            Genre::Action => "Action",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A film in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    /// Ignored on create; the store assigns it
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    /// Runtime in minutes
    pub duration: u32,
    pub mpa: Mpa,
    /// Genre tags; a set, so duplicates collapse and order doesn't matter
    #[serde(default)]
    pub genres: BTreeSet<Genre>,
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub login: String,
    /// Display name; a blank name is replaced by the login when the user is created
    #[serde(default)]
    pub name: String,
    pub birthday: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_ids_are_dense() {
        let mpa_ids: Vec<u32> = Mpa::ALL.iter().map(|m| m.id()).collect();
        assert_eq!(mpa_ids, vec![1, 2, 3, 4, 5]);

        let genre_ids: Vec<u32> = Genre::ALL.iter().map(|g| g.id()).collect();
        assert_eq!(genre_ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_genre_set_deduplicates() {
        let genres: BTreeSet<Genre> = [Genre::Action, Genre::Comedy, Genre::Action]
            .into_iter()
            .collect();
        assert_eq!(genres.len(), 2);
        assert_eq!(genres.iter().next(), Some(&Genre::Comedy));
    }

    #[test]
    fn test_cinema_birthday() {
        assert_eq!(CINEMA_BIRTHDAY.to_string(), "1895-12-28");
    }
}
