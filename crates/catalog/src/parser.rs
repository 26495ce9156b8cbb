//! Parser for seed data files.
//!
//! A seed directory holds `::`-separated `.dat` files:
//! - films.dat: filmId::name::description::releaseDate::duration::mpaId::genreIds
//! - users.dat: userId::email::login::name::birthday
//! - likes.dat: filmId::userId
//! - friends.dat: userId::friendId
//!
//! Genre ids are `|`-separated and may be empty. Dates are `YYYY-MM-DD`.
//! Blank lines and `#` comments are skipped. The ids in these files only
//! link rows to each other; the stores assign the real ids on load.

use crate::error::{CatalogError, Result};
use crate::reference::{genre_by_id, mpa_by_id};
use crate::types::{Film, FilmId, User, UserId};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::Split;
use tracing::{debug, info};

pub const FILMS_FILE: &str = "films.dat";
pub const USERS_FILE: &str = "users.dat";
pub const LIKES_FILE: &str = "likes.dat";
pub const FRIENDS_FILE: &str = "friends.dat";

/// Everything parsed from a seed directory
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub films: Vec<Film>,
    pub users: Vec<User>,
    /// (film id, user id) pairs, in seed-file ids
    pub likes: Vec<(FilmId, UserId)>,
    /// (user id, friend id) pairs, in seed-file ids
    pub friendships: Vec<(UserId, UserId)>,
}

impl SeedData {
    /// Parse all four files of a seed directory
    ///
    /// films.dat and users.dat are required; the relation files are optional.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading seed data from {:?}", data_dir);

        let films_path = data_dir.join(FILMS_FILE);
        let users_path = data_dir.join(USERS_FILE);
        let likes_path = data_dir.join(LIKES_FILE);
        let friends_path = data_dir.join(FRIENDS_FILE);

        // Entities and relations are independent files, parse them in parallel
        let ((films, users), (likes, friendships)) = rayon::join(
            || {
                rayon::join(
                    || parse_films(&films_path),
                    || parse_users(&users_path),
                )
            },
            || {
                rayon::join(
                    || parse_pairs_if_present(&likes_path, LIKES_FILE),
                    || parse_pairs_if_present(&friends_path, FRIENDS_FILE),
                )
            },
        );

        let seed = SeedData {
            films: films?,
            users: users?,
            likes: likes?,
            friendships: friendships?,
        };

        info!(
            "Parsed {} films, {} users, {} likes, {} friendships",
            seed.films.len(),
            seed.users.len(),
            seed.likes.len(),
            seed.friendships.len()
        );
        Ok(seed)
    }
}

/// Non-blank, non-comment lines with their 1-based line numbers
fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_error(file: &str, line: usize, reason: impl Into<String>) -> CatalogError {
    CatalogError::Parse {
        file: file.to_string(),
        line,
        reason: reason.into(),
    }
}

/// Pull the next `::` field off a line
fn next_field<'a>(
    parts: &mut Split<'a, &'static str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts
        .next()
        .ok_or_else(|| parse_error(file, line, format!("Missing {name}")))
}

fn parse_number<T: std::str::FromStr>(raw: &str, file: &str, line: usize, name: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| parse_error(file, line, format!("Invalid {name}: '{raw}'")))
}

fn parse_date(raw: &str, file: &str, line: usize, name: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| parse_error(file, line, format!("Invalid {name} '{raw}': {e}")))
}

fn ensure_exhausted(parts: &mut Split<'_, &'static str>, file: &str, line: usize) -> Result<()> {
    match parts.next() {
        Some(extra) => Err(parse_error(file, line, format!("Unexpected field '{extra}'"))),
        None => Ok(()),
    }
}

/// Parse one films.dat line
pub fn parse_film_line(raw: &str, line: usize) -> Result<Film> {
    let file = FILMS_FILE;
    let mut parts = raw.split("::");

    let id = parse_number(next_field(&mut parts, file, line, "filmId")?, file, line, "filmId")?;
    let name = next_field(&mut parts, file, line, "name")?.to_string();
    let description = next_field(&mut parts, file, line, "description")?.to_string();
    let release_date = parse_date(
        next_field(&mut parts, file, line, "releaseDate")?,
        file,
        line,
        "releaseDate",
    )?;
    let duration = parse_number(
        next_field(&mut parts, file, line, "duration")?,
        file,
        line,
        "duration",
    )?;
    let mpa_id = parse_number(next_field(&mut parts, file, line, "mpaId")?, file, line, "mpaId")?;
    let mpa = mpa_by_id(mpa_id).map_err(|e| parse_error(file, line, e.to_string()))?;

    let genres = next_field(&mut parts, file, line, "genreIds")?
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let id = parse_number(s, file, line, "genreId")?;
            genre_by_id(id).map_err(|e| parse_error(file, line, e.to_string()))
        })
        .collect::<Result<BTreeSet<_>>>()?;
    ensure_exhausted(&mut parts, file, line)?;

    Ok(Film {
        id,
        name,
        description,
        release_date,
        duration,
        mpa,
        genres,
    })
}

/// Parse one users.dat line
pub fn parse_user_line(raw: &str, line: usize) -> Result<User> {
    let file = USERS_FILE;
    let mut parts = raw.split("::");

    let id = parse_number(next_field(&mut parts, file, line, "userId")?, file, line, "userId")?;
    let email = next_field(&mut parts, file, line, "email")?.to_string();
    let login = next_field(&mut parts, file, line, "login")?.to_string();
    let name = next_field(&mut parts, file, line, "name")?.to_string();
    let birthday = parse_date(
        next_field(&mut parts, file, line, "birthday")?,
        file,
        line,
        "birthday",
    )?;
    ensure_exhausted(&mut parts, file, line)?;

    Ok(User {
        id,
        email,
        login,
        name,
        birthday,
    })
}

/// Parse one `leftId::rightId` relation line
pub fn parse_pair_line(raw: &str, file: &str, line: usize) -> Result<(u64, u64)> {
    let mut parts = raw.split("::");
    let left = parse_number(next_field(&mut parts, file, line, "first id")?, file, line, "first id")?;
    let right = parse_number(
        next_field(&mut parts, file, line, "second id")?,
        file,
        line,
        "second id",
    )?;
    ensure_exhausted(&mut parts, file, line)?;
    Ok((left, right))
}

pub fn parse_films(path: &Path) -> Result<Vec<Film>> {
    let content = fs::read_to_string(path)?;
    data_lines(&content)
        .map(|(line, raw)| parse_film_line(raw, line))
        .collect()
}

pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    let content = fs::read_to_string(path)?;
    data_lines(&content)
        .map(|(line, raw)| parse_user_line(raw, line))
        .collect()
}

fn parse_pairs_if_present(path: &Path, file: &str) -> Result<Vec<(u64, u64)>> {
    if !path.exists() {
        debug!("{} not present, treating as empty", file);
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    data_lines(&content)
        .map(|(line, raw)| parse_pair_line(raw, file, line))
        .collect()
}
