//! Field validation for film and user payloads.
//!
//! These checks run in front of the store: a payload that reaches `create`
//! or `update` is assumed to be well formed.

use crate::error::{CatalogError, Result};
use crate::types::{CINEMA_BIRTHDAY, Film, MAX_DESCRIPTION_LEN, User};
use chrono::NaiveDate;
use tracing::warn;

/// Check a film payload
///
/// Rejects a blank name, a blank or over-long description, a release date
/// before [`CINEMA_BIRTHDAY`] and a zero duration.
pub fn validate_film(film: &Film) -> Result<()> {
    let outcome = check_film(film);
    if let Err(err) = &outcome {
        warn!(film = %film.name, "Rejected film payload: {}", err);
    }
    outcome
}

fn check_film(film: &Film) -> Result<()> {
    if film.name.trim().is_empty() {
        return Err(CatalogError::validation("name", "must not be blank"));
    }
    if film.description.trim().is_empty() {
        return Err(CatalogError::validation("description", "must not be blank"));
    }
    let description_len = film.description.chars().count();
    if description_len > MAX_DESCRIPTION_LEN {
        return Err(CatalogError::validation(
            "description",
            format!("{description_len} characters exceeds the limit of {MAX_DESCRIPTION_LEN}"),
        ));
    }
    if film.release_date < CINEMA_BIRTHDAY {
        return Err(CatalogError::validation(
            "release_date",
            format!("{} is before {}", film.release_date, CINEMA_BIRTHDAY),
        ));
    }
    if film.duration == 0 {
        return Err(CatalogError::validation("duration", "must be positive"));
    }
    Ok(())
}

/// Check a user payload against the given evaluation date
pub fn validate_user(user: &User, today: NaiveDate) -> Result<()> {
    let outcome = check_user(user, today);
    if let Err(err) = &outcome {
        warn!(login = %user.login, "Rejected user payload: {}", err);
    }
    outcome
}

fn check_user(user: &User, today: NaiveDate) -> Result<()> {
    if user.email.trim().is_empty() || !user.email.contains('@') {
        return Err(CatalogError::validation(
            "email",
            format!("'{}' is not an email address", user.email),
        ));
    }
    if user.login.is_empty() || user.login.chars().any(char::is_whitespace) {
        return Err(CatalogError::validation(
            "login",
            "must be non-blank and contain no whitespace",
        ));
    }
    if user.birthday > today {
        return Err(CatalogError::validation(
            "birthday",
            format!("{} is in the future", user.birthday),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::Mpa;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn film() -> Film {
        Film {
            id: 0,
            name: "Nosferatu".to_string(),
            description: "A vampire comes to Wisborg".to_string(),
            release_date: date(1922, 3, 4),
            duration: 94,
            mpa: Mpa::Pg13,
            genres: BTreeSet::new(),
        }
    }

    fn user() -> User {
        User {
            id: 0,
            email: "max@example.com".to_string(),
            login: "max".to_string(),
            name: String::new(),
            birthday: date(1990, 5, 17),
        }
    }

    fn rejected_field(result: Result<()>) -> &'static str {
        match result {
            Err(CatalogError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_film() {
        assert!(validate_film(&film()).is_ok());
    }

    #[test]
    fn test_film_without_name() {
        let mut f = film();
        f.name = "  ".to_string();
        assert_eq!(rejected_field(validate_film(&f)), "name");
    }

    #[test]
    fn test_film_description_limits() {
        let mut f = film();
        f.description = String::new();
        assert_eq!(rejected_field(validate_film(&f)), "description");

        f.description = "x".repeat(MAX_DESCRIPTION_LEN);
        assert!(validate_film(&f).is_ok());

        f.description.push('x');
        assert_eq!(rejected_field(validate_film(&f)), "description");
    }

    #[test]
    fn test_film_release_date_floor() {
        let mut f = film();
        f.release_date = CINEMA_BIRTHDAY;
        assert!(validate_film(&f).is_ok());

        f.release_date = date(1895, 12, 27);
        let err = validate_film(&f).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_film_zero_duration() {
        let mut f = film();
        f.duration = 0;
        assert_eq!(rejected_field(validate_film(&f)), "duration");
    }

    #[test]
    fn test_valid_user() {
        assert!(validate_user(&user(), date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_user_email() {
        let mut u = user();
        u.email = "max.example.com".to_string();
        assert_eq!(rejected_field(validate_user(&u, date(2024, 1, 1))), "email");

        u.email = " ".to_string();
        assert_eq!(rejected_field(validate_user(&u, date(2024, 1, 1))), "email");
    }

    #[test]
    fn test_user_login_whitespace() {
        let mut u = user();
        u.login = "max power".to_string();
        assert_eq!(rejected_field(validate_user(&u, date(2024, 1, 1))), "login");

        u.login = String::new();
        assert_eq!(rejected_field(validate_user(&u, date(2024, 1, 1))), "login");
    }

    #[test]
    fn test_user_birthday_in_future() {
        let mut u = user();
        u.birthday = date(2024, 1, 2);
        assert_eq!(rejected_field(validate_user(&u, date(2024, 1, 1))), "birthday");

        u.birthday = date(2024, 1, 1);
        assert!(validate_user(&u, date(2024, 1, 1)).is_ok());
    }
}
