//! Ranking Service - likes and the popular-films query
//!
//! Composes the film and user stores with the [`LikeIndex`]:
//! - mutations check both endpoints exist before touching the index
//! - `popular_films` ranks ids through the index and materialises them
//!   through the film store
//!
//! ## Popular films
//! 1. Rank liked films by descending like count, ties to the earlier film
//! 2. Pad with unliked films in store listing order, skipping duplicates
//! 3. Stop at `count` or when the catalog runs out

use catalog::{CatalogError, EntityKind, EntityStore, Film, FilmId, Result, User, UserId};
use relations::LikeIndex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Likes and popularity over the film catalog
#[derive(Clone)]
pub struct RankingService {
    films: Arc<dyn EntityStore<Film>>,
    users: Arc<dyn EntityStore<User>>,
    likes: Arc<LikeIndex>,
}

impl RankingService {
    /// Create a ranking service over shared stores and a shared like index
    pub fn new(
        films: Arc<dyn EntityStore<Film>>,
        users: Arc<dyn EntityStore<User>>,
        likes: Arc<LikeIndex>,
    ) -> Self {
        Self {
            films,
            users,
            likes,
        }
    }

    /// Fail with `NotFound` unless both the film and the user exist
    fn ensure_endpoints(&self, film_id: FilmId, user_id: UserId) -> Result<()> {
        if !self.films.contains(film_id)? {
            return Err(CatalogError::not_found(EntityKind::Film, film_id));
        }
        if !self.users.contains(user_id)? {
            return Err(CatalogError::not_found(EntityKind::User, user_id));
        }
        Ok(())
    }

    /// Record that a user likes a film; repeating it changes nothing
    #[instrument(skip(self))]
    pub fn add_like(&self, film_id: FilmId, user_id: UserId) -> Result<()> {
        self.ensure_endpoints(film_id, user_id)?;
        if self.likes.add(film_id, user_id)? {
            info!("User {} liked film {}", user_id, film_id);
        }
        Ok(())
    }

    /// Withdraw a like; a like that was never there is a logged no-op
    #[instrument(skip(self))]
    pub fn remove_like(&self, film_id: FilmId, user_id: UserId) -> Result<()> {
        self.ensure_endpoints(film_id, user_id)?;
        if self.likes.remove(film_id, user_id)? {
            info!("User {} no longer likes film {}", user_id, film_id);
        }
        Ok(())
    }

    /// Number of likes on an existing film
    pub fn likes_for(&self, film_id: FilmId) -> Result<usize> {
        if !self.films.contains(film_id)? {
            return Err(CatalogError::not_found(EntityKind::Film, film_id));
        }
        self.likes.count(film_id)
    }

    /// Users who liked an existing film, in ascending id order
    pub fn likers(&self, film_id: FilmId) -> Result<Vec<User>> {
        if !self.films.contains(film_id)? {
            return Err(CatalogError::not_found(EntityKind::Film, film_id));
        }
        self.likes
            .likers(film_id)?
            .into_iter()
            .map(|user_id| self.users.get(user_id))
            .collect()
    }

    /// Total likes across the catalog
    pub fn total_likes(&self) -> Result<usize> {
        self.likes.total()
    }

    /// The `count` most liked films, padded with unliked films
    ///
    /// Returns `min(count, number of films)` films. A `count` of zero
    /// returns nothing. Ranking covers the films listed at the start of the
    /// call; a film created while the query runs shows up on the next one.
    #[instrument(skip(self))]
    pub fn popular_films(&self, count: usize) -> Result<Vec<Film>> {
        let all_films = self.films.list()?;
        let universe: Vec<FilmId> = all_films.iter().map(|film| film.id).collect();
        let ranked = self.likes.top_films(count, universe)?;

        let mut by_id: HashMap<FilmId, Film> =
            all_films.into_iter().map(|film| (film.id, film)).collect();

        // Ranked ids come from the listing, so each one resolves exactly once
        let films: Vec<Film> = ranked
            .into_iter()
            .map(|film_id| {
                by_id.remove(&film_id).ok_or_else(|| {
                    CatalogError::Internal(format!("liked film {film_id} missing from store"))
                })
            })
            .collect::<Result<_>>()?;

        debug!("Returning {} popular films", films.len());
        Ok(films)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{ErrorKind, FilmStore, Mpa, UserStore};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn film(name: &str) -> Film {
        Film {
            id: 0,
            name: name.to_string(),
            description: format!("{name} description"),
            release_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            duration: 90,
            mpa: Mpa::Pg,
            genres: BTreeSet::new(),
        }
    }

    fn user(login: &str) -> User {
        User {
            id: 0,
            email: format!("{login}@example.com"),
            login: login.to_string(),
            name: login.to_string(),
            birthday: NaiveDate::from_ymd_opt(1985, 6, 1).unwrap(),
        }
    }

    fn create_test_service() -> (RankingService, Vec<FilmId>, Vec<UserId>) {
        let films = Arc::new(FilmStore::new());
        let users = Arc::new(UserStore::new());

        let film_ids = ["F1", "F2", "F3"]
            .into_iter()
            .map(|name| films.create(film(name)).unwrap().id)
            .collect();
        let user_ids = ["u1", "u2"]
            .into_iter()
            .map(|login| users.create(user(login)).unwrap().id)
            .collect();

        let service = RankingService::new(films, users, Arc::new(LikeIndex::new()));
        (service, film_ids, user_ids)
    }

    #[test]
    fn test_popular_films_scenario() {
        let (service, f, u) = create_test_service();
        // F1: 0 likes, F2: 2 likes, F3: 1 like
        service.add_like(f[1], u[0]).unwrap();
        service.add_like(f[1], u[1]).unwrap();
        service.add_like(f[2], u[0]).unwrap();

        let names: Vec<String> = service
            .popular_films(3)
            .unwrap()
            .into_iter()
            .map(|film| film.name)
            .collect();
        assert_eq!(names, vec!["F2", "F3", "F1"]);
    }

    #[test]
    fn test_popular_films_length() {
        let (service, f, u) = create_test_service();
        service.add_like(f[2], u[0]).unwrap();

        assert_eq!(service.popular_films(0).unwrap().len(), 0);
        assert_eq!(service.popular_films(1).unwrap()[0].id, f[2]);
        assert_eq!(service.popular_films(2).unwrap().len(), 2);
        assert_eq!(service.popular_films(10).unwrap().len(), 3);
    }

    #[test]
    fn test_popular_without_likes_is_listing_order() {
        let (service, f, _) = create_test_service();
        let ids: Vec<FilmId> = service.popular_films(10).unwrap().into_iter().map(|x| x.id).collect();
        assert_eq!(ids, f);
    }

    #[test]
    fn test_like_count_and_idempotence() {
        let (service, f, u) = create_test_service();
        assert_eq!(service.likes_for(f[0]).unwrap(), 0);

        service.add_like(f[0], u[0]).unwrap();
        assert_eq!(service.likes_for(f[0]).unwrap(), 1);
        service.add_like(f[0], u[0]).unwrap();
        assert_eq!(service.likes_for(f[0]).unwrap(), 1);

        service.remove_like(f[0], u[0]).unwrap();
        assert_eq!(service.likes_for(f[0]).unwrap(), 0);
        // Second removal is a no-op, not an error
        service.remove_like(f[0], u[0]).unwrap();
    }

    #[test]
    fn test_like_unknown_endpoints() {
        let (service, f, u) = create_test_service();

        let err = service.add_like(999, u[0]).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: EntityKind::Film, id: 999 }));

        let err = service.add_like(f[0], 999).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: EntityKind::User, id: 999 }));

        assert_eq!(service.remove_like(f[0], 999).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(service.likes_for(999).unwrap_err().kind(), ErrorKind::NotFound);
    }

    /// Film store that creates and likes a film right after taking its listing
    struct LateArrivalStore {
        inner: Arc<FilmStore>,
        likes: Arc<LikeIndex>,
        liker: UserId,
    }

    impl EntityStore<Film> for LateArrivalStore {
        fn create(&self, entity: Film) -> Result<Film> {
            self.inner.create(entity)
        }

        fn update(&self, entity: Film) -> Result<Film> {
            self.inner.update(entity)
        }

        fn find(&self, id: u64) -> Result<Option<Film>> {
            self.inner.find(id)
        }

        fn list(&self) -> Result<Vec<Film>> {
            let listing = self.inner.list()?;
            let late = self.inner.create(film(&format!("Late {}", listing.len())))?;
            self.likes.add(late.id, self.liker)?;
            Ok(listing)
        }

        fn len(&self) -> Result<usize> {
            self.inner.len()
        }
    }

    #[test]
    fn test_popular_films_with_film_created_mid_query() {
        let inner = Arc::new(FilmStore::new());
        let users = Arc::new(UserStore::new());
        let likes = Arc::new(LikeIndex::new());

        let early = inner.create(film("Early")).unwrap();
        let liker = users.create(user("u1")).unwrap().id;
        let store = Arc::new(LateArrivalStore {
            inner: Arc::clone(&inner),
            likes: Arc::clone(&likes),
            liker,
        });
        let service = RankingService::new(store, users, Arc::clone(&likes));

        let first = service.popular_films(10).unwrap();
        assert_eq!(first.iter().map(|f| f.id).collect::<Vec<_>>(), vec![early.id]);

        // The film that arrived during the first query ranks on the next one
        let second = service.popular_films(10).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].name, "Late 1");
        assert_eq!(second[1].id, early.id);
    }

    #[test]
    fn test_total_likes() {
        let (service, f, u) = create_test_service();
        service.add_like(f[0], u[0]).unwrap();
        service.add_like(f[1], u[0]).unwrap();
        service.add_like(f[1], u[1]).unwrap();
        assert_eq!(service.total_likes().unwrap(), 3);
    }

    #[test]
    fn test_likers() {
        let (service, f, u) = create_test_service();
        service.add_like(f[0], u[1]).unwrap();
        service.add_like(f[0], u[0]).unwrap();

        let logins: Vec<String> = service.likers(f[0]).unwrap().into_iter().map(|x| x.login).collect();
        assert_eq!(logins, vec!["u1", "u2"]);
    }
}
