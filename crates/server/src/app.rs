//! # Filmorate application facade
//!
//! The single entry point a request-handling layer talks to. It owns the
//! stores, the relation indexes and the services, and adds what sits in
//! front of the core:
//! 1. Validate film and user payloads before create/update
//! 2. Fill in the default page size for the popular-films query
//! 3. Log internal failures with full context
//! 4. Replay seed data into the stores and indexes
//!
//! Errors pass through with their kind intact; see [`crate::response`] for
//! the status mapping.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, instrument};

use catalog::parser::{FILMS_FILE, FRIENDS_FILE, LIKES_FILE, USERS_FILE};
use catalog::{
    reference, validation, CatalogError, EntityStore, ErrorKind, Film, FilmId, FilmStore, Genre,
    Mpa, Result, SeedData, User, UserId, UserStore,
};
use relations::{FriendshipIndex, LikeIndex};
use services::{RankingService, SocialService};

use crate::config::AppConfig;

/// Source of "today" for birthday validation
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Counts of records replayed from a seed directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub films: usize,
    pub users: usize,
    pub likes: usize,
    pub friendships: usize,
}

/// Main facade that coordinates stores, indexes and services
#[derive(Clone)]
pub struct Filmorate {
    config: AppConfig,
    films: Arc<FilmStore>,
    users: Arc<UserStore>,
    ranking: RankingService,
    social: SocialService,
    clock: Clock,
}

impl Filmorate {
    /// Create an empty application with the local date as its clock
    pub fn new(config: AppConfig) -> Self {
        Self::with_clock(config, Arc::new(|| Local::now().date_naive()))
    }

    /// Create an empty application with an injected clock
    pub fn with_clock(config: AppConfig, clock: Clock) -> Self {
        let films = Arc::new(FilmStore::new());
        let users = Arc::new(UserStore::new());
        let likes = Arc::new(LikeIndex::new());
        let friendships = Arc::new(FriendshipIndex::new());

        let ranking = RankingService::new(films.clone(), users.clone(), likes);
        let social = SocialService::new(users.clone(), friendships);

        Self {
            config,
            films,
            users,
            ranking,
            social,
            clock,
        }
    }

    /// Create an application and load the seed data from `config.data_dir`
    pub fn load(config: AppConfig) -> Result<Self> {
        let app = Self::new(config);
        let data_dir = app.config.data_dir.clone();
        app.load_seed(&data_dir)?;
        Ok(app)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // =========================================================================
    // Films
    // =========================================================================

    pub fn create_film(&self, film: Film) -> Result<Film> {
        observe("create film", || {
            validation::validate_film(&film)?;
            self.films.create(film)
        })
    }

    pub fn update_film(&self, film: Film) -> Result<Film> {
        observe("update film", || {
            validation::validate_film(&film)?;
            self.films.update(film)
        })
    }

    pub fn film(&self, id: FilmId) -> Result<Film> {
        observe("get film", || self.films.get(id))
    }

    pub fn films(&self) -> Result<Vec<Film>> {
        observe("list films", || self.films.list())
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn create_user(&self, user: User) -> Result<User> {
        observe("create user", || {
            validation::validate_user(&user, (self.clock)())?;
            self.users.create(user)
        })
    }

    pub fn update_user(&self, user: User) -> Result<User> {
        observe("update user", || {
            validation::validate_user(&user, (self.clock)())?;
            self.users.update(user)
        })
    }

    pub fn user(&self, id: UserId) -> Result<User> {
        observe("get user", || self.users.get(id))
    }

    pub fn users(&self) -> Result<Vec<User>> {
        observe("list users", || self.users.list())
    }

    // =========================================================================
    // Likes and ranking
    // =========================================================================

    pub fn add_like(&self, film_id: FilmId, user_id: UserId) -> Result<()> {
        observe("add like", || self.ranking.add_like(film_id, user_id))
    }

    pub fn remove_like(&self, film_id: FilmId, user_id: UserId) -> Result<()> {
        observe("remove like", || self.ranking.remove_like(film_id, user_id))
    }

    pub fn likes_for(&self, film_id: FilmId) -> Result<usize> {
        observe("count likes", || self.ranking.likes_for(film_id))
    }

    pub fn likers(&self, film_id: FilmId) -> Result<Vec<User>> {
        observe("list likers", || self.ranking.likers(film_id))
    }

    /// Most liked films; `None` means the configured default count
    pub fn popular_films(&self, count: Option<usize>) -> Result<Vec<Film>> {
        let count = count.unwrap_or(self.config.default_popular_count);
        observe("popular films", || self.ranking.popular_films(count))
    }

    // =========================================================================
    // Friendships
    // =========================================================================

    pub fn add_friend(&self, user_id: UserId, friend_id: UserId) -> Result<()> {
        observe("add friend", || self.social.add_friend(user_id, friend_id))
    }

    pub fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> Result<()> {
        observe("remove friend", || self.social.remove_friend(user_id, friend_id))
    }

    pub fn friends_of(&self, user_id: UserId) -> Result<Vec<User>> {
        observe("list friends", || self.social.friends_of(user_id))
    }

    pub fn common_friends(&self, user_id: UserId, other_id: UserId) -> Result<Vec<User>> {
        observe("common friends", || self.social.common_friends(user_id, other_id))
    }

    // =========================================================================
    // Reference data
    // =========================================================================

    pub fn mpa(&self, id: u32) -> Result<Mpa> {
        observe("get MPA rating", || reference::mpa_by_id(id))
    }

    pub fn all_mpa(&self) -> Vec<Mpa> {
        reference::all_mpa()
    }

    pub fn genre(&self, id: u32) -> Result<Genre> {
        observe("get genre", || reference::genre_by_id(id))
    }

    pub fn all_genres(&self) -> Vec<Genre> {
        reference::all_genres()
    }

    // =========================================================================
    // Seed data
    // =========================================================================

    /// Parse a seed directory and replay it through the normal operations
    ///
    /// Entities go through validation and uniqueness checks like any other
    /// payload. Ids in the seed files are mapped onto the ids the stores
    /// assign, so an id may appear only once per entity file.
    #[instrument(skip(self))]
    pub fn load_seed(&self, data_dir: &Path) -> Result<SeedSummary> {
        let start_time = Instant::now();
        let seed = SeedData::load_from_dir(data_dir)?;
        let mut summary = SeedSummary::default();

        let mut film_ids: HashMap<FilmId, FilmId> = HashMap::new();
        for film in seed.films {
            let seed_id = film.id;
            let created = self.create_film(film)?;
            claim_seed_id(&mut film_ids, seed_id, created.id, FILMS_FILE)?;
            summary.films += 1;
        }

        let mut user_ids: HashMap<UserId, UserId> = HashMap::new();
        for user in seed.users {
            let seed_id = user.id;
            let created = self.create_user(user)?;
            claim_seed_id(&mut user_ids, seed_id, created.id, USERS_FILE)?;
            summary.users += 1;
        }

        for (film_id, user_id) in seed.likes {
            let film_id = resolve_seed_id(&film_ids, film_id, LIKES_FILE, "film")?;
            let user_id = resolve_seed_id(&user_ids, user_id, LIKES_FILE, "user")?;
            self.add_like(film_id, user_id)?;
            summary.likes += 1;
        }

        for (user_id, friend_id) in seed.friendships {
            let user_id = resolve_seed_id(&user_ids, user_id, FRIENDS_FILE, "user")?;
            let friend_id = resolve_seed_id(&user_ids, friend_id, FRIENDS_FILE, "user")?;
            self.add_friend(user_id, friend_id)?;
            summary.friendships += 1;
        }

        info!(
            "Seeded {} films, {} users, {} likes, {} friendships in {:.2?}",
            summary.films,
            summary.users,
            summary.likes,
            summary.friendships,
            start_time.elapsed()
        );
        debug!(
            "Indexes hold {} likes and {} friendships after seeding",
            self.ranking.total_likes()?,
            self.social.friendship_count()?
        );
        Ok(summary)
    }
}

/// Record the store id for a seed id, rejecting a seed id seen before
fn claim_seed_id(
    ids: &mut HashMap<u64, u64>,
    seed_id: u64,
    assigned: u64,
    file: &str,
) -> Result<()> {
    if ids.insert(seed_id, assigned).is_some() {
        return Err(CatalogError::Internal(format!(
            "{file} repeats id {seed_id}"
        )));
    }
    Ok(())
}

/// Translate a seed-file id into the id the store assigned
fn resolve_seed_id(ids: &HashMap<u64, u64>, seed_id: u64, file: &str, what: &str) -> Result<u64> {
    ids.get(&seed_id).copied().ok_or_else(|| {
        CatalogError::Internal(format!("{file} references unknown {what} {seed_id}"))
    })
}

/// Run one operation, logging its failure at the level its kind deserves
fn observe<T>(operation: &str, run: impl FnOnce() -> Result<T>) -> Result<T> {
    let result = run();
    if let Err(err) = &result {
        match err.kind() {
            ErrorKind::Internal => error!(operation, error = ?err, "Operation failed: {}", err),
            _ => debug!(operation, "Operation rejected: {}", err),
        }
    }
    result
}
