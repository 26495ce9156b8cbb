//! Like Index - which users liked which films
//!
//! Maps a film id to the set of users who liked it. A film with no likes has
//! no entry at all, so "empty set" and "absent" are the same state.
//!
//! ## Ranking
//! `top_films` ranks within a caller-supplied universe of film ids. Liked
//! films come first by descending like count, ties to the lower film id,
//! which is the film created first. The ranked prefix is then padded with
//! the universe's unliked films in the universe's own order.

use catalog::{CatalogError, FilmId, Result, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Likes keyed by film, behind a single lock
#[derive(Debug, Default)]
pub struct LikeIndex {
    likes: RwLock<HashMap<FilmId, HashSet<UserId>>>,
}

impl LikeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<FilmId, HashSet<UserId>>>> {
        self.likes.read().map_err(CatalogError::poisoned("like index"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<FilmId, HashSet<UserId>>>> {
        self.likes.write().map_err(CatalogError::poisoned("like index"))
    }

    /// Record that `user_id` likes `film_id`
    ///
    /// Returns `false` if the like was already there.
    pub fn add(&self, film_id: FilmId, user_id: UserId) -> Result<bool> {
        let inserted = self.write()?.entry(film_id).or_default().insert(user_id);
        if !inserted {
            debug!(film_id, user_id, "Like already present");
        }
        Ok(inserted)
    }

    /// Drop a like
    ///
    /// Removing a like that isn't there is not an error: it returns `false`
    /// and logs a warning.
    pub fn remove(&self, film_id: FilmId, user_id: UserId) -> Result<bool> {
        let mut likes = self.write()?;
        let removed = match likes.get_mut(&film_id) {
            Some(users) => {
                let removed = users.remove(&user_id);
                if users.is_empty() {
                    likes.remove(&film_id);
                }
                removed
            }
            None => false,
        };
        if !removed {
            warn!(film_id, user_id, "Tried to remove a like that does not exist");
        }
        Ok(removed)
    }

    /// Number of users who liked `film_id`
    pub fn count(&self, film_id: FilmId) -> Result<usize> {
        Ok(self.read()?.get(&film_id).map_or(0, HashSet::len))
    }

    /// Users who liked `film_id`, in ascending id order
    pub fn likers(&self, film_id: FilmId) -> Result<Vec<UserId>> {
        let mut users: Vec<UserId> = self
            .read()?
            .get(&film_id)
            .map(|users| users.iter().copied().collect())
            .unwrap_or_default();
        users.sort_unstable();
        Ok(users)
    }

    /// Total number of likes across all films
    pub fn total(&self) -> Result<usize> {
        Ok(self.read()?.values().map(HashSet::len).sum())
    }

    /// Up to `limit` film ids from `universe`, most liked first
    ///
    /// Likes on films outside `universe` are ignored, so the result only
    /// names films the caller already holds. Liked films come first, by
    /// descending count with ties to the lower id. If fewer than `limit`
    /// films have likes, the rest is filled from `universe` in its own
    /// order. A `limit` of zero yields nothing.
    pub fn top_films<I>(&self, limit: usize, universe: I) -> Result<Vec<FilmId>>
    where
        I: IntoIterator<Item = FilmId>,
    {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let universe: Vec<FilmId> = universe.into_iter().collect();
        let known: HashSet<FilmId> = universe.iter().copied().collect();

        // Snapshot the counts under one read lock
        let mut ranked: Vec<(FilmId, usize)> = self
            .read()?
            .iter()
            .filter(|(film_id, users)| !users.is_empty() && known.contains(*film_id))
            .map(|(&film_id, users)| (film_id, users.len()))
            .collect();

        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);

        let mut result: Vec<FilmId> = ranked.into_iter().map(|(film_id, _)| film_id).collect();
        if result.len() < limit {
            let mut seen: HashSet<FilmId> = result.iter().copied().collect();
            for film_id in universe {
                if result.len() == limit {
                    break;
                }
                if seen.insert(film_id) {
                    result.push(film_id);
                }
            }
        }

        debug!("Ranked {} films (limit {})", result.len(), limit);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let index = LikeIndex::new();
        assert!(index.add(1, 10).unwrap());
        assert_eq!(index.count(1).unwrap(), 1);

        assert!(!index.add(1, 10).unwrap());
        assert_eq!(index.count(1).unwrap(), 1);

        assert!(index.add(1, 11).unwrap());
        assert_eq!(index.count(1).unwrap(), 2);
    }

    #[test]
    fn test_remove_missing_like_is_noop() {
        let index = LikeIndex::new();
        assert!(!index.remove(1, 10).unwrap());

        index.add(1, 10).unwrap();
        assert!(!index.remove(1, 99).unwrap());
        assert_eq!(index.count(1).unwrap(), 1);
    }

    #[test]
    fn test_remove_last_like_prunes_entry() {
        let index = LikeIndex::new();
        index.add(4, 1).unwrap();
        assert!(index.remove(4, 1).unwrap());

        assert_eq!(index.count(4).unwrap(), 0);
        assert!(index.likers(4).unwrap().is_empty());
        assert_eq!(index.top_films(5, Vec::new()).unwrap(), Vec::<FilmId>::new());
    }

    #[test]
    fn test_top_films_descending_with_padding() {
        let index = LikeIndex::new();
        // film 2: two likes, film 3: one like, film 1: none
        index.add(2, 1).unwrap();
        index.add(2, 2).unwrap();
        index.add(3, 1).unwrap();

        assert_eq!(index.top_films(3, [1, 2, 3]).unwrap(), vec![2, 3, 1]);
        assert_eq!(index.top_films(2, [1, 2, 3]).unwrap(), vec![2, 3]);
        assert_eq!(index.top_films(10, [1, 2, 3]).unwrap(), vec![2, 3, 1]);
    }

    #[test]
    fn test_top_films_ties_go_to_earlier_film() {
        let index = LikeIndex::new();
        for film_id in [7, 3, 5] {
            index.add(film_id, 1).unwrap();
        }
        assert_eq!(index.top_films(3, [5, 7, 3]).unwrap(), vec![3, 5, 7]);
    }

    #[test]
    fn test_top_films_ignores_films_outside_universe() {
        let index = LikeIndex::new();
        index.add(1, 10).unwrap();
        // Film 9 was liked but the caller's listing predates it
        index.add(9, 10).unwrap();
        index.add(9, 11).unwrap();

        assert_eq!(index.top_films(5, [1, 2]).unwrap(), vec![1, 2]);
        assert!(index.top_films(5, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_top_films_zero_limit() {
        let index = LikeIndex::new();
        index.add(1, 1).unwrap();
        assert!(index.top_films(0, [1, 2]).unwrap().is_empty());
    }

    #[test]
    fn test_likers_and_total() {
        let index = LikeIndex::new();
        index.add(1, 30).unwrap();
        index.add(1, 10).unwrap();
        index.add(2, 10).unwrap();

        assert_eq!(index.likers(1).unwrap(), vec![10, 30]);
        assert_eq!(index.likers(2).unwrap(), vec![10]);
        assert_eq!(index.total().unwrap(), 3);
    }
}
