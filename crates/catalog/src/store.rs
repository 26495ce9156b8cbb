//! The entity store: keyed film and user records with identity and
//! uniqueness invariants.
//!
//! [`EntityStore`] is the one storage contract the rest of the system sees.
//! Lookups by id come back as `Result<Option<E>>` from [`EntityStore::find`],
//! or as `NotFound` from [`EntityStore::get`]; nothing returns a half-filled
//! record.
//!
//! [`InMemoryStore`] keeps records in a `BTreeMap` keyed by id. Ids are
//! handed out by an [`IdAllocator`] in increasing order, so iteration order is
//! creation order.

use crate::error::{CatalogError, EntityKind, Result};
use crate::types::{Film, FilmId, User, UserId};
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

// =============================================================================
// Entity trait
// =============================================================================

/// A record the store can hold.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> u64;

    fn assign_id(&mut self, id: u64);

    /// Fields that must be unique across the store, as `(field, value)` pairs
    fn unique_keys(&self) -> Vec<(&'static str, String)>;

    /// Normalise a freshly submitted record; runs once, on create only.
    fn on_create(&mut self) {}
}

impl Entity for Film {
    const KIND: EntityKind = EntityKind::Film;

    fn id(&self) -> FilmId {
        self.id
    }

    fn assign_id(&mut self, id: FilmId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> UserId {
        self.id
    }

    fn assign_id(&mut self, id: UserId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone()), ("login", self.login.clone())]
    }

    fn on_create(&mut self) {
        if self.name.trim().is_empty() {
            debug!(login = %self.login, "Blank display name, falling back to login");
            self.name = self.login.clone();
        }
    }
}

// =============================================================================
// Id allocation
// =============================================================================

/// Hands out identifiers for newly created records
pub trait IdAllocator: Send + Sync {
    /// Next unused id; never returns the same value twice
    fn next_id(&self) -> u64;
}

/// Monotonic counter starting at 1
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

// =============================================================================
// Storage contract
// =============================================================================

/// Create/update/read/list over one kind of entity
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Store a new record and return it with its assigned id
    ///
    /// Fails with `AlreadyExists` if any unique key is taken. The incoming
    /// id is ignored.
    fn create(&self, entity: E) -> Result<E>;

    /// Replace the record with the same id
    ///
    /// Fails with `NotFound` for an unknown id, and with `AlreadyExists` if
    /// the new values collide with a different record's unique key.
    fn update(&self, entity: E) -> Result<E>;

    /// Look up a record by id
    fn find(&self, id: u64) -> Result<Option<E>>;

    /// All records in creation order
    fn list(&self) -> Result<Vec<E>>;

    /// Number of stored records
    fn len(&self) -> Result<usize>;

    /// Look up a record that must exist
    fn get(&self, id: u64) -> Result<E> {
        self.find(id)?
            .ok_or_else(|| CatalogError::not_found(E::KIND, id))
    }

    fn contains(&self, id: u64) -> Result<bool> {
        Ok(self.find(id)?.is_some())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Process-memory implementation of [`EntityStore`]
pub struct InMemoryStore<E: Entity> {
    records: RwLock<BTreeMap<u64, E>>,
    ids: Box<dyn IdAllocator>,
}

/// Film store used by the application
pub type FilmStore = InMemoryStore<Film>;

/// User store used by the application
pub type UserStore = InMemoryStore<User>;

impl<E: Entity> InMemoryStore<E> {
    /// Create an empty store with ids starting at 1
    pub fn new() -> Self {
        Self::with_allocator(Box::new(SequentialIds::new()))
    }

    /// Create an empty store drawing ids from `ids`
    pub fn with_allocator(ids: Box<dyn IdAllocator>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            ids,
        }
    }

    /// First unique key of `candidate` already used by a record other than `skip_id`
    fn find_conflict(
        records: &BTreeMap<u64, E>,
        candidate: &E,
        skip_id: Option<u64>,
    ) -> Option<(&'static str, String)> {
        let wanted = candidate.unique_keys();
        records
            .values()
            .filter(|existing| Some(existing.id()) != skip_id)
            .find_map(|existing| {
                let taken = existing.unique_keys();
                wanted
                    .iter()
                    .find(|key| taken.contains(*key))
                    .cloned()
            })
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> std::fmt::Debug for InMemoryStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.records.read().map(|r| r.len()).unwrap_or_default();
        f.debug_struct("InMemoryStore")
            .field("kind", &E::KIND)
            .field("records", &count)
            .finish()
    }
}

impl<E: Entity> EntityStore<E> for InMemoryStore<E> {
    fn create(&self, mut entity: E) -> Result<E> {
        let mut records = self
            .records
            .write()
            .map_err(CatalogError::poisoned("entity store"))?;

        if let Some((field, value)) = Self::find_conflict(&records, &entity, None) {
            debug!(kind = %E::KIND, field, %value, "Rejected duplicate on create");
            return Err(CatalogError::AlreadyExists {
                entity: E::KIND,
                field,
                value,
            });
        }

        entity.on_create();
        let id = self.ids.next_id();
        entity.assign_id(id);
        if records.insert(id, entity.clone()).is_some() {
            return Err(CatalogError::Internal(format!(
                "id allocator reissued {} id {}",
                E::KIND,
                id
            )));
        }

        info!(kind = %E::KIND, id, "Created record");
        Ok(entity)
    }

    fn update(&self, entity: E) -> Result<E> {
        let mut records = self
            .records
            .write()
            .map_err(CatalogError::poisoned("entity store"))?;

        let id = entity.id();
        if !records.contains_key(&id) {
            debug!(kind = %E::KIND, id, "Rejected update of unknown record");
            return Err(CatalogError::not_found(E::KIND, id));
        }
        if let Some((field, value)) = Self::find_conflict(&records, &entity, Some(id)) {
            return Err(CatalogError::AlreadyExists {
                entity: E::KIND,
                field,
                value,
            });
        }

        records.insert(id, entity.clone());
        info!(kind = %E::KIND, id, "Updated record");
        Ok(entity)
    }

    fn find(&self, id: u64) -> Result<Option<E>> {
        let records = self
            .records
            .read()
            .map_err(CatalogError::poisoned("entity store"))?;
        Ok(records.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<E>> {
        let records = self
            .records
            .read()
            .map_err(CatalogError::poisoned("entity store"))?;
        Ok(records.values().cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(CatalogError::poisoned("entity store"))?;
        Ok(records.len())
    }

    fn contains(&self, id: u64) -> Result<bool> {
        let records = self
            .records
            .read()
            .map_err(CatalogError::poisoned("entity store"))?;
        Ok(records.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{Genre, Mpa};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn film(name: &str) -> Film {
        Film {
            id: 0,
            name: name.to_string(),
            description: "description".to_string(),
            release_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            duration: 100,
            mpa: Mpa::G,
            genres: BTreeSet::from([Genre::Drama]),
        }
    }

    fn user(login: &str, name: &str) -> User {
        User {
            id: 0,
            email: format!("{login}@example.com"),
            login: login.to_string(),
            name: name.to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = FilmStore::new();
        let first = store.create(film("Alien")).unwrap();
        let second = store.create(film("Aliens")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_create_ignores_incoming_id() {
        let store = FilmStore::new();
        let mut payload = film("Heat");
        payload.id = 77;
        assert_eq!(store.create(payload).unwrap().id, 1);
        assert!(store.find(77).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_film_title() {
        let store = FilmStore::new();
        store.create(film("Alien")).unwrap();

        let err = store.create(film("Alien")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        // Rejected before an id is allocated
        assert_eq!(store.create(film("Aliens")).unwrap().id, 2);
    }

    #[test]
    fn test_duplicate_user_email_or_login() {
        let store = UserStore::new();
        store.create(user("neo", "Thomas")).unwrap();

        let mut same_login = user("neo", "Other");
        same_login.email = "other@example.com".to_string();
        let err = store.create(same_login).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { field: "login", .. }));

        let mut same_email = user("trinity", "Trinity");
        same_email.email = "neo@example.com".to_string();
        let err = store.create(same_email).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { field: "email", .. }));
    }

    #[test]
    fn test_blank_name_defaults_to_login_once() {
        let store = UserStore::new();
        let created = store.create(user("morpheus", "")).unwrap();
        assert_eq!(created.name, "morpheus");

        let mut renamed = created.clone();
        renamed.name = String::new();
        let updated = store.update(renamed).unwrap();
        assert_eq!(updated.name, "");
        assert_eq!(store.get(created.id).unwrap().name, "");
    }

    #[test]
    fn test_update_unknown_id() {
        let store = FilmStore::new();
        let mut ghost = film("Ghost");
        ghost.id = 9;
        let err = store.update(ghost).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_keeps_own_keys_but_rejects_foreign_ones() {
        let store = FilmStore::new();
        let alien = store.create(film("Alien")).unwrap();
        store.create(film("Aliens")).unwrap();

        let mut retitled = alien.clone();
        retitled.duration = 117;
        assert_eq!(store.update(retitled).unwrap().duration, 117);

        let mut clash = alien;
        clash.name = "Aliens".to_string();
        assert_eq!(store.update(clash).unwrap_err().kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let store = UserStore::new();
        assert!(store.find(5).unwrap().is_none());
        assert!(!store.contains(5).unwrap());
        let err = store.get(5).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: EntityKind::User, id: 5 }));
    }

    #[test]
    fn test_list_in_creation_order() {
        let store = FilmStore::new();
        for name in ["C", "A", "B"] {
            store.create(film(name)).unwrap();
        }
        let names: Vec<String> = store.list().unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_injected_allocator() {
        let store = UserStore::with_allocator(Box::new(SequentialIds::starting_at(100)));
        assert_eq!(store.create(user("a", "")).unwrap().id, 100);
        assert_eq!(store.create(user("b", "")).unwrap().id, 101);
    }
}
