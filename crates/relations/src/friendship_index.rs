//! Friendship Index - symmetric user-to-user relation
//!
//! Each friendship is stored in both directions. Both directions are written
//! under one write lock, so a reader sees either the whole edge or none of
//! it.
//!
//! ## Algorithm
//! - `friends_of(a)` is the adjacency set of `a`
//! - `common_friends(a, b)` intersects the two adjacency sets, iterating the
//!   smaller one
//!
//! A user may befriend themself; that is stored as a single self-edge.

use catalog::{CatalogError, Result, UserId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

type Adjacency = HashMap<UserId, HashSet<UserId>>;

/// Symmetric friendship edges, behind a single lock
#[derive(Debug, Default)]
pub struct FriendshipIndex {
    friends: RwLock<Adjacency>,
}

impl FriendshipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Adjacency>> {
        self.friends
            .read()
            .map_err(CatalogError::poisoned("friendship index"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Adjacency>> {
        self.friends
            .write()
            .map_err(CatalogError::poisoned("friendship index"))
    }

    /// Make `user_id` and `friend_id` friends of each other
    ///
    /// Returns `false` if they already were.
    pub fn add(&self, user_id: UserId, friend_id: UserId) -> Result<bool> {
        let mut friends = self.write()?;
        let forward = friends.entry(user_id).or_default().insert(friend_id);
        let backward = friends.entry(friend_id).or_default().insert(user_id);

        if forward != backward {
            // Only possible if the two directions had already drifted apart
            return Err(CatalogError::Internal(format!(
                "asymmetric friendship between {user_id} and {friend_id}"
            )));
        }
        if !forward {
            debug!(user_id, friend_id, "Friendship already present");
        }
        Ok(forward)
    }

    /// Remove the friendship in both directions
    ///
    /// Removing a friendship that isn't there is not an error: it returns
    /// `false` and logs a warning.
    pub fn remove(&self, user_id: UserId, friend_id: UserId) -> Result<bool> {
        let mut friends = self.write()?;
        let forward = detach(&mut friends, user_id, friend_id);
        let backward = detach(&mut friends, friend_id, user_id);

        let removed = forward || backward;
        if !removed {
            warn!(user_id, friend_id, "Tried to remove a friendship that does not exist");
        }
        Ok(removed)
    }

    /// Friends of `user_id`, in ascending id order
    pub fn friends_of(&self, user_id: UserId) -> Result<BTreeSet<UserId>> {
        Ok(self
            .read()?
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    /// Users who are friends of both `user_id` and `other_id`
    pub fn common_friends(&self, user_id: UserId, other_id: UserId) -> Result<BTreeSet<UserId>> {
        let friends = self.read()?;
        let (Some(left), Some(right)) = (friends.get(&user_id), friends.get(&other_id)) else {
            return Ok(BTreeSet::new());
        };

        let (smaller, larger) = if left.len() <= right.len() {
            (left, right)
        } else {
            (right, left)
        };
        Ok(smaller
            .iter()
            .filter(|id| larger.contains(*id))
            .copied()
            .collect())
    }

    /// Number of distinct friendships
    pub fn edge_count(&self) -> Result<usize> {
        let friends = self.read()?;
        let self_edges = friends
            .iter()
            .filter(|(id, set)| set.contains(*id))
            .count();
        let directed: usize = friends.values().map(HashSet::len).sum();
        Ok((directed - self_edges) / 2 + self_edges)
    }
}

/// Remove `to` from the adjacency set of `from`, pruning an emptied set
fn detach(friends: &mut Adjacency, from: UserId, to: UserId) -> bool {
    let Some(set) = friends.get_mut(&from) else {
        return false;
    };
    let removed = set.remove(&to);
    if set.is_empty() {
        friends.remove(&from);
    }
    removed
}
