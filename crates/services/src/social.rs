//! Social Service - friendships between users
//!
//! Thin layer over the [`FriendshipIndex`]: it checks that users exist,
//! delegates to the index, then turns ids back into full user records.

use catalog::{CatalogError, EntityKind, EntityStore, Result, User, UserId};
use relations::FriendshipIndex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};

/// Friend lists and mutual friends over the user store
#[derive(Clone)]
pub struct SocialService {
    users: Arc<dyn EntityStore<User>>,
    friendships: Arc<FriendshipIndex>,
}

impl SocialService {
    pub fn new(users: Arc<dyn EntityStore<User>>, friendships: Arc<FriendshipIndex>) -> Self {
        Self { users, friendships }
    }

    fn ensure_user(&self, user_id: UserId) -> Result<()> {
        if self.users.contains(user_id)? {
            Ok(())
        } else {
            Err(CatalogError::not_found(EntityKind::User, user_id))
        }
    }

    fn materialize(&self, ids: BTreeSet<UserId>) -> Result<Vec<User>> {
        ids.into_iter().map(|id| self.users.get(id)).collect()
    }

    /// Make two existing users friends of each other
    #[instrument(skip(self))]
    pub fn add_friend(&self, user_id: UserId, friend_id: UserId) -> Result<()> {
        self.ensure_user(user_id)?;
        self.ensure_user(friend_id)?;
        if self.friendships.add(user_id, friend_id)? {
            info!("Users {} and {} are now friends", user_id, friend_id);
        }
        Ok(())
    }

    /// End a friendship; ending one that doesn't exist is a logged no-op
    #[instrument(skip(self))]
    pub fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> Result<()> {
        self.ensure_user(user_id)?;
        self.ensure_user(friend_id)?;
        if self.friendships.remove(user_id, friend_id)? {
            info!("Users {} and {} are no longer friends", user_id, friend_id);
        }
        Ok(())
    }

    /// Friends of an existing user, in ascending id order
    pub fn friends_of(&self, user_id: UserId) -> Result<Vec<User>> {
        self.ensure_user(user_id)?;
        let ids = self.friendships.friends_of(user_id)?;
        self.materialize(ids)
    }

    /// Users who are friends with both existing users, in ascending id order
    pub fn common_friends(&self, user_id: UserId, other_id: UserId) -> Result<Vec<User>> {
        self.ensure_user(user_id)?;
        self.ensure_user(other_id)?;
        let ids = self.friendships.common_friends(user_id, other_id)?;
        self.materialize(ids)
    }

    /// Number of distinct friendships
    pub fn friendship_count(&self) -> Result<usize> {
        self.friendships.edge_count()
    }
}
