//! # Relations Crate
//!
//! The two relationship structures kept over catalog entities.
//!
//! ### Like Index
//! Film -> users who liked it. Adding is idempotent, removing a missing like
//! is a logged no-op. Answers like counts and the top-N popularity query.
//!
//! ### Friendship Index
//! Symmetric user <-> user edges. Answers friend lists and common-friend
//! intersections.
//!
//! Both indexes own their state behind an `RwLock` and never look at the
//! entity store: callers check that both endpoints exist before mutating.
//!
//! ## Example Usage
//!
//! ```ignore
//! use relations::{FriendshipIndex, LikeIndex};
//!
//! let likes = LikeIndex::new();
//! likes.add(film_id, user_id)?;
//! let top = likes.top_films(10, all_film_ids)?;
//!
//! let friends = FriendshipIndex::new();
//! friends.add(alice, bob)?;
//! let mutual = friends.common_friends(alice, carol)?;
//! ```

pub mod like_index;
pub mod friendship_index;

pub use friendship_index::FriendshipIndex;
pub use like_index::LikeIndex;
