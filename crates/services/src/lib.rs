//! Services that compose the catalog stores with the relation indexes.
//!
//! This crate provides:
//! - RankingService: likes and the popular-films query
//! - SocialService: friendships, friend lists and common friends
//!
//! ## Architecture
//! Each request flows the same way:
//! 1. Resolve every referenced id through the entity store (NotFound otherwise)
//! 2. Mutate or query the relation index
//! 3. Map ids back to full records through the entity store
//!
//! ## Example Usage
//! ```ignore
//! use services::{RankingService, SocialService};
//!
//! let ranking = RankingService::new(films.clone(), users.clone(), likes.clone());
//! ranking.add_like(film_id, user_id)?;
//! let top = ranking.popular_films(10)?;
//!
//! let social = SocialService::new(users.clone(), friendships.clone());
//! let mutual = social.common_friends(alice, bob)?;
//! ```

pub mod ranking;
pub mod social;

// Re-export main types
pub use ranking::RankingService;
pub use social::SocialService;
