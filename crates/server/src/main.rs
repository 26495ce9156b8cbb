//! Simple test harness for the Filmorate facade.
//!
//! This binary loads the bundled seed data, fires a burst of concurrent like
//! and ranking requests at one shared instance, and logs the final ranking.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use server::{AppConfig, ErrorResponse, Filmorate};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,server=debug,services=debug")
            }),
        )
        .init();

    info!("Starting Filmorate test harness");

    let config = AppConfig::default();
    info!("Loading seed data from {:?}...", config.data_dir);
    let app = Arc::new(Filmorate::load(config).context("Failed to load seed data")?);

    let films = app.films()?;
    let users = app.users()?;
    info!("Loaded {} films and {} users", films.len(), users.len());

    // Every user likes every film whose position divides theirs, all at once
    let start_time = Instant::now();
    let mut handles = Vec::new();
    for (user_pos, user) in users.iter().enumerate() {
        for (film_pos, film) in films.iter().enumerate() {
            if (user_pos + 1) % (film_pos + 1) != 0 {
                continue;
            }
            let app = Arc::clone(&app);
            let (film_id, user_id) = (film.id, user.id);
            handles.push(tokio::task::spawn_blocking(move || {
                app.add_like(film_id, user_id)?;
                app.popular_films(None)
            }));
        }
    }

    let requests = handles.len();
    for handle in handles {
        let popular = handle.await.context("Request task panicked")??;
        if popular.is_empty() && !films.is_empty() {
            warn!("Ranking came back empty mid-run");
        }
    }
    info!("Served {} requests in {:.2?}", requests, start_time.elapsed());

    // A request that fails the way a client error would
    if let Err(err) = app.add_like(u64::MAX, 1) {
        let response = ErrorResponse::from_error(&err);
        info!("Unknown film -> {} {}", response.status, response.body.error);
    }

    let popular = app.popular_films(None)?;
    info!(
        "Top {} films (default count {}):",
        popular.len(),
        app.config().default_popular_count
    );
    for (rank, film) in popular.iter().enumerate() {
        info!(
            "{}. {} ({}) - {} likes",
            rank + 1,
            film.name,
            film.release_date.format("%Y"),
            app.likes_for(film.id)?
        );
    }

    Ok(())
}
