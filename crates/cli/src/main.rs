use anyhow::{anyhow, Context, Result};
use catalog::{CatalogError, Film, FilmId, User, UserId};
use clap::{Parser, Subcommand};
use colored::Colorize;
use server::{AppConfig, ErrorResponse, Filmorate};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Filmorate - films, likes and friendships
#[derive(Parser)]
#[command(name = "filmorate")]
#[command(about = "Browse a film catalog ranked by likes, and who is friends with whom", long_about = None)]
struct Cli {
    /// Path to the seed data directory
    #[arg(short, long, env = "FILMORATE_DATA_DIR", default_value = server::config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Print results as JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the most liked films
    Popular {
        /// Number of films to show (defaults to 10)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show one film
    Film {
        #[arg(long)]
        id: FilmId,
    },

    /// List every film
    Films,

    /// Show one user and their friends
    User {
        #[arg(long)]
        id: UserId,
    },

    /// List every user
    Users,

    /// List a user's friends
    Friends {
        #[arg(long)]
        user_id: UserId,
    },

    /// List the friends two users have in common
    Common {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        other_id: UserId,
    },

    /// Search for films by title
    Search {
        /// Title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// List the genre reference set
    Genres,

    /// List the MPA rating reference set
    Mpa,

    /// Hammer one instance with concurrent like and ranking requests
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "1000")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let start = Instant::now();
    let config = AppConfig::default().with_data_dir(&cli.data_dir);
    let app = Arc::new(
        Filmorate::load(config)
            .with_context(|| format!("Failed to load seed data from {}", cli.data_dir.display()))?,
    );
    debug!("Loaded seed data in {:?}", start.elapsed());

    let outcome = run(app, cli.command, cli.json).await;

    // Client errors read like the status a server would send
    outcome.map_err(|err| match err.downcast_ref::<CatalogError>() {
        Some(catalog_err) => {
            let response = ErrorResponse::from_error(catalog_err);
            anyhow!("[{}] {}", response.status, response.body.error)
        }
        None => err,
    })
}

/// Dispatch to the appropriate command handler
async fn run(app: Arc<Filmorate>, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Popular { count } => handle_popular(&app, count, json),
        Commands::Film { id } => handle_film(&app, id, json),
        Commands::Films => print_films(&app.films()?, json),
        Commands::User { id } => handle_user(&app, id, json),
        Commands::Users => print_users(&app.users()?, json),
        Commands::Friends { user_id } => print_users(&app.friends_of(user_id)?, json),
        Commands::Common { user_id, other_id } => {
            print_users(&app.common_friends(user_id, other_id)?, json)
        }
        Commands::Search { title } => handle_search(&app, &title, json),
        Commands::Genres => handle_genres(&app, json),
        Commands::Mpa => handle_mpa(&app, json),
        Commands::Benchmark { requests } => handle_benchmark(app, requests).await,
    }
}

/// Handle the 'popular' command
fn handle_popular(app: &Filmorate, count: Option<usize>, json: bool) -> Result<()> {
    let films = app.popular_films(count)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&films)?);
        return Ok(());
    }

    println!("{}", "Popular films:".bold().blue());
    for (rank, film) in films.iter().enumerate() {
        println!(
            "{}. {} ({}) - {} likes",
            (rank + 1).to_string().green(),
            film.name,
            film.release_date.format("%Y"),
            app.likes_for(film.id)?
        );
    }
    Ok(())
}

/// Handle the 'film' command
fn handle_film(app: &Filmorate, id: FilmId, json: bool) -> Result<()> {
    let film = app.film(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&film)?);
        return Ok(());
    }

    println!("{}", format!("Film #{}: {}", film.id, film.name).bold().blue());
    println!("{}{}", "• ".green(), film.description);
    println!("{}Released: {}", "• ".green(), film.release_date);
    println!("{}Duration: {} min", "• ".green(), film.duration);
    println!("{}Rating: {}", "• ".green(), film.mpa);
    println!("{}Genres: {}", "• ".green(), genre_list(&film));
    println!("{}Likes: {}", "• ".cyan(), app.likes_for(film.id)?);

    let likers = app.likers(film.id)?;
    if !likers.is_empty() {
        println!("Liked by:");
        for user in likers {
            println!("  - {} ({})", user.name, user.login);
        }
    }
    Ok(())
}

/// Handle the 'user' command
fn handle_user(app: &Filmorate, id: UserId, json: bool) -> Result<()> {
    let user = app.user(id)?;
    let friends = app.friends_of(id)?;
    if json {
        let value = serde_json::json!({ "user": user, "friends": friends });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", format!("User #{}: {}", user.id, user.name).bold().blue());
    println!("{}Login: {}", "• ".green(), user.login);
    println!("{}Email: {}", "• ".green(), user.email);
    println!("{}Birthday: {}", "• ".green(), user.birthday);
    println!("{}Friends: {}", "• ".cyan(), friends.len());
    for friend in friends {
        println!("  - {} ({})", friend.name, friend.login);
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(app: &Filmorate, title: &str, json: bool) -> Result<()> {
    let title_lower = title.to_lowercase();

    // Exact matches rank ahead of substring matches, then by likes
    let mut matches: Vec<(u8, usize, Film)> = Vec::new();
    for film in app.films()? {
        let name_lower = film.name.to_lowercase();
        let relevance = if name_lower == title_lower {
            0
        } else if name_lower.contains(&title_lower) {
            1
        } else {
            continue;
        };
        let likes = app.likes_for(film.id)?;
        matches.push((relevance, likes, film));
    }
    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));

    let films: Vec<Film> = matches.into_iter().take(20).map(|(_, _, film)| film).collect();
    if !json {
        println!("{}", format!("Search results for '{}':", title).bold().blue());
    }
    print_films(&films, json)
}

/// Handle the 'genres' command
fn handle_genres(app: &Filmorate, json: bool) -> Result<()> {
    let genres = app.all_genres();
    if json {
        println!("{}", serde_json::to_string_pretty(&genres)?);
    } else {
        for genre in genres {
            println!("{}: {}", genre.id(), genre);
        }
    }
    Ok(())
}

/// Handle the 'mpa' command
fn handle_mpa(app: &Filmorate, json: bool) -> Result<()> {
    let ratings = app.all_mpa();
    if json {
        println!("{}", serde_json::to_string_pretty(&ratings)?);
    } else {
        for mpa in ratings {
            println!("{}: {}", mpa.id(), mpa);
        }
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(app: Arc<Filmorate>, requests: usize) -> Result<()> {
    let film_ids: Vec<FilmId> = app.films()?.into_iter().map(|f| f.id).collect();
    let user_ids: Vec<UserId> = app.users()?.into_iter().map(|u| u.id).collect();
    if film_ids.is_empty() || user_ids.is_empty() || requests == 0 {
        return Err(anyhow!("Benchmark needs at least one film, one user and one request"));
    }

    // Random (film, user) pairs from the loaded catalog
    let pairs: Vec<(FilmId, UserId)> = (0..requests)
        .map(|_| {
            let film = film_ids[rand::random::<u64>() as usize % film_ids.len()];
            let user = user_ids[rand::random::<u64>() as usize % user_ids.len()];
            (film, user)
        })
        .collect();

    // Each request toggles a like, then reads the ranking
    let wall_clock = Instant::now();
    let mut handles = vec![];
    for (film_id, user_id) in pairs {
        let app = app.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            if rand::random::<bool>() {
                app.add_like(film_id, user_id)?;
            } else {
                app.remove_like(film_id, user_id)?;
            }
            app.popular_films(None)?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    let wall_time = wall_clock.elapsed();

    timings.sort();
    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / (timings.len() as u32);
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / wall_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn genre_list(film: &Film) -> String {
    film.genres
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_films(films: &[Film], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(films)?);
        return Ok(());
    }
    for film in films {
        println!(
            "{}: {} ({}) [{}] {}",
            film.id.to_string().green(),
            film.name,
            film.release_date.format("%Y"),
            genre_list(film),
            film.mpa
        );
    }
    Ok(())
}

fn print_users(users: &[User], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(users)?);
        return Ok(());
    }
    for user in users {
        println!(
            "{}: {} ({}) <{}>",
            user.id.to_string().green(),
            user.name,
            user.login,
            user.email
        );
    }
    Ok(())
}
