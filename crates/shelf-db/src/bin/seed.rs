//! # Seed Data Generator
//!
//! Populates the database with a small demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./shelf.db (or $DATABASE_PATH)
//! cargo run -p shelf-db --bin seed
//!
//! # Specify database path
//! cargo run -p shelf-db --bin seed -- --db ./data/shelf.db
//! ```
//!
//! ## Generated Data
//! - One category per entry in [`CATALOG`], with its books
//! - Demo readers whose accounts cannot log in (unusable password)
//! - A few reviews per book, so ratings are non-trivial

use std::env;
use std::time::Instant;

use anyhow::Context;
use shelf_core::{Category, NewBook, NewReview};
use shelf_db::repository::user::UNUSABLE_PASSWORD;
use shelf_db::migrations::migration_status;
use shelf_db::{BookFilter, Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Categories as (slug, title, books), books as (title, author).
const CATALOG: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "fantasy",
        "Fantasy",
        &[
            ("The Hobbit", "J. R. R. Tolkien"),
            ("A Wizard of Earthsea", "Ursula K. Le Guin"),
            ("The Name of the Wind", "Patrick Rothfuss"),
            ("Mistborn", "Brandon Sanderson"),
        ],
    ),
    (
        "science-fiction",
        "Science Fiction",
        &[
            ("Dune", "Frank Herbert"),
            ("The Left Hand of Darkness", "Ursula K. Le Guin"),
            ("Neuromancer", "William Gibson"),
            ("Hyperion", "Dan Simmons"),
        ],
    ),
    (
        "classics",
        "Classics",
        &[
            ("Pride and Prejudice", "Jane Austen"),
            ("Moby-Dick", "Herman Melville"),
            ("Crime and Punishment", "Fyodor Dostoevsky"),
        ],
    ),
    (
        "poetry",
        "Poetry",
        &[
            ("Leaves of Grass", "Walt Whitman"),
            ("Ariel", "Sylvia Plath"),
        ],
    ),
];

const READERS: &[&str] = &["alice", "bob", "carol", "dave"];

const COMMENTS: &[Option<&str>] = &[
    Some("Loved every page."),
    None,
    Some("Slow start, great ending."),
    Some("Not for me."),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| String::from("./shelf.db"));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shelf Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./shelf.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    let (known, applied) = migration_status(db.pool()).await?;
    info!(known, applied, "Migrations");

    let existing = db.books().count(&BookFilter::default()).await?;
    if existing > 0 {
        warn!(existing, "Database already has books, skipping seed");
        return Ok(());
    }

    let start = Instant::now();

    let mut readers = Vec::with_capacity(READERS.len());
    for name in READERS {
        let reader = match db.users().get_by_username(name).await? {
            Some(user) => user,
            None => db.users().create(name, UNUSABLE_PASSWORD).await?,
        };
        readers.push(reader);
    }

    let mut books = 0usize;
    let mut reviews = 0usize;

    for (slug, title, entries) in CATALOG {
        let category = db
            .categories()
            .insert(&Category {
                slug: slug.to_string(),
                title: title.to_string(),
            })
            .await
            .with_context(|| format!("inserting category {slug}"))?;

        for (index, (book_title, author)) in entries.iter().enumerate() {
            let book = db
                .books()
                .insert(&NewBook {
                    title: book_title.to_string(),
                    author: author.to_string(),
                    category_slug: category.slug.clone(),
                    description: None,
                    cover_img: None,
                })
                .await?;
            books += 1;

            // Deterministic spread of ratings and review counts
            for (offset, reader) in readers.iter().enumerate().take(index % readers.len() + 1) {
                let seed = books + offset;
                db.reviews()
                    .create(&NewReview {
                        book_id: book.id,
                        user_id: reader.id,
                        comment: COMMENTS[seed % COMMENTS.len()].map(str::to_string),
                        rating: (seed % 5) as i64 + 1,
                    })
                    .await?;
                reviews += 1;
            }
        }
    }

    info!(
        categories = CATALOG.len(),
        books,
        reviews,
        readers = readers.len(),
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    Ok(())
}
