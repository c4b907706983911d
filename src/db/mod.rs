pub mod queries;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Error;

pub use queries::categories::{Category, NewCategory};
pub use queries::events::{Event, EventCounts, EventDetails, EventFilter, NewEvent, TimeWindow};
pub use queries::participants::{NewParticipant, Participant};

/// What happens to a category's events when the category is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete the dependent events (and their participant links) with the category.
    Cascade,
    /// Refuse to delete a category that still owns events.
    Reject,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("category {category_id} still owns {events} event(s)")]
    HasDependents { category_id: i64, events: i64 },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub async fn establish_connection(path: &str) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePool::connect_with(options).await
}

// every connection to `sqlite::memory:` opens its own database, so the pool is pinned to one
pub async fn connect_in_memory() -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
