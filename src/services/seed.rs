use tracing::info;
use validator::Validate;

use crate::database::Database;
use crate::models::{Event, EventInput};

const SEED_EVENTS: &str = include_str!("../../seed/events.json");

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("bundled seed file is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bundled seed event is invalid: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub fn seed_events() -> Result<Vec<EventInput>, SeedError> {
    let events: Vec<EventInput> = serde_json::from_str(SEED_EVENTS)?;
    for event in &events {
        event.validate()?;
    }
    Ok(events)
}

/// Inserts the bundled events, but only into an empty table. Returns how many were added.
pub async fn seed_if_empty(db: &Database) -> Result<usize, SeedError> {
    let mut tx = db.pool.begin().await?;

    // Serializes concurrent seeders; the loser waits, then sees a populated table.
    sqlx::query("LOCK TABLE events IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    if Event::count(&mut *tx).await? > 0 {
        info!("Events table already populated, skipping seed");
        return Ok(0);
    }

    let events = seed_events()?;
    for event in &events {
        Event::insert(event, &mut *tx).await?;
    }
    tx.commit().await?;

    info!("Seeded {} events", events.len());
    Ok(events.len())
}
