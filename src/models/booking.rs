use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use super::{Event, User};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub event_slug: String,
    pub event_title: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub booking_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 255))]
    pub event_slug: String,
    #[validate(length(max = 255))]
    pub user_name: Option<String>,
}

/// Row about to be inserted: copies of the event and user fields as they are at booking time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: i64,
    pub event_slug: String,
    pub event_title: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl NewBooking {
    pub fn snapshot(event: &Event, user: &User, user_name: Option<String>) -> Self {
        NewBooking {
            user_id: user.id,
            event_slug: event.slug.clone(),
            event_title: Some(event.title.clone()),
            event_date: event.date.clone(),
            event_time: event.time.clone(),
            event_location: event.location.clone(),
            user_name: user_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            user_email: Some(user.email.clone()),
        }
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, event_slug, event_title, event_date, event_time, \
     event_location, user_name, user_email, booking_date";

impl Booking {
    pub async fn exists_for<'e>(
        user_id: i64,
        event_slug: &str,
        db: impl PgExecutor<'e>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE user_id = $1 AND event_slug = $2)"
        )
        .bind(user_id)
        .bind(event_slug)
        .fetch_one(db)
        .await
    }

    pub async fn insert<'e>(new: &NewBooking, db: impl PgExecutor<'e>) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings (user_id, event_slug, event_title, event_date, event_time, \
                                   event_location, user_name, user_email, booking_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(&new.event_slug)
        .bind(&new.event_title)
        .bind(&new.event_date)
        .bind(&new.event_time)
        .bind(&new.event_location)
        .bind(&new.user_name)
        .bind(&new.user_email)
        .fetch_one(db)
        .await
    }

    /// Row-locking lookup for use inside a transaction. A concurrent locker
    /// waits for this transaction and then sees the row as it was committed.
    pub async fn find_by_id_for_update<'e>(
        id: i64,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn list_for_user<'e>(user_id: i64, db: impl PgExecutor<'e>) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn delete<'e>(id: i64, db: impl PgExecutor<'e>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
