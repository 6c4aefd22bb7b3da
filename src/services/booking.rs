//! Booking lifecycle.
//!
//! Creating or cancelling a booking also moves the event's `booked_spots`
//! counter, inside the same transaction as the booking row itself.

use tracing::info;

use crate::cache::CacheService;
use crate::database::Database;
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{Booking, Event, NewBooking, User};

const ALREADY_BOOKED: &str = "You have already booked this event";

pub struct BookingService<'a> {
    db: &'a Database,
    cache: &'a CacheService,
}

impl<'a> BookingService<'a> {
    pub fn new(db: &'a Database, cache: &'a CacheService) -> Self {
        Self { db, cache }
    }

    pub async fn list(&self, user_id: i64) -> ApiResult<Vec<Booking>> {
        Ok(Booking::list_for_user(user_id, &self.db.pool).await?)
    }

    /// One booking per (user, event). The existence check runs inside the
    /// transaction and a unique index on the pair catches whatever slips past it.
    pub async fn create(&self, user_id: i64, event_slug: &str, user_name: Option<String>) -> ApiResult<Booking> {
        let mut tx = self.db.pool.begin().await?;

        let event = Event::find_by_slug(event_slug, &mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Event", event_slug))?;

        let user = User::find_by_id(user_id, &mut *tx)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

        if Booking::exists_for(user.id, &event.slug, &mut *tx).await? {
            return Err(ApiError::Conflict(ALREADY_BOOKED.to_string()));
        }

        let new_booking = NewBooking::snapshot(&event, &user, user_name);
        let booking = Booking::insert(&new_booking, &mut *tx).await.map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict(ALREADY_BOOKED.to_string())
            } else {
                ApiError::from(e)
            }
        })?;

        Event::increment_booked_spots(&event.slug, &mut *tx).await?;
        tx.commit().await?;

        self.cache.invalidate_events().await;

        info!(
            booking_id = booking.id,
            user_id = user.id,
            event_slug = %event.slug,
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn cancel(&self, user_id: i64, booking_id: i64) -> ApiResult<()> {
        let mut tx = self.db.pool.begin().await?;

        let booking = Booking::find_by_id_for_update(booking_id, &mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking", booking_id))?;

        if booking.user_id != user_id {
            return Err(ApiError::Forbidden("Booking belongs to another user".to_string()));
        }

        // Only the transaction that actually removed the row moves the counter.
        if !Booking::delete(booking.id, &mut *tx).await? {
            return Err(ApiError::not_found("Booking", booking_id));
        }
        Event::decrement_booked_spots(&booking.event_slug, &mut *tx).await?;
        tx.commit().await?;

        self.cache.invalidate_events().await;

        info!(
            booking_id = booking.id,
            user_id,
            event_slug = %booking.event_slug,
            "Booking cancelled"
        );
        Ok(())
    }
}
