pub mod auth;
pub mod bookings;
pub mod events;
pub mod health;

use axum::Router;
use std::sync::Arc;

pub fn routes(state: Arc<crate::AppState>) -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(events::routes(state))
        .merge(auth::routes())
        .merge(bookings::routes())
}
