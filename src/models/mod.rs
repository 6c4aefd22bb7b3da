pub mod booking;
pub mod event;
pub mod user;

pub use booking::{Booking, CreateBookingRequest, NewBooking};
pub use event::{Event, EventInput, EventMode};
pub use user::{Credentials, PublicUser, User};
