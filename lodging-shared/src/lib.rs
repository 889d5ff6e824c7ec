pub mod events;
pub mod pii;

pub use events::{BookingCreatedEvent, BookingOperation, BookingRejectedEvent, BookingUpdatedEvent};
pub use pii::Masked;
