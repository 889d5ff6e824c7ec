pub mod booking;
pub mod models;
pub mod observer;
pub mod repository;

pub use booking::BookingService;
pub use observer::{BookingObserver, Observers, TracingObserver};
pub use repository::Repositories;

use std::fmt;

/// Entity a lookup can come back empty for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Enrollment,
    Ticket,
    Room,
    Booking,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Enrollment => "enrollment",
            Entity::Ticket => "ticket",
            Entity::Room => "room",
            Entity::Booking => "booking",
        };
        f.write_str(name)
    }
}

/// Business rule that blocked a booking action on entities that do exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CannotBook {
    #[error("ticket has not been paid")]
    TicketNotPaid,
    #[error("ticket is for remote attendance")]
    RemoteTicket,
    #[error("ticket does not include hotel")]
    HotelNotIncluded,
    #[error("room has no capacity")]
    NoCapacity,
    #[error("room is fully occupied")]
    RoomFull,
    #[error("user already has a booking")]
    AlreadyBooked,
    #[error("user has no booking to change")]
    NoExistingBooking,
    #[error("booking belongs to another user")]
    NotBookingOwner,
}

impl CannotBook {
    pub fn label(&self) -> &'static str {
        match self {
            CannotBook::TicketNotPaid => "ticket_not_paid",
            CannotBook::RemoteTicket => "remote_ticket",
            CannotBook::HotelNotIncluded => "hotel_not_included",
            CannotBook::NoCapacity => "no_capacity",
            CannotBook::RoomFull => "room_full",
            CannotBook::AlreadyBooked => "already_booked",
            CannotBook::NoExistingBooking => "no_existing_booking",
            CannotBook::NotBookingOwner => "not_booking_owner",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("cannot book: {0}")]
    Forbidden(CannotBook),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl CoreError {
    /// Stable snake_case label, used for metric labels and rejection events.
    pub fn label(&self) -> &'static str {
        match self {
            CoreError::NotFound(Entity::Enrollment) => "enrollment_not_found",
            CoreError::NotFound(Entity::Ticket) => "ticket_not_found",
            CoreError::NotFound(Entity::Room) => "room_not_found",
            CoreError::NotFound(Entity::Booking) => "booking_not_found",
            CoreError::Forbidden(reason) => reason.label(),
            CoreError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<CannotBook> for CoreError {
    fn from(reason: CannotBook) -> Self {
        CoreError::Forbidden(reason)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
