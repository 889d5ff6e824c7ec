use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{
    Booking, BookingId, BookingWithRoom, CapacityPolicy, Enrollment, EnrollmentId, Room, RoomId, Ticket, UserId,
};
use crate::CoreResult;

/// Read access to event enrollments
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<Enrollment>>;
}

/// Read access to tickets and their ticket types
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// First ticket of the enrollment, lowest id first.
    async fn find_by_enrollment_id(&self, enrollment_id: EnrollmentId) -> CoreResult<Option<Ticket>>;
}

/// Read access to hotel rooms
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find_by_id(&self, room_id: RoomId) -> CoreResult<Option<Room>>;
}

/// Booking persistence.
///
/// With `CapacityPolicy::Occupancy` the implementation must count the room's
/// bookings and write in one atomic unit, returning
/// `CoreError::Forbidden(CannotBook::RoomFull)` when the room is taken.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, user_id: UserId, room_id: RoomId, policy: CapacityPolicy) -> CoreResult<Booking>;

    async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<BookingWithRoom>>;

    /// Fails with `NotFound(Entity::Booking)` when no row has `booking_id`.
    async fn update_room(&self, booking_id: BookingId, room_id: RoomId, policy: CapacityPolicy) -> CoreResult<Booking>;
}

/// The four collaborators the booking engine reads and writes through.
#[derive(Clone)]
pub struct Repositories {
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub bookings: Arc<dyn BookingRepository>,
}
