//! In-process store backing all four repositories with plain vectors.
//!
//! Writes take one lock over the whole state, so occupancy checks and the
//! write they guard are atomic. Seeding helpers bypass the booking rules the
//! same way test factories write straight to the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lodging_core::models::{
    Booking, BookingId, BookingWithRoom, CapacityPolicy, Enrollment, EnrollmentId, HotelId, Room, RoomId, Ticket,
    TicketStatus, TicketType, UserId,
};
use lodging_core::repository::{
    BookingRepository, EnrollmentRepository, Repositories, RoomRepository, TicketRepository,
};
use lodging_core::{CannotBook, CoreError, CoreResult, Entity};
use lodging_shared::Masked;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::StoreHealth;

#[derive(Default)]
struct State {
    enrollments: Vec<Enrollment>,
    ticket_types: Vec<TicketType>,
    tickets: Vec<Ticket>,
    rooms: Vec<Room>,
    bookings: Vec<Booking>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

fn next_id(len: usize) -> i32 {
    len as i32 + 1
}

impl State {
    fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    fn check_occupancy(&self, room_id: RoomId, moving: Option<BookingId>) -> CoreResult<()> {
        let room = self.room(room_id).ok_or(CoreError::NotFound(Entity::Room))?;
        let taken = self
            .bookings
            .iter()
            .filter(|b| b.room_id == room_id && Some(b.id) != moving)
            .count();
        if taken as i64 >= i64::from(room.capacity) {
            return Err(CannotBook::RoomFull.into());
        }
        Ok(())
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            enrollments: self.clone(),
            tickets: self.clone(),
            rooms: self.clone(),
            bookings: self.clone(),
        }
    }

    pub async fn add_enrollment(&self, user_id: UserId, name: &str) -> Enrollment {
        let mut state = self.state.write().await;
        let enrollment = Enrollment {
            id: next_id(state.enrollments.len()),
            user_id,
            name: Masked(name.to_string()),
            cpf: Masked("000.000.000-00".to_string()),
            birthday: DateTime::<Utc>::UNIX_EPOCH,
            phone: Masked("(00) 00000-0000".to_string()),
            address: None,
        };
        state.enrollments.push(enrollment.clone());
        enrollment
    }

    pub async fn add_ticket_type(&self, name: &str, price: i32, is_remote: bool, includes_hotel: bool) -> TicketType {
        let mut state = self.state.write().await;
        let ticket_type = TicketType {
            id: next_id(state.ticket_types.len()),
            name: name.to_string(),
            price,
            is_remote,
            includes_hotel,
        };
        state.ticket_types.push(ticket_type.clone());
        ticket_type
    }

    pub async fn add_ticket(
        &self,
        enrollment_id: EnrollmentId,
        ticket_type_id: i32,
        status: TicketStatus,
    ) -> CoreResult<Ticket> {
        let mut state = self.state.write().await;
        let ticket_type = state
            .ticket_types
            .iter()
            .find(|t| t.id == ticket_type_id)
            .cloned()
            .ok_or_else(|| CoreError::Unexpected(format!("unknown ticket type {}", ticket_type_id)))?;
        let ticket = Ticket {
            id: next_id(state.tickets.len()),
            enrollment_id,
            status,
            ticket_type,
        };
        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    pub async fn add_room(&self, hotel_id: HotelId, name: &str, capacity: i32) -> Room {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let room = Room {
            id: next_id(state.rooms.len()),
            name: name.to_string(),
            capacity,
            hotel_id,
            created_at: now,
            updated_at: now,
        };
        state.rooms.push(room.clone());
        room
    }

    /// Writes a booking row directly, skipping eligibility and capacity rules.
    pub async fn add_booking(&self, user_id: UserId, room_id: RoomId) -> Booking {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let booking = Booking {
            id: next_id(state.bookings.len()),
            user_id,
            room_id,
            created_at: now,
            updated_at: now,
        };
        state.bookings.push(booking.clone());
        booking
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.read().await.bookings.clone()
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryStore {
    async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<Enrollment>> {
        let state = self.state.read().await;
        Ok(state.enrollments.iter().find(|e| e.user_id == user_id).cloned())
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn find_by_enrollment_id(&self, enrollment_id: EnrollmentId) -> CoreResult<Option<Ticket>> {
        let state = self.state.read().await;
        Ok(state
            .tickets
            .iter()
            .filter(|t| t.enrollment_id == enrollment_id)
            .min_by_key(|t| t.id)
            .cloned())
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn find_by_id(&self, room_id: RoomId) -> CoreResult<Option<Room>> {
        Ok(self.state.read().await.room(room_id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert(&self, user_id: UserId, room_id: RoomId, policy: CapacityPolicy) -> CoreResult<Booking> {
        let mut state = self.state.write().await;
        if policy == CapacityPolicy::Occupancy {
            state.check_occupancy(room_id, None)?;
        }
        if state.bookings.iter().any(|b| b.user_id == user_id) {
            return Err(CannotBook::AlreadyBooked.into());
        }

        let now = Utc::now();
        let booking = Booking {
            id: next_id(state.bookings.len()),
            user_id,
            room_id,
            created_at: now,
            updated_at: now,
        };
        state.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<BookingWithRoom>> {
        let state = self.state.read().await;
        let found = state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .min_by_key(|b| b.id)
            .and_then(|b| {
                state.room(b.room_id).map(|room| BookingWithRoom {
                    id: b.id,
                    user_id: b.user_id,
                    room: room.clone(),
                    created_at: b.created_at,
                    updated_at: b.updated_at,
                })
            });
        Ok(found)
    }

    async fn update_room(&self, booking_id: BookingId, room_id: RoomId, policy: CapacityPolicy) -> CoreResult<Booking> {
        let mut state = self.state.write().await;
        if policy == CapacityPolicy::Occupancy {
            state.check_occupancy(room_id, Some(booking_id))?;
        }

        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(CoreError::NotFound(Entity::Booking))?;
        booking.room_id = room_id;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> CoreResult<()> {
        Ok(())
    }
}
