use chrono::{DateTime, SecondsFormat, Utc};
use lodging_shared::Masked;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{CannotBook, CoreError};

pub type UserId = i32;
pub type EnrollmentId = i32;
pub type TicketId = i32;
pub type RoomId = i32;
pub type HotelId = i32;
pub type BookingId = i32;

// ============================================================================
// Enrollment
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    pub street: Masked<String>,
    pub city: String,
    pub state: String,
    pub number: Masked<String>,
    pub neighborhood: String,
    pub address_detail: Option<Masked<String>>,
}

/// A user's registration for the event. The engine only cares that it exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub name: Masked<String>,
    pub cpf: Masked<String>,
    pub birthday: DateTime<Utc>,
    pub phone: Masked<String>,
    pub address: Option<Address>,
}

// ============================================================================
// Tickets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Reserved,
    Paid,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Reserved => "RESERVED",
            TicketStatus::Paid => "PAID",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVED" => Ok(TicketStatus::Reserved),
            "PAID" => Ok(TicketStatus::Paid),
            other => Err(CoreError::Unexpected(format!("unknown ticket status {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub is_remote: bool,
    pub includes_hotel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub enrollment_id: EnrollmentId,
    pub status: TicketStatus,
    pub ticket_type: TicketType,
}

impl Ticket {
    /// A ticket entitles its holder to a room only when it is paid, in person
    /// and hotel-inclusive. The first failing rule is reported.
    pub fn check_hotel_eligibility(&self) -> Result<(), CannotBook> {
        if self.status != TicketStatus::Paid {
            return Err(CannotBook::TicketNotPaid);
        }
        if self.ticket_type.is_remote {
            return Err(CannotBook::RemoteTicket);
        }
        if !self.ticket_type.includes_hotel {
            return Err(CannotBook::HotelNotIncluded);
        }
        Ok(())
    }
}

// ============================================================================
// Rooms & Bookings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: i32,
    pub hotel_id: HotelId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Capacity is a threshold, not a live counter.
    pub fn is_available(&self) -> bool {
        self.capacity > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking joined with the room it currently references.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingWithRoom {
    pub id: BookingId,
    pub user_id: UserId,
    pub room: Room,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How strictly room capacity is enforced when a booking is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityPolicy {
    /// `capacity > 0` means bookable; concurrent bookings may overbook.
    #[default]
    Threshold,
    /// The store counts bookings on the room in the same transaction as the
    /// write and refuses once the count reaches capacity.
    Occupancy,
}

// ============================================================================
// Read projection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub capacity: i32,
    pub hotel_id: HotelId,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingView {
    pub id: BookingId,
    #[serde(rename = "Room")]
    pub room: RoomSnapshot,
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            capacity: room.capacity,
            hotel_id: room.hotel_id,
            created_at: iso8601(&room.created_at),
            updated_at: iso8601(&room.updated_at),
        }
    }
}

impl From<&BookingWithRoom> for BookingView {
    fn from(booking: &BookingWithRoom) -> Self {
        Self {
            id: booking.id,
            room: RoomSnapshot::from(&booking.room),
        }
    }
}
