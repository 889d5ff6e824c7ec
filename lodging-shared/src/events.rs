use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which engine entry point produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingOperation {
    Create,
    Get,
    Update,
}

impl BookingOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingOperation::Create => "create",
            BookingOperation::Get => "get",
            BookingOperation::Update => "update",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub event_id: Uuid,
    pub booking_id: i32,
    pub user_id: i32,
    pub room_id: i32,
    pub timestamp: i64,
}

impl BookingCreatedEvent {
    pub fn new(booking_id: i32, user_id: i32, room_id: i32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            booking_id,
            user_id,
            room_id,
            timestamp: Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingUpdatedEvent {
    pub event_id: Uuid,
    pub booking_id: i32,
    pub user_id: i32,
    pub from_room_id: i32,
    pub to_room_id: i32,
    pub timestamp: i64,
}

impl BookingUpdatedEvent {
    pub fn new(booking_id: i32, user_id: i32, from_room_id: i32, to_room_id: i32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            booking_id,
            user_id,
            from_room_id,
            to_room_id,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Emitted whenever an engine call ends in an error.
/// `reason` is a stable snake_case label suitable for metric labels.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingRejectedEvent {
    pub event_id: Uuid,
    pub operation: BookingOperation,
    pub user_id: i32,
    pub room_id: Option<i32>,
    pub reason: String,
    pub timestamp: i64,
}

impl BookingRejectedEvent {
    pub fn new(operation: BookingOperation, user_id: i32, room_id: Option<i32>, reason: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            operation,
            user_id,
            room_id,
            reason: reason.into(),
            timestamp: Utc::now().timestamp(),
        }
    }
}
