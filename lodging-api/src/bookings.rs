use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    routing::{get, put},
    Json, Router,
};
use lodging_core::models::{BookingId, BookingView, RoomId};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::{customer_auth_middleware, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIdResponse {
    pub booking_id: BookingId,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/booking", get(get_booking).post(create_booking))
        .route("/booking/{booking_id}", put(update_booking))
        .route_layer(axum::middleware::from_fn_with_state(state, customer_auth_middleware))
}

// Malformed or missing bodies are plain 400s.
fn requested_room(body: Result<Json<BookingRequest>, JsonRejection>) -> Result<RoomId, AppError> {
    body.map(|Json(req)| req.room_id)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /booking
async fn create_booking(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<BookingIdResponse>, AppError> {
    let room_id = requested_room(body)?;
    let booking = state.bookings.create_booking(user_id, room_id).await?;

    Ok(Json(BookingIdResponse { booking_id: booking.id }))
}

/// GET /booking
async fn get_booking(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<BookingView>, AppError> {
    let view = state.bookings.get_booking(user_id).await?;
    Ok(Json(view))
}

/// PUT /booking/{booking_id}
async fn update_booking(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(booking_id): Path<BookingId>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<BookingIdResponse>, AppError> {
    let room_id = requested_room(body)?;
    let booking = state.bookings.update_booking(user_id, room_id, booking_id).await?;

    Ok(Json(BookingIdResponse { booking_id: booking.id }))
}
