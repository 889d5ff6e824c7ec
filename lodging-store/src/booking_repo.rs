use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lodging_core::models::{Booking, BookingId, BookingWithRoom, CapacityPolicy, Room, RoomId, UserId};
use lodging_core::repository::BookingRepository;
use lodging_core::{CannotBook, CoreError, CoreResult, Entity};
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::db_error;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i32,
    user_id: i32,
    room_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            user_id: row.user_id,
            room_id: row.room_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingWithRoomRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    room_id: i32,
    room_name: String,
    room_capacity: i32,
    room_hotel_id: i32,
    room_created_at: DateTime<Utc>,
    room_updated_at: DateTime<Utc>,
}

impl From<BookingWithRoomRow> for BookingWithRoom {
    fn from(row: BookingWithRoomRow) -> Self {
        BookingWithRoom {
            id: row.id,
            user_id: row.user_id,
            room: Room {
                id: row.room_id,
                name: row.room_name,
                capacity: row.room_capacity,
                hotel_id: row.room_hotel_id,
                created_at: row.room_created_at,
                updated_at: row.room_updated_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Locks the room row for the rest of the transaction and checks that one more
/// booking fits. `moving` is left out of the count when a booking changes room.
async fn reserve_seat(
    tx: &mut Transaction<'_, Postgres>,
    room_id: RoomId,
    moving: Option<BookingId>,
) -> CoreResult<()> {
    let capacity: Option<i32> = sqlx::query_scalar("SELECT capacity FROM rooms WHERE id = $1 FOR UPDATE")
        .bind(room_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error)?;

    let capacity = capacity.ok_or(CoreError::NotFound(Entity::Room))?;

    let taken: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE room_id = $1 AND ($2::INTEGER IS NULL OR id <> $2)",
    )
    .bind(room_id)
    .bind(moving)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_error)?;

    if taken >= i64::from(capacity) {
        return Err(CannotBook::RoomFull.into());
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn insert(&self, user_id: UserId, room_id: RoomId, policy: CapacityPolicy) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        if policy == CapacityPolicy::Occupancy {
            reserve_seat(&mut tx, room_id, None).await?;
        }

        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (user_id, room_id)
            VALUES ($1, $2)
            RETURNING id, user_id, room_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(room_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => CannotBook::AlreadyBooked.into(),
            _ => db_error(err),
        })?;

        tx.commit().await.map_err(db_error)?;

        Ok(Booking::from(row))
    }

    async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<BookingWithRoom>> {
        let row = sqlx::query_as::<_, BookingWithRoomRow>(
            r#"
            SELECT b.id, b.user_id, b.created_at, b.updated_at,
                   r.id AS room_id, r.name AS room_name, r.capacity AS room_capacity,
                   r.hotel_id AS room_hotel_id, r.created_at AS room_created_at,
                   r.updated_at AS room_updated_at
            FROM bookings b
            INNER JOIN rooms r ON r.id = b.room_id
            WHERE b.user_id = $1
            ORDER BY b.id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(BookingWithRoom::from))
    }

    async fn update_room(&self, booking_id: BookingId, room_id: RoomId, policy: CapacityPolicy) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        if policy == CapacityPolicy::Occupancy {
            reserve_seat(&mut tx, room_id, Some(booking_id)).await?;
        }

        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings
            SET room_id = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, user_id, room_id, created_at, updated_at
            "#,
        )
        .bind(room_id)
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or(CoreError::NotFound(Entity::Booking))?;

        tx.commit().await.map_err(db_error)?;

        Ok(Booking::from(row))
    }
}
