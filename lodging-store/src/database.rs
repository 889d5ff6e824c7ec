use async_trait::async_trait;
use lodging_core::repository::Repositories;
use lodging_core::{CoreError, CoreResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;
use crate::booking_repo::StoreBookingRepository;
use crate::enrollment_repo::StoreEnrollmentRepository;
use crate::room_repo::StoreRoomRepository;
use crate::ticket_repo::StoreTicketRepository;
use crate::StoreHealth;

/// Owns the Postgres pool. Created once in `main` and closed at shutdown.
#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            enrollments: Arc::new(StoreEnrollmentRepository::new(self.pool.clone())),
            tickets: Arc::new(StoreTicketRepository::new(self.pool.clone())),
            rooms: Arc::new(StoreRoomRepository::new(self.pool.clone())),
            bookings: Arc::new(StoreBookingRepository::new(self.pool.clone())),
        }
    }

    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl StoreHealth for DbClient {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_error)
    }
}

pub(crate) fn db_error(err: sqlx::Error) -> CoreError {
    CoreError::Unexpected(err.to_string())
}
