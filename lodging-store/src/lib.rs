pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod enrollment_repo;
pub mod memory;
pub mod room_repo;
pub mod ticket_repo;

pub use database::DbClient;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use lodging_core::CoreResult;

/// Liveness check over whichever backend the service runs on.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> CoreResult<()>;
}
