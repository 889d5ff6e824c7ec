use std::sync::Arc;

use lodging_core::models::CapacityPolicy;
use lodging_core::{BookingService, Observers, Repositories, TracingObserver};
use lodging_store::StoreHealth;

use crate::metrics::MetricsObserver;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub store: Arc<dyn StoreHealth>,
    pub metrics: Arc<MetricsObserver>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wires the booking engine to the given repositories with the tracing and
    /// metrics observers attached.
    pub fn new(
        repos: Repositories,
        store: Arc<dyn StoreHealth>,
        policy: CapacityPolicy,
        auth: AuthConfig,
    ) -> Result<Self, prometheus::Error> {
        let metrics = Arc::new(MetricsObserver::new()?);
        let observers = Observers::new()
            .with(Arc::new(TracingObserver))
            .with(metrics.clone());

        let bookings = BookingService::new(repos, policy).with_observer(Arc::new(observers));

        Ok(Self {
            bookings: Arc::new(bookings),
            store,
            metrics,
            auth,
        })
    }
}
