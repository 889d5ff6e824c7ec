//! Prometheus counters fed by the booking engine's observer hook.

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use lodging_core::BookingObserver;
use lodging_shared::{BookingCreatedEvent, BookingRejectedEvent, BookingUpdatedEvent};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

pub struct MetricsObserver {
    registry: Registry,
    pub bookings_created: IntCounter,
    pub bookings_updated: IntCounter,
    pub rejections: IntCounterVec,
}

impl MetricsObserver {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let bookings_created = IntCounter::new("lodging_bookings_created_total", "Bookings created")?;
        let bookings_updated = IntCounter::new("lodging_bookings_updated_total", "Bookings moved to another room")?;
        let rejections = IntCounterVec::new(
            Opts::new("lodging_booking_rejections_total", "Booking requests rejected"),
            &["operation", "reason"],
        )?;

        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(bookings_updated.clone()))?;
        registry.register(Box::new(rejections.clone()))?;

        Ok(Self {
            registry,
            bookings_created,
            bookings_updated,
            rejections,
        })
    }

    /// Text exposition format of everything registered.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl BookingObserver for MetricsObserver {
    fn on_created(&self, _event: &BookingCreatedEvent) {
        self.bookings_created.inc();
    }

    fn on_updated(&self, _event: &BookingUpdatedEvent) {
        self.bookings_updated.inc();
    }

    fn on_rejected(&self, event: &BookingRejectedEvent) {
        self.rejections
            .with_label_values(&[event.operation.as_str(), event.reason.as_str()])
            .inc();
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
