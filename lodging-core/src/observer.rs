use lodging_shared::{BookingCreatedEvent, BookingRejectedEvent, BookingUpdatedEvent};
use std::sync::Arc;
use tracing::{info, warn};

/// Receives the outcome of every engine call. Implementations must not fail
/// and should return quickly; they run on the request task.
pub trait BookingObserver: Send + Sync {
    fn on_created(&self, _event: &BookingCreatedEvent) {}
    fn on_updated(&self, _event: &BookingUpdatedEvent) {}
    fn on_rejected(&self, _event: &BookingRejectedEvent) {}
}

/// Structured log lines for booking outcomes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BookingObserver for TracingObserver {
    fn on_created(&self, event: &BookingCreatedEvent) {
        info!(
            booking_id = event.booking_id,
            user_id = event.user_id,
            room_id = event.room_id,
            "Booking created"
        );
    }

    fn on_updated(&self, event: &BookingUpdatedEvent) {
        info!(
            booking_id = event.booking_id,
            user_id = event.user_id,
            from_room_id = event.from_room_id,
            to_room_id = event.to_room_id,
            "Booking moved to another room"
        );
    }

    fn on_rejected(&self, event: &BookingRejectedEvent) {
        warn!(
            operation = event.operation.as_str(),
            user_id = event.user_id,
            room_id = ?event.room_id,
            reason = %event.reason,
            "Booking request rejected"
        );
    }
}

/// Fans every event out to a list of observers, in order.
#[derive(Clone, Default)]
pub struct Observers {
    inner: Vec<Arc<dyn BookingObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn BookingObserver>) -> Self {
        self.inner.push(observer);
        self
    }
}

impl BookingObserver for Observers {
    fn on_created(&self, event: &BookingCreatedEvent) {
        for observer in &self.inner {
            observer.on_created(event);
        }
    }

    fn on_updated(&self, event: &BookingUpdatedEvent) {
        for observer in &self.inner {
            observer.on_updated(event);
        }
    }

    fn on_rejected(&self, event: &BookingRejectedEvent) {
        for observer in &self.inner {
            observer.on_rejected(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodging_shared::BookingOperation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        created: AtomicUsize,
        rejected: AtomicUsize,
    }

    impl BookingObserver for Counting {
        fn on_created(&self, _event: &BookingCreatedEvent) {
            self.created.fetch_add(1, Ordering::SeqCst);
        }

        fn on_rejected(&self, _event: &BookingRejectedEvent) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_fan_out_reaches_every_observer() {
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        let observers = Observers::new()
            .with(first.clone())
            .with(second.clone())
            .with(Arc::new(TracingObserver));

        observers.on_created(&BookingCreatedEvent::new(1, 2, 3));
        observers.on_rejected(&BookingRejectedEvent::new(BookingOperation::Create, 2, Some(3), "no_capacity"));
        observers.on_updated(&BookingUpdatedEvent::new(1, 2, 3, 4));

        assert_eq!(first.created.load(Ordering::SeqCst), 1);
        assert_eq!(second.created.load(Ordering::SeqCst), 1);
        assert_eq!(second.rejected.load(Ordering::SeqCst), 1);
    }
}
