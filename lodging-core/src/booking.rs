//! Booking eligibility and allocation.
//!
//! Every entry point is a short chain of lookups followed by at most one
//! write. Each failed check short-circuits with a typed [`CoreError`]; the
//! outcome is reported to the configured [`BookingObserver`] and never logged
//! from inside the decision procedure.

use std::sync::Arc;

use lodging_shared::{BookingCreatedEvent, BookingOperation, BookingRejectedEvent, BookingUpdatedEvent};

use crate::models::{Booking, BookingId, BookingView, CapacityPolicy, Room, RoomId, UserId};
use crate::observer::{BookingObserver, Observers};
use crate::repository::Repositories;
use crate::{CannotBook, CoreError, CoreResult, Entity};

pub struct BookingService {
    repos: Repositories,
    policy: CapacityPolicy,
    observer: Arc<dyn BookingObserver>,
}

impl BookingService {
    pub fn new(repos: Repositories, policy: CapacityPolicy) -> Self {
        Self {
            repos,
            policy,
            observer: Arc::new(Observers::new()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BookingObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    /// Reserve `room_id` for `user_id`.
    ///
    /// Checks, in order: enrollment exists, a ticket exists, the ticket is
    /// paid/in-person/hotel-inclusive, the room exists, the room has capacity,
    /// the caller holds no booking yet.
    pub async fn create_booking(&self, user_id: UserId, room_id: RoomId) -> CoreResult<Booking> {
        let result = self.try_create(user_id, room_id).await;
        match &result {
            Ok(booking) => self
                .observer
                .on_created(&BookingCreatedEvent::new(booking.id, user_id, booking.room_id)),
            Err(err) => self.reject(BookingOperation::Create, user_id, Some(room_id), err),
        }
        result
    }

    /// The caller's booking with a snapshot of its room.
    pub async fn get_booking(&self, user_id: UserId) -> CoreResult<BookingView> {
        let result = self
            .repos
            .bookings
            .find_by_user_id(user_id)
            .await
            .and_then(|found| found.ok_or(CoreError::NotFound(Entity::Booking)))
            .map(|booking| BookingView::from(&booking));

        if let Err(err) = &result {
            self.reject(BookingOperation::Get, user_id, None, err);
        }
        result
    }

    /// Move the caller's booking to `room_id`.
    ///
    /// A caller without a booking gets `Forbidden`, not `NotFound`. The row
    /// written is `booking_id`, which must be the caller's own booking.
    pub async fn update_booking(&self, user_id: UserId, room_id: RoomId, booking_id: BookingId) -> CoreResult<Booking> {
        let result = self.try_update(user_id, room_id, booking_id).await;
        match &result {
            Ok((from_room_id, booking)) => self.observer.on_updated(&BookingUpdatedEvent::new(
                booking.id,
                user_id,
                *from_room_id,
                booking.room_id,
            )),
            Err(err) => self.reject(BookingOperation::Update, user_id, Some(room_id), err),
        }
        result.map(|(_, booking)| booking)
    }

    async fn try_create(&self, user_id: UserId, room_id: RoomId) -> CoreResult<Booking> {
        let enrollment = self
            .repos
            .enrollments
            .find_by_user_id(user_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Enrollment))?;

        let ticket = self
            .repos
            .tickets
            .find_by_enrollment_id(enrollment.id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Ticket))?;

        ticket.check_hotel_eligibility()?;

        let room = self.available_room(room_id).await?;

        if self.repos.bookings.find_by_user_id(user_id).await?.is_some() {
            return Err(CannotBook::AlreadyBooked.into());
        }

        self.repos.bookings.insert(user_id, room.id, self.policy).await
    }

    async fn try_update(&self, user_id: UserId, room_id: RoomId, booking_id: BookingId) -> CoreResult<(RoomId, Booking)> {
        let owned = self
            .repos
            .bookings
            .find_by_user_id(user_id)
            .await?
            .ok_or(CannotBook::NoExistingBooking)?;

        let room = self.available_room(room_id).await?;

        if owned.id != booking_id {
            return Err(CannotBook::NotBookingOwner.into());
        }

        let booking = self.repos.bookings.update_room(booking_id, room.id, self.policy).await?;
        Ok((owned.room.id, booking))
    }

    async fn available_room(&self, room_id: RoomId) -> CoreResult<Room> {
        let room = self
            .repos
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or(CoreError::NotFound(Entity::Room))?;

        if !room.is_available() {
            return Err(CannotBook::NoCapacity.into());
        }
        Ok(room)
    }

    fn reject(&self, operation: BookingOperation, user_id: UserId, room_id: Option<RoomId>, err: &CoreError) {
        self.observer
            .on_rejected(&BookingRejectedEvent::new(operation, user_id, room_id, err.label()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingWithRoom, Enrollment, EnrollmentId, Ticket, TicketStatus, TicketType};
    use crate::repository::{BookingRepository, EnrollmentRepository, RoomRepository, TicketRepository};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use lodging_shared::Masked;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        enrollments: Mutex<Vec<Enrollment>>,
        tickets: Mutex<Vec<Ticket>>,
        rooms: Mutex<Vec<Room>>,
        bookings: Mutex<Vec<Booking>>,
    }

    impl FakeStore {
        fn repositories(self: &Arc<Self>) -> Repositories {
            Repositories {
                enrollments: self.clone(),
                tickets: self.clone(),
                rooms: self.clone(),
                bookings: self.clone(),
            }
        }

        fn enroll(&self, user_id: UserId) -> EnrollmentId {
            let mut enrollments = self.enrollments.lock().unwrap();
            let id = enrollments.len() as i32 + 1;
            enrollments.push(Enrollment {
                id,
                user_id,
                name: Masked("Ada".to_string()),
                cpf: Masked("000.000.000-00".to_string()),
                birthday: Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap(),
                phone: Masked("(21) 99999-9999".to_string()),
                address: None,
            });
            id
        }

        fn ticket(&self, enrollment_id: EnrollmentId, status: TicketStatus, is_remote: bool, includes_hotel: bool) {
            let mut tickets = self.tickets.lock().unwrap();
            let id = tickets.len() as i32 + 1;
            tickets.push(Ticket {
                id,
                enrollment_id,
                status,
                ticket_type: TicketType {
                    id,
                    name: "Presencial".to_string(),
                    price: 600,
                    is_remote,
                    includes_hotel,
                },
            });
        }

        fn room(&self, capacity: i32) -> RoomId {
            let mut rooms = self.rooms.lock().unwrap();
            let id = rooms.len() as i32 + 1;
            let at = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
            rooms.push(Room {
                id,
                name: format!("Room {}", id),
                capacity,
                hotel_id: 1,
                created_at: at,
                updated_at: at,
            });
            id
        }

        fn booking_count(&self) -> usize {
            self.bookings.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EnrollmentRepository for FakeStore {
        async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<Enrollment>> {
            Ok(self.enrollments.lock().unwrap().iter().find(|e| e.user_id == user_id).cloned())
        }
    }

    #[async_trait]
    impl TicketRepository for FakeStore {
        async fn find_by_enrollment_id(&self, enrollment_id: EnrollmentId) -> CoreResult<Option<Ticket>> {
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.enrollment_id == enrollment_id)
                .cloned())
        }
    }

    #[async_trait]
    impl RoomRepository for FakeStore {
        async fn find_by_id(&self, room_id: RoomId) -> CoreResult<Option<Room>> {
            Ok(self.rooms.lock().unwrap().iter().find(|r| r.id == room_id).cloned())
        }
    }

    #[async_trait]
    impl BookingRepository for FakeStore {
        async fn insert(&self, user_id: UserId, room_id: RoomId, policy: CapacityPolicy) -> CoreResult<Booking> {
            let capacity = self.rooms.lock().unwrap().iter().find(|r| r.id == room_id).map(|r| r.capacity);
            let mut bookings = self.bookings.lock().unwrap();
            if policy == CapacityPolicy::Occupancy {
                let taken = bookings.iter().filter(|b| b.room_id == room_id).count() as i32;
                if Some(taken) >= capacity {
                    return Err(CannotBook::RoomFull.into());
                }
            }
            let now = Utc::now();
            let booking = Booking {
                id: bookings.len() as i32 + 1,
                user_id,
                room_id,
                created_at: now,
                updated_at: now,
            };
            bookings.push(booking.clone());
            Ok(booking)
        }

        async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<BookingWithRoom>> {
            let booking = self.bookings.lock().unwrap().iter().find(|b| b.user_id == user_id).cloned();
            Ok(booking.and_then(|b| {
                let room = self.rooms.lock().unwrap().iter().find(|r| r.id == b.room_id).cloned()?;
                Some(BookingWithRoom {
                    id: b.id,
                    user_id: b.user_id,
                    room,
                    created_at: b.created_at,
                    updated_at: b.updated_at,
                })
            }))
        }

        async fn update_room(&self, booking_id: BookingId, room_id: RoomId, _policy: CapacityPolicy) -> CoreResult<Booking> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == booking_id)
                .ok_or(CoreError::NotFound(Entity::Booking))?;
            booking.room_id = room_id;
            booking.updated_at = Utc::now();
            Ok(booking.clone())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        created: AtomicUsize,
        updated: AtomicUsize,
        rejected: Mutex<Vec<String>>,
    }

    impl BookingObserver for RecordingObserver {
        fn on_created(&self, _event: &BookingCreatedEvent) {
            self.created.fetch_add(1, Ordering::SeqCst);
        }

        fn on_updated(&self, _event: &BookingUpdatedEvent) {
            self.updated.fetch_add(1, Ordering::SeqCst);
        }

        fn on_rejected(&self, event: &BookingRejectedEvent) {
            self.rejected.lock().unwrap().push(event.reason.clone());
        }
    }

    const USER: UserId = 42;

    fn setup(policy: CapacityPolicy) -> (Arc<FakeStore>, Arc<RecordingObserver>, BookingService) {
        let store = Arc::new(FakeStore::default());
        let observer = Arc::new(RecordingObserver::default());
        let service = BookingService::new(store.repositories(), policy).with_observer(observer.clone());
        (store, observer, service)
    }

    fn eligible_user(store: &FakeStore, user_id: UserId) {
        let enrollment_id = store.enroll(user_id);
        store.ticket(enrollment_id, TicketStatus::Paid, false, true);
    }

    #[tokio::test]
    async fn test_create_without_enrollment_is_not_found() {
        let (store, observer, service) = setup(CapacityPolicy::Threshold);
        let room_id = store.room(1);

        let err = service.create_booking(USER, room_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(Entity::Enrollment)));
        assert_eq!(observer.rejected.lock().unwrap().as_slice(), ["enrollment_not_found"]);
    }

    #[tokio::test]
    async fn test_create_without_ticket_is_not_found() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        store.enroll(USER);
        let room_id = store.room(1);

        let err = service.create_booking(USER, room_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(Entity::Ticket)));
    }

    #[tokio::test]
    async fn test_create_with_ineligible_ticket_is_forbidden() {
        let cases = [
            (TicketStatus::Reserved, false, true, CannotBook::TicketNotPaid),
            (TicketStatus::Paid, true, true, CannotBook::RemoteTicket),
            (TicketStatus::Paid, false, false, CannotBook::HotelNotIncluded),
        ];

        for (status, is_remote, includes_hotel, expected) in cases {
            let (store, _, service) = setup(CapacityPolicy::Threshold);
            let enrollment_id = store.enroll(USER);
            store.ticket(enrollment_id, status, is_remote, includes_hotel);
            let room_id = store.room(3);

            let err = service.create_booking(USER, room_id).await.unwrap_err();
            assert!(matches!(err, CoreError::Forbidden(reason) if reason == expected));
            assert_eq!(store.booking_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_ticket_checked_before_room_lookup() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        let enrollment_id = store.enroll(USER);
        store.ticket(enrollment_id, TicketStatus::Paid, true, true);

        let err = service.create_booking(USER, 999).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::RemoteTicket)));
    }

    #[tokio::test]
    async fn test_create_with_unknown_room_is_not_found() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);

        let err = service.create_booking(USER, 999).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(Entity::Room)));
    }

    #[tokio::test]
    async fn test_create_with_zero_capacity_is_forbidden() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);
        let room_id = store.room(0);

        let err = service.create_booking(USER, room_id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::NoCapacity)));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_create_then_get_returns_room_snapshot() {
        let (store, observer, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);
        let room_id = store.room(1);

        let booking = service.create_booking(USER, room_id).await.unwrap();
        assert_eq!(booking.user_id, USER);
        assert_eq!(booking.room_id, room_id);
        assert_eq!(observer.created.load(Ordering::SeqCst), 1);

        let view = service.get_booking(USER).await.unwrap();
        assert_eq!(view.id, booking.id);
        assert_eq!(view.room.id, room_id);
        assert_eq!(view.room.capacity, 1);
        assert_eq!(view.room.created_at, "2023-01-01T12:00:00.000Z");

        let again = service.get_booking(USER).await.unwrap();
        assert_eq!(view, again);
    }

    #[tokio::test]
    async fn test_second_create_is_forbidden_and_booking_stays_movable() {
        let (store, observer, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);
        let first = store.room(3);
        let second = store.room(3);

        let booking = service.create_booking(USER, first).await.unwrap();
        let err = service.create_booking(USER, first).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::AlreadyBooked)));
        assert_eq!(store.booking_count(), 1);
        assert_eq!(observer.rejected.lock().unwrap().as_slice(), ["already_booked"]);

        let moved = service.update_booking(USER, second, booking.id).await.unwrap();
        assert_eq!(moved.id, booking.id);
        assert_eq!(moved.room_id, second);
    }

    #[tokio::test]
    async fn test_threshold_policy_tolerates_overbooking() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, 1);
        eligible_user(&store, 2);
        let room_id = store.room(1);

        service.create_booking(1, room_id).await.unwrap();
        service.create_booking(2, room_id).await.unwrap();
        assert_eq!(store.booking_count(), 2);
    }

    #[tokio::test]
    async fn test_occupancy_policy_rejects_full_room() {
        let (store, _, service) = setup(CapacityPolicy::Occupancy);
        eligible_user(&store, 1);
        eligible_user(&store, 2);
        let room_id = store.room(1);

        service.create_booking(1, room_id).await.unwrap();
        let err = service.create_booking(2, room_id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::RoomFull)));
    }

    #[tokio::test]
    async fn test_get_without_booking_is_not_found() {
        let (store, observer, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);

        let err = service.get_booking(USER).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(Entity::Booking)));
        assert_eq!(observer.rejected.lock().unwrap().as_slice(), ["booking_not_found"]);
    }

    #[tokio::test]
    async fn test_update_without_booking_is_forbidden() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);
        let valid_room = store.room(2);

        let err = service.update_booking(USER, valid_room, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::NoExistingBooking)));

        let err = service.update_booking(USER, 999, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::NoExistingBooking)));
    }

    #[tokio::test]
    async fn test_update_moves_booking_to_new_room() {
        let (store, observer, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);
        let first = store.room(1);
        let second = store.room(2);
        let booking = service.create_booking(USER, first).await.unwrap();

        let updated = service.update_booking(USER, second, booking.id).await.unwrap();
        assert_eq!(updated.id, booking.id);
        assert_eq!(updated.room_id, second);
        assert_eq!(store.booking_count(), 1);
        assert_eq!(observer.updated.load(Ordering::SeqCst), 1);

        let view = service.get_booking(USER).await.unwrap();
        assert_eq!(view.room.id, second);
    }

    #[tokio::test]
    async fn test_update_room_checks() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, USER);
        let first = store.room(1);
        let full = store.room(0);
        let booking = service.create_booking(USER, first).await.unwrap();

        let err = service.update_booking(USER, full, booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::NoCapacity)));

        let err = service.update_booking(USER, 999, booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(Entity::Room)));

        let view = service.get_booking(USER).await.unwrap();
        assert_eq!(view.room.id, first);
    }

    #[tokio::test]
    async fn test_update_of_someone_elses_booking_is_forbidden() {
        let (store, _, service) = setup(CapacityPolicy::Threshold);
        eligible_user(&store, 1);
        eligible_user(&store, 2);
        let room = store.room(5);
        let other_room = store.room(5);
        let mine = service.create_booking(1, room).await.unwrap();
        let theirs = service.create_booking(2, room).await.unwrap();

        let err = service.update_booking(1, other_room, theirs.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(CannotBook::NotBookingOwner)));
        assert_eq!(service.get_booking(2).await.unwrap().room.id, room);

        service.update_booking(1, other_room, mine.id).await.unwrap();
    }
}
