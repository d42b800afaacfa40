use booking_core::db::{open_pool, open_pool_in_memory, PoolConfig};
use booking_core::{
    Booking, BookingRepository, BookingValidationError, BookingVariant, PageRequest, RepoError,
    SqliteBookingRepository,
};
use chrono::NaiveDate;
use r2d2_sqlite::SqliteConnectionManager;
use std::time::{Duration, Instant};
use uuid::Uuid;

fn repo() -> SqliteBookingRepository {
    let pool = open_pool_in_memory(&PoolConfig::default()).unwrap();
    SqliteBookingRepository::try_new(pool).unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn hotel(user_id: &str, hra_id: &str) -> Booking {
    Booking::new(Uuid::new_v4(), user_id, hra_id, date(2025, 6, 1), 2).with_departure(date(2025, 6, 5))
}

fn restaurant(user_id: &str, hra_id: &str) -> Booking {
    Booking::new(Uuid::new_v4(), user_id, hra_id, date(2025, 7, 14), 4)
}

#[test]
fn create_and_get_roundtrip() {
    let repo = repo();
    let booking = hotel("u1", "h1");

    let stored = repo.create_booking(BookingVariant::Hotel, &booking).unwrap();
    assert!(stored.created_at.is_some());
    assert!(stored.deleted_at.is_none());

    let loaded = repo
        .get_booking(BookingVariant::Hotel, booking.id, false)
        .unwrap()
        .unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(loaded.will_leave, Some(date(2025, 6, 5)));
}

#[test]
fn create_with_duplicate_id_fails_in_storage() {
    let repo = repo();
    let booking = restaurant("u1", "r1");
    repo.create_booking(BookingVariant::Restaurant, &booking)
        .unwrap();

    let err = repo
        .create_booking(BookingVariant::Restaurant, &booking)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Execution {
            operation: "create",
            ..
        }
    ));
}

#[test]
fn create_rejects_invalid_shapes() {
    let repo = repo();

    let mut crowd = restaurant("u1", "r1");
    crowd.number_of_people = 0;
    let err = repo
        .create_booking(BookingVariant::Restaurant, &crowd)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(BookingValidationError::NonPositiveHeadcount(0))
    ));

    let stay = Booking::new(Uuid::new_v4(), "u1", "h1", date(2025, 6, 5), 1);
    let err = repo.create_booking(BookingVariant::Hotel, &stay).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(BookingValidationError::MissingDeparture)
    ));

    let backwards = stay.clone().with_departure(date(2025, 6, 1));
    let err = repo
        .create_booking(BookingVariant::Hotel, &backwards)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(BookingValidationError::DepartureBeforeArrival { .. })
    ));

    let visit = restaurant("u1", "a1").with_departure(date(2025, 7, 15));
    let err = repo
        .create_booking(BookingVariant::Attraction, &visit)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(BookingValidationError::UnexpectedDeparture(
            BookingVariant::Attraction
        ))
    ));

    let page = repo
        .list_active(BookingVariant::Hotel, PageRequest::unpaginated())
        .unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn zero_limit_returns_every_match() {
    let repo = repo();
    for _ in 0..5 {
        repo.create_booking(BookingVariant::Restaurant, &restaurant("u1", "r1"))
            .unwrap();
    }

    let page = repo
        .list_by_user(BookingVariant::Restaurant, "u1", PageRequest::new(0, 3))
        .unwrap();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total, 5);
}

#[test]
fn pagination_keeps_full_count_and_creation_order() {
    let repo = repo();
    let mut ids = Vec::new();
    for _ in 0..5 {
        let booking = repo
            .create_booking(BookingVariant::Restaurant, &restaurant("u1", "r1"))
            .unwrap();
        ids.push(booking.id);
        std::thread::sleep(Duration::from_millis(2));
    }
    repo.create_booking(BookingVariant::Restaurant, &restaurant("u2", "r1"))
        .unwrap();

    let first = repo
        .list_by_user(BookingVariant::Restaurant, "u1", PageRequest::new(2, 0))
        .unwrap();
    let second = repo
        .list_by_user(BookingVariant::Restaurant, "u1", PageRequest::new(2, 2))
        .unwrap();
    let past_end = repo
        .list_by_user(BookingVariant::Restaurant, "u1", PageRequest::new(2, 10))
        .unwrap();

    assert_eq!(first.total, 5);
    assert_eq!(second.total, 5);
    assert_eq!(past_end.total, 5);
    assert!(past_end.items.is_empty());

    let seen: Vec<Uuid> = first
        .items
        .iter()
        .chain(second.items.iter())
        .map(|booking| booking.id)
        .collect();
    assert_eq!(seen, ids[..4].to_vec());
}

#[test]
fn provider_listing_returns_user_references_only() {
    let repo = repo();
    repo.create_booking(BookingVariant::Attraction, &restaurant("u1", "a1"))
        .unwrap();
    repo.create_booking(BookingVariant::Attraction, &restaurant("u2", "a1"))
        .unwrap();
    repo.create_booking(BookingVariant::Attraction, &restaurant("u3", "a2"))
        .unwrap();

    let page = repo
        .list_by_provider(BookingVariant::Attraction, "a1", PageRequest::unpaginated())
        .unwrap();
    let users: Vec<&str> = page.items.iter().map(|reference| reference.user_id.as_str()).collect();
    assert_eq!(page.total, 2);
    assert_eq!(users.len(), 2);
    assert!(users.contains(&"u1"));
    assert!(users.contains(&"u2"));
}

#[test]
fn soft_deleted_rows_only_appear_in_deleted_listing() {
    let repo = repo();
    let kept = repo
        .create_booking(BookingVariant::Hotel, &hotel("u1", "h1"))
        .unwrap();
    let removed = repo
        .create_booking(BookingVariant::Hotel, &hotel("u1", "h1"))
        .unwrap();
    repo.soft_delete_booking(BookingVariant::Hotel, removed.id)
        .unwrap();

    let active = repo
        .list_active(BookingVariant::Hotel, PageRequest::unpaginated())
        .unwrap();
    assert_eq!(active.total, 1);
    assert_eq!(active.items[0].id, kept.id);

    let by_user = repo
        .list_by_user(BookingVariant::Hotel, "u1", PageRequest::unpaginated())
        .unwrap();
    assert_eq!(by_user.total, 1);

    let by_provider = repo
        .list_by_provider(BookingVariant::Hotel, "h1", PageRequest::unpaginated())
        .unwrap();
    assert_eq!(by_provider.total, 1);

    let deleted = repo
        .list_deleted(BookingVariant::Hotel, PageRequest::unpaginated())
        .unwrap();
    assert_eq!(deleted.total, 1);
    assert_eq!(deleted.items[0].id, removed.id);
    assert!(deleted.items[0].deleted_at.is_some());

    assert!(repo
        .get_booking(BookingVariant::Hotel, removed.id, false)
        .unwrap()
        .is_none());
    assert!(repo
        .get_booking(BookingVariant::Hotel, removed.id, true)
        .unwrap()
        .is_some());
}

#[test]
fn delete_missing_or_deleted_booking_is_rejected() {
    let repo = repo();
    let missing = Uuid::new_v4();
    let err = repo
        .soft_delete_booking(BookingVariant::Restaurant, missing)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id, .. } if id == missing));

    let booking = repo
        .create_booking(BookingVariant::Restaurant, &restaurant("u1", "r1"))
        .unwrap();
    repo.soft_delete_booking(BookingVariant::Restaurant, booking.id)
        .unwrap();
    let err = repo
        .soft_delete_booking(BookingVariant::Restaurant, booking.id)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::AlreadyDeleted {
            variant: BookingVariant::Restaurant,
            ..
        }
    ));
}

#[test]
fn update_replaces_mutable_fields_and_keeps_created_at() {
    let repo = repo();
    let stored = repo
        .create_booking(BookingVariant::Hotel, &hotel("u1", "h1"))
        .unwrap();

    let mut changed = stored.clone();
    changed.will_leave = Some(date(2025, 6, 8));
    changed.number_of_people = 3;
    changed.created_at = None;
    let updated = repo.update_booking(BookingVariant::Hotel, &changed).unwrap();

    assert_eq!(updated.created_at, stored.created_at);
    assert_eq!(updated.will_leave, Some(date(2025, 6, 8)));
    assert_eq!(updated.number_of_people, 3);
    assert!(updated.updated_at.is_some());
}

#[test]
fn update_missing_or_deleted_booking_is_rejected() {
    let repo = repo();
    let ghost = hotel("u1", "h1");
    let err = repo.update_booking(BookingVariant::Hotel, &ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));

    let stored = repo
        .create_booking(BookingVariant::Hotel, &ghost)
        .unwrap();
    repo.soft_delete_booking(BookingVariant::Hotel, stored.id)
        .unwrap();
    let err = repo.update_booking(BookingVariant::Hotel, &stored).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyDeleted { .. }));
}

#[test]
fn variants_are_stored_independently() {
    let repo = repo();
    let booking = restaurant("u1", "x1");
    repo.create_booking(BookingVariant::Restaurant, &booking)
        .unwrap();
    repo.create_booking(BookingVariant::Attraction, &booking)
        .unwrap();

    repo.soft_delete_booking(BookingVariant::Restaurant, booking.id)
        .unwrap();

    assert!(repo
        .get_booking(BookingVariant::Attraction, booking.id, false)
        .unwrap()
        .is_some());
    let hotels = repo
        .list_active(BookingVariant::Hotel, PageRequest::unpaginated())
        .unwrap();
    assert_eq!(hotels.total, 0);
}

#[test]
fn hotel_booking_lifecycle() {
    let repo = repo();
    let id = Uuid::new_v4();
    let booking = Booking::new(id, "U1", "H1", date(2025, 6, 1), 2).with_departure(date(2025, 6, 5));
    repo.create_booking(BookingVariant::Hotel, &booking).unwrap();

    let listed = repo
        .list_by_user(BookingVariant::Hotel, "U1", PageRequest::new(10, 0))
        .unwrap();
    assert_eq!(listed.total, 1);
    let mut round_trip = listed.items[0].clone();
    assert!(round_trip.created_at.is_some());
    round_trip.created_at = None;
    round_trip.updated_at = None;
    round_trip.deleted_at = None;
    assert_eq!(round_trip, booking);

    let mut canceled = listed.items[0].clone();
    canceled.is_canceled = true;
    canceled.reason = "plans changed".to_string();
    let updated = repo.update_booking(BookingVariant::Hotel, &canceled).unwrap();
    assert!(updated.is_canceled);
    assert_eq!(updated.reason, "plans changed");
    assert!(updated.is_active());

    repo.soft_delete_booking(BookingVariant::Hotel, id).unwrap();
    let err = repo.soft_delete_booking(BookingVariant::Hotel, id).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyDeleted { .. }));

    let deleted = repo
        .list_deleted(BookingVariant::Hotel, PageRequest::new(10, 0))
        .unwrap();
    assert_eq!(deleted.total, 1);
    assert_eq!(deleted.items.len(), 1);
    assert_eq!(deleted.items[0].id, id);
    assert!(deleted.items[0].is_canceled);

    let active = repo
        .list_by_user(BookingVariant::Hotel, "U1", PageRequest::new(10, 0))
        .unwrap();
    assert_eq!(active.total, 0);
}

#[test]
fn concurrent_deletes_have_exactly_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig {
        pool_size: 4,
        ..PoolConfig::default()
    };
    let pool = open_pool(dir.path().join("booking.db"), &config).unwrap();
    let repo = SqliteBookingRepository::try_new(pool).unwrap();
    let booking = repo
        .create_booking(BookingVariant::Attraction, &restaurant("u1", "a1"))
        .unwrap();

    let results: Vec<Result<(), RepoError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = repo.clone();
                scope.spawn(move || repo.soft_delete_booking(BookingVariant::Attraction, booking.id))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| matches!(err, RepoError::AlreadyDeleted { .. })));
}

#[test]
fn try_new_rejects_unmigrated_pool() {
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(SqliteConnectionManager::memory())
        .unwrap();

    let err = SqliteBookingRepository::try_new(pool)
        .err()
        .expect("unmigrated pool should be rejected");
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn call_timeout_bounds_lock_waits_and_pool_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig {
        pool_size: 2,
        call_timeout: Duration::from_millis(150),
    };
    let pool = open_pool(dir.path().join("booking.db"), &config).unwrap();
    let repo = SqliteBookingRepository::try_new(pool.clone()).unwrap();
    let booking = repo
        .create_booking(BookingVariant::Restaurant, &restaurant("u1", "r1"))
        .unwrap();

    let writer = pool.get().unwrap();
    writer.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let started_at = Instant::now();
    let err = repo
        .soft_delete_booking(BookingVariant::Restaurant, booking.id)
        .unwrap_err();
    let waited = started_at.elapsed();
    assert!(matches!(
        err,
        RepoError::Execution {
            operation: "delete",
            ..
        }
    ));
    assert!(waited >= Duration::from_millis(100), "{waited:?}");
    assert!(waited < Duration::from_secs(3), "{waited:?}");

    let idle = pool.get().unwrap();
    let started_at = Instant::now();
    let err = repo
        .list_active(BookingVariant::Restaurant, PageRequest::unpaginated())
        .unwrap_err();
    let waited = started_at.elapsed();
    assert!(matches!(
        err,
        RepoError::Execution {
            operation: "list",
            ..
        }
    ));
    assert!(waited >= Duration::from_millis(100), "{waited:?}");
    assert!(waited < Duration::from_secs(3), "{waited:?}");

    drop(idle);
    writer.execute_batch("ROLLBACK;").unwrap();
    drop(writer);
    let active = repo
        .get_booking(BookingVariant::Restaurant, booking.id, false)
        .unwrap();
    assert!(active.is_some());
}
