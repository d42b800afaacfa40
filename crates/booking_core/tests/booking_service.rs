use booking_core::db::{open_pool_in_memory, PoolConfig};
use booking_core::{
    Booking, BookingService, BookingVariant, PageRequest, RepoError, SqliteBookingRepository,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 9, 30, 0).unwrap()
}

fn service() -> BookingService<SqliteBookingRepository> {
    let pool = open_pool_in_memory(&PoolConfig::default()).unwrap();
    let repo = SqliteBookingRepository::try_new(pool).unwrap();
    BookingService::with_clock(repo, fixed_clock)
}

fn visit() -> Booking {
    Booking::new(
        Uuid::new_v4(),
        "u1",
        "a1",
        NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
        3,
    )
}

#[test]
fn create_stamps_created_at_from_clock() {
    let service = service();
    let stored = service.create(BookingVariant::Attraction, &visit()).unwrap();
    assert_eq!(stored.created_at, Some(fixed_clock()));
    assert_eq!(stored.updated_at, None);
}

#[test]
fn create_keeps_caller_supplied_created_at() {
    let service = service();
    let supplied = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut booking = visit();
    booking.created_at = Some(supplied);

    let stored = service.create(BookingVariant::Attraction, &booking).unwrap();
    assert_eq!(stored.created_at, Some(supplied));
}

#[test]
fn update_always_stamps_updated_at() {
    let service = service();
    let mut booking = service.create(BookingVariant::Attraction, &visit()).unwrap();
    booking.updated_at = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    booking.number_of_people = 5;

    let updated = service.update(BookingVariant::Attraction, &booking).unwrap();
    assert_eq!(updated.updated_at, Some(fixed_clock()));
    assert_eq!(updated.number_of_people, 5);
}

#[test]
fn delete_moves_booking_to_deleted_listing() {
    let service = service();
    let booking = service.create(BookingVariant::Attraction, &visit()).unwrap();
    service.delete(BookingVariant::Attraction, booking.id).unwrap();

    let active = service
        .list(BookingVariant::Attraction, PageRequest::unpaginated())
        .unwrap();
    let deleted = service
        .list_deleted(BookingVariant::Attraction, PageRequest::unpaginated())
        .unwrap();
    assert_eq!(active.total, 0);
    assert_eq!(deleted.total, 1);

    let err = service
        .delete(BookingVariant::Attraction, booking.id)
        .unwrap_err();
    assert!(matches!(err, RepoError::AlreadyDeleted { .. }));
}

#[test]
fn user_and_provider_listings_pass_through() {
    let service = service();
    service.create(BookingVariant::Attraction, &visit()).unwrap();

    let by_user = service
        .get_all_by_user_id(BookingVariant::Attraction, "u1", PageRequest::new(10, 0))
        .unwrap();
    let by_provider = service
        .get_all_by_provider_id(BookingVariant::Attraction, "a1", PageRequest::new(10, 0))
        .unwrap();
    assert_eq!(by_user.total, 1);
    assert_eq!(by_provider.items[0].user_id, "u1");
}
