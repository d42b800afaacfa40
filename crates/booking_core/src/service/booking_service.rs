//! Booking use-case service.
//!
//! # Responsibility
//! - Provide one entry point per booking operation for every variant.
//! - Stamp `created_at` on create and `updated_at` on update.
//! - Emit debug-level `event=service_call` enter/exit lines per operation.
//!
//! # Invariants
//! - No validation or branching beyond timestamp stamping.
//! - Repository errors are returned unchanged.

use crate::model::booking::{now_utc, Booking, BookingId, BookingVariant, UserReference};
use crate::model::page::{Page, PageRequest};
use crate::repo::booking_repo::{BookingRepository, RepoResult};
use chrono::{DateTime, Utc};
use log::debug;
use std::time::Instant;

/// Source of "now" used for timestamp stamping.
pub type Clock = fn() -> DateTime<Utc>;

/// Use-case service wrapper for booking operations.
pub struct BookingService<R: BookingRepository> {
    repo: R,
    clock: Clock,
}

impl<R: BookingRepository> BookingService<R> {
    /// Creates a service stamping timestamps with the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_utc)
    }

    /// Creates a service with an explicit clock.
    pub fn with_clock(repo: R, clock: Clock) -> Self {
        Self { repo, clock }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates a booking, stamping `created_at` when the caller left it unset.
    pub fn create(&self, variant: BookingVariant, booking: &Booking) -> RepoResult<Booking> {
        let mut booking = booking.clone();
        if booking.created_at.is_none() {
            booking.created_at = Some((self.clock)());
        }
        traced(variant, "create", || self.repo.create_booking(variant, &booking))
    }

    /// Lists a user's active bookings with the total active count.
    pub fn get_all_by_user_id(
        &self,
        variant: BookingVariant,
        user_id: &str,
        page: PageRequest,
    ) -> RepoResult<Page<Booking>> {
        traced(variant, "get_all_by_user_id", || {
            self.repo.list_by_user(variant, user_id, page)
        })
    }

    /// Lists who holds active bookings for a provider.
    pub fn get_all_by_provider_id(
        &self,
        variant: BookingVariant,
        hra_id: &str,
        page: PageRequest,
    ) -> RepoResult<Page<UserReference>> {
        traced(variant, "get_all_by_provider_id", || {
            self.repo.list_by_provider(variant, hra_id, page)
        })
    }

    /// Admin listing of active bookings.
    pub fn list(&self, variant: BookingVariant, page: PageRequest) -> RepoResult<Page<Booking>> {
        traced(variant, "list", || self.repo.list_active(variant, page))
    }

    /// Admin listing of soft-deleted bookings.
    pub fn list_deleted(
        &self,
        variant: BookingVariant,
        page: PageRequest,
    ) -> RepoResult<Page<Booking>> {
        traced(variant, "list_deleted", || self.repo.list_deleted(variant, page))
    }

    /// Updates a booking, always refreshing `updated_at`.
    pub fn update(&self, variant: BookingVariant, booking: &Booking) -> RepoResult<Booking> {
        let mut booking = booking.clone();
        booking.updated_at = Some((self.clock)());
        traced(variant, "update", || self.repo.update_booking(variant, &booking))
    }

    /// Soft-deletes a booking. Storage stamps `deleted_at`.
    pub fn delete(&self, variant: BookingVariant, id: BookingId) -> RepoResult<()> {
        traced(variant, "delete", || self.repo.soft_delete_booking(variant, id))
    }
}

/// Runs one repository call between debug-level enter/exit lines.
fn traced<T>(
    variant: BookingVariant,
    operation: &'static str,
    call: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    let started_at = Instant::now();
    debug!("event=service_call module=service status=start variant={variant} operation={operation}");
    let result = call();
    let status = if result.is_ok() { "ok" } else { "error" };
    debug!(
        "event=service_call module=service status={status} variant={variant} operation={operation} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::traced;
    use crate::model::booking::BookingVariant;
    use crate::repo::booking_repo::RepoError;

    #[test]
    fn traced_runs_the_call_once_and_returns_its_result() {
        let mut calls = 0;
        let ok = traced(BookingVariant::Hotel, "list", || {
            calls += 1;
            Ok(3)
        });
        assert_eq!(ok.unwrap(), 3);
        assert_eq!(calls, 1);

        let err = traced::<()>(BookingVariant::Attraction, "delete", || {
            Err(RepoError::InvalidArgument("bad id".to_string()))
        });
        assert!(matches!(err, Err(RepoError::InvalidArgument(_))));
    }
}
