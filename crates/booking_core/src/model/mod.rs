//! Domain model for booking records.
//!
//! # Responsibility
//! - Define the single booking shape replicated across three variants.
//! - Keep dates as calendar values and timestamps as UTC instants.
//!
//! # Invariants
//! - Every booking is identified by a caller-supplied `BookingId`.
//! - Deletion is a soft-delete tombstone (`deleted_at`), never a hard delete.

pub mod booking;
pub mod page;
