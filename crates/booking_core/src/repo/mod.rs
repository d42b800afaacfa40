//! Repository layer: booking persistence behind a use-case oriented contract.
//!
//! # Responsibility
//! - Define the booking data access contract shared by all variants.
//! - Isolate SQLite query details from service and transport layers.
//!
//! # Invariants
//! - Repository writes enforce `Booking::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyDeleted`)
//!   in addition to storage-engine errors.

pub mod booking_repo;
