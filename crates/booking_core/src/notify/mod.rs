//! Commit notifications for downstream consumers.
//!
//! # Responsibility
//! - Define the producer seam invoked after a booking is committed.
//! - Keep notification failures off the write path.
//!
//! # Invariants
//! - Producer errors are logged, never returned to the caller of a write.

pub mod producer;
