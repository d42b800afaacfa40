//! Core domain logic for the booking record-keeper.
//! This crate owns the booking model, storage and service layers.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{BookingConfig, ConfigError};
pub use db::{open_pool, open_pool_in_memory, ConnectionPool, DbError, PoolConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::booking::{
    now_utc, Booking, BookingId, BookingValidationError, BookingVariant, UserReference,
};
pub use model::page::{Page, PageRequest};
pub use notify::producer::{
    notify_commit, CommitProducer, LogProducer, NoopProducer, NotifyError, NotifyResult,
};
pub use repo::booking_repo::{
    parse_booking_id, parse_calendar_date, BookingRepository, RepoError, RepoResult,
    SqliteBookingRepository,
};
pub use service::booking_service::{BookingService, Clock};

/// Minimal health-check API for transport smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
