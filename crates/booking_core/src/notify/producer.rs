//! Commit producer contract and in-process implementations.
//!
//! # Responsibility
//! - Expose one publish method per booking variant, keyed by booking id.
//! - Provide a logging producer that serializes records as JSON messages.
//!
//! # Invariants
//! - `notify_commit` never fails; errors are downgraded to `warn` logs.

use crate::model::booking::{Booking, BookingVariant};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

pub type NotifyResult = Result<(), NotifyError>;

/// Failure to hand a commit message to the sink.
#[derive(Debug)]
pub enum NotifyError {
    Serialize(serde_json::Error),
    Closed,
    Sink(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "failed to serialize commit message: {err}"),
            Self::Closed => write!(f, "producer is closed"),
            Self::Sink(message) => write!(f, "commit sink rejected message: {message}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Closed | Self::Sink(_) => None,
        }
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Sink for committed booking records.
pub trait CommitProducer: Send + Sync {
    fn produce_hotel_content(&self, key: &str, value: &Booking) -> NotifyResult;
    fn produce_restaurant_content(&self, key: &str, value: &Booking) -> NotifyResult;
    fn produce_attraction_content(&self, key: &str, value: &Booking) -> NotifyResult;
    /// Releases sink resources. Later produce calls may fail with `Closed`.
    fn close(&self);
}

/// Hands a committed record to the producer method for `variant`.
///
/// # Side effects
/// - Logs `event=commit_notify` with status `error` on failure.
pub fn notify_commit<P: CommitProducer + ?Sized>(
    producer: &P,
    variant: BookingVariant,
    key: &str,
    value: &Booking,
) {
    let result = match variant {
        BookingVariant::Hotel => producer.produce_hotel_content(key, value),
        BookingVariant::Restaurant => producer.produce_restaurant_content(key, value),
        BookingVariant::Attraction => producer.produce_attraction_content(key, value),
    };

    if let Err(err) = result {
        warn!(
            "event=commit_notify module=notify status=error variant={} key={} error={}",
            variant, key, err
        );
    }
}

/// Producer that discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProducer;

impl CommitProducer for NoopProducer {
    fn produce_hotel_content(&self, _key: &str, _value: &Booking) -> NotifyResult {
        Ok(())
    }

    fn produce_restaurant_content(&self, _key: &str, _value: &Booking) -> NotifyResult {
        Ok(())
    }

    fn produce_attraction_content(&self, _key: &str, _value: &Booking) -> NotifyResult {
        Ok(())
    }

    fn close(&self) {}
}

/// Producer that writes each commit message to the log as JSON.
#[derive(Debug, Default)]
pub struct LogProducer {
    closed: AtomicBool,
}

impl LogProducer {
    pub fn new() -> Self {
        Self::default()
    }

    fn produce(&self, topic: &str, key: &str, value: &Booking) -> NotifyResult {
        if self.closed.load(Ordering::Acquire) {
            return Err(NotifyError::Closed);
        }
        let payload = serde_json::to_string(value)?;
        info!(
            "event=commit_notify module=notify status=ok topic={} key={} value={}",
            topic, key, payload
        );
        Ok(())
    }
}

impl CommitProducer for LogProducer {
    fn produce_hotel_content(&self, key: &str, value: &Booking) -> NotifyResult {
        self.produce("booking.hotel", key, value)
    }

    fn produce_restaurant_content(&self, key: &str, value: &Booking) -> NotifyResult {
        self.produce("booking.restaurant", key, value)
    }

    fn produce_attraction_content(&self, key: &str, value: &Booking) -> NotifyResult {
        self.produce("booking.attraction", key, value)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("event=producer_close module=notify status=ok");
        }
    }
}
