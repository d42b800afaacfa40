//! Booking domain model shared by hotel/restaurant/attraction variants.
//!
//! # Responsibility
//! - Define the one record shape stored three times, once per variant table.
//! - Describe each variant (table, label, whether a departure date applies).
//! - Provide shape validation used by storage write paths.
//!
//! # Invariants
//! - `id` is supplied by the caller and never changes after creation.
//! - `will_leave` is present for hotel bookings only.
//! - `deleted_at` is the tombstone; once set it is never cleared.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one booking row.
pub type BookingId = Uuid;

/// One of the three parallel booking kinds.
///
/// Every variant has the same operations and table shape; only the table
/// and the meaning of `will_leave` differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingVariant {
    /// Stay with arrival and departure dates.
    Hotel,
    /// Single-moment table reservation.
    Restaurant,
    /// Single-moment visit.
    Attraction,
}

impl BookingVariant {
    pub const ALL: [BookingVariant; 3] = [
        BookingVariant::Hotel,
        BookingVariant::Restaurant,
        BookingVariant::Attraction,
    ];

    /// Backing table. Chosen from this fixed set only, never from input.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Hotel => "users_hotels_booking",
            Self::Restaurant => "users_restaurants_booking",
            Self::Attraction => "users_attractions_booking",
        }
    }

    /// Lowercase label used in log lines and RPC method names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Hotel => "hotel",
            Self::Restaurant => "restaurant",
            Self::Attraction => "attraction",
        }
    }

    /// Whether `will_leave` carries meaning for this variant.
    pub fn tracks_departure(self) -> bool {
        matches!(self, Self::Hotel)
    }

    /// Parses a variant label as produced by [`BookingVariant::label`].
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.label() == value)
    }
}

impl Display for BookingVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical booking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    /// Opaque reference to the requester.
    pub user_id: String,
    /// Opaque reference to the hotel, restaurant or attraction.
    pub hra_id: String,
    pub will_arrive: NaiveDate,
    /// Hotel only.
    pub will_leave: Option<NaiveDate>,
    pub number_of_people: i64,
    /// Independent of soft deletion.
    pub is_canceled: bool,
    /// Free text, usually the cancellation rationale.
    pub reason: String,
    /// Stamped by the service layer on create.
    pub created_at: Option<DateTime<Utc>>,
    /// Stamped by the service layer on update.
    pub updated_at: Option<DateTime<Utc>>,
    /// Set by storage on soft delete.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Creates an active, not yet stamped booking with a caller-provided id.
    pub fn new(
        id: BookingId,
        user_id: impl Into<String>,
        hra_id: impl Into<String>,
        will_arrive: NaiveDate,
        number_of_people: i64,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            hra_id: hra_id.into(),
            will_arrive,
            will_leave: None,
            number_of_people,
            is_canceled: false,
            reason: String::new(),
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Sets the departure date (hotel stays).
    pub fn with_departure(mut self, will_leave: NaiveDate) -> Self {
        self.will_leave = Some(will_leave);
        self
    }

    /// Returns whether the record is still active (not soft-deleted).
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Validates record shape for the given variant.
    ///
    /// # Errors
    /// - `number_of_people` is not positive.
    /// - A hotel booking lacks `will_leave`, or leaves before it arrives.
    /// - A restaurant/attraction booking carries `will_leave`.
    pub fn validate(&self, variant: BookingVariant) -> Result<(), BookingValidationError> {
        if self.number_of_people < 1 {
            return Err(BookingValidationError::NonPositiveHeadcount(
                self.number_of_people,
            ));
        }

        match (variant.tracks_departure(), self.will_leave) {
            (true, None) => Err(BookingValidationError::MissingDeparture),
            (true, Some(leave)) if leave < self.will_arrive => {
                Err(BookingValidationError::DepartureBeforeArrival {
                    will_arrive: self.will_arrive,
                    will_leave: leave,
                })
            }
            (false, Some(_)) => Err(BookingValidationError::UnexpectedDeparture(variant)),
            _ => Ok(()),
        }
    }
}

/// Provider-side projection: who booked, without the booking detail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserReference {
    pub user_id: String,
}

/// Shape violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingValidationError {
    NonPositiveHeadcount(i64),
    MissingDeparture,
    DepartureBeforeArrival {
        will_arrive: NaiveDate,
        will_leave: NaiveDate,
    },
    UnexpectedDeparture(BookingVariant),
}

impl Display for BookingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveHeadcount(value) => {
                write!(f, "number_of_people must be positive, got {value}")
            }
            Self::MissingDeparture => write!(f, "will_leave is required for hotel bookings"),
            Self::DepartureBeforeArrival {
                will_arrive,
                will_leave,
            } => write!(
                f,
                "will_leave {will_leave} is earlier than will_arrive {will_arrive}"
            ),
            Self::UnexpectedDeparture(variant) => {
                write!(f, "will_leave is not accepted for {variant} bookings")
            }
        }
    }
}

impl Error for BookingValidationError {}

/// Current time truncated to milliseconds, the precision storage keeps.
pub fn now_utc() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
