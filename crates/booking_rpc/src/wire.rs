//! Wire messages and their mapping to domain records.
//!
//! # Invariants
//! - Dates travel as `YYYY-MM-DD`; an empty `will_leave` means absent.
//! - Timestamps travel as RFC 3339 UTC strings, empty when unset.
//! - Inbound timestamps are ignored; the service layer stamps them.
//! - Restaurant and attraction messages never carry `will_leave`.

use booking_core::{
    parse_booking_id, parse_calendar_date, Booking, BookingVariant, Page, PageRequest, RepoResult,
    UserReference,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Booking as seen by remote callers, shared by all three variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralBook {
    pub id: String,
    pub user_id: String,
    pub hra_id: String,
    pub will_arrive: String,
    pub will_leave: String,
    pub number_of_people: i64,
    pub is_canceled: bool,
    pub reason: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: String,
}

impl GeneralBook {
    pub fn from_booking(variant: BookingVariant, booking: &Booking) -> Self {
        let will_leave = booking
            .will_leave
            .filter(|_| variant.tracks_departure())
            .map(|date| date.to_string())
            .unwrap_or_default();

        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.clone(),
            hra_id: booking.hra_id.clone(),
            will_arrive: booking.will_arrive.to_string(),
            will_leave,
            number_of_people: booking.number_of_people,
            is_canceled: booking.is_canceled,
            reason: booking.reason.clone(),
            created_at: format_timestamp(booking.created_at),
            updated_at: format_timestamp(booking.updated_at),
            deleted_at: format_timestamp(booking.deleted_at),
        }
    }

    /// Parses the message into a domain record for `variant`.
    ///
    /// # Errors
    /// - `InvalidArgument` for a malformed id or date.
    pub fn to_booking(&self, variant: BookingVariant) -> RepoResult<Booking> {
        let id = parse_booking_id(&self.id)?;
        let will_arrive = parse_calendar_date(&self.will_arrive, "will_arrive")?;
        let mut booking = Booking::new(
            id,
            self.user_id.clone(),
            self.hra_id.clone(),
            will_arrive,
            self.number_of_people,
        );
        booking.is_canceled = self.is_canceled;
        booking.reason = self.reason.clone();

        if variant.tracks_departure() && !self.will_leave.is_empty() {
            booking.will_leave = Some(parse_calendar_date(&self.will_leave, "will_leave")?);
        }
        Ok(booking)
    }
}

/// Listing keyed by a user or provider id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListReqById {
    pub id: String,
    pub limit: u64,
    pub offset: u64,
}

impl ListReqById {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListReq {
    pub limit: u64,
    pub offset: u64,
}

impl ListReq {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdReq {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBookingsRes {
    pub bookings: Vec<GeneralBook>,
    /// Rows matching the filter, ignoring pagination.
    pub count: i64,
}

impl ListBookingsRes {
    pub fn from_page(variant: BookingVariant, page: Page<Booking>) -> Self {
        Self {
            count: page.total,
            bookings: page
                .items
                .iter()
                .map(|booking| GeneralBook::from_booking(variant, booking))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUserIdsRes {
    pub user_ids: Vec<String>,
    pub count: i64,
}

impl From<Page<UserReference>> for ListUserIdsRes {
    fn from(page: Page<UserReference>) -> Self {
        Self {
            count: page.total,
            user_ids: page
                .items
                .into_iter()
                .map(|reference| reference.user_id)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRes {
    pub success: bool,
}

fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|value| value.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
