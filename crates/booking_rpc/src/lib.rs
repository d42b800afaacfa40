//! Transport mapping for the booking store.
//!
//! Wire messages, per-call spans and a JSON method dispatcher over
//! [`booking_core::BookingService`].

pub mod api;
pub mod dispatch;
pub mod span;
pub mod wire;

pub use api::BookingRpc;
pub use dispatch::{Operation, RpcError, RpcRequest, RpcResponse, StatusCode};
pub use span::CallSpan;
pub use wire::{DeleteRes, GeneralBook, IdReq, ListBookingsRes, ListReq, ListReqById, ListUserIdsRes};
