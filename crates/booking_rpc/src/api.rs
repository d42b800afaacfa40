//! Typed transport API, one method per booking operation.
//!
//! # Responsibility
//! - Map wire messages to domain records and results back to wire messages.
//! - Wrap every call in a [`CallSpan`] tagged with its identifying fields.
//! - Hand committed records to the producer after a successful create.
//!
//! # Invariants
//! - Repository errors are returned unchanged.
//! - Producer failures never fail the call.

use crate::span::CallSpan;
use crate::wire::{
    DeleteRes, GeneralBook, IdReq, ListBookingsRes, ListReq, ListReqById, ListUserIdsRes,
};
use booking_core::{
    notify_commit, parse_booking_id, BookingRepository, BookingService, BookingVariant,
    CommitProducer, RepoResult,
};

/// Booking transport over a service and a commit producer.
pub struct BookingRpc<R: BookingRepository, P: CommitProducer> {
    service: BookingService<R>,
    producer: P,
}

impl<R: BookingRepository, P: CommitProducer> BookingRpc<R, P> {
    pub fn new(service: BookingService<R>, producer: P) -> Self {
        Self { service, producer }
    }

    pub fn service(&self) -> &BookingService<R> {
        &self.service
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    /// Stores a new booking and notifies the producer keyed by booking id.
    pub fn create(&self, variant: BookingVariant, req: &GeneralBook) -> RepoResult<GeneralBook> {
        let span = CallSpan::new(variant, "create")
            .attr("created_id", &req.id)
            .enter();

        let result = req
            .to_booking(variant)
            .and_then(|booking| self.service.create(variant, &booking));
        if let Ok(stored) = &result {
            notify_commit(&self.producer, variant, &stored.id.to_string(), stored);
        }

        span.finish(result)
            .map(|stored| GeneralBook::from_booking(variant, &stored))
    }

    pub fn get_all_by_user_id(
        &self,
        variant: BookingVariant,
        req: &ListReqById,
    ) -> RepoResult<ListBookingsRes> {
        let span = CallSpan::new(variant, "get_all_by_user_id")
            .attr("user_id", &req.id)
            .attr("limit", req.limit)
            .attr("offset", req.offset)
            .enter();
        let result = self.service.get_all_by_user_id(variant, &req.id, req.page());
        span.finish(result)
            .map(|page| ListBookingsRes::from_page(variant, page))
    }

    /// Lists who booked a provider; never returns booking detail.
    pub fn get_all_by_provider_id(
        &self,
        variant: BookingVariant,
        req: &ListReqById,
    ) -> RepoResult<ListUserIdsRes> {
        let span = CallSpan::new(variant, "get_all_by_provider_id")
            .attr("hra_id", &req.id)
            .attr("limit", req.limit)
            .attr("offset", req.offset)
            .enter();
        let result = self
            .service
            .get_all_by_provider_id(variant, &req.id, req.page());
        span.finish(result).map(ListUserIdsRes::from)
    }

    pub fn list(&self, variant: BookingVariant, req: &ListReq) -> RepoResult<ListBookingsRes> {
        let span = CallSpan::new(variant, "list")
            .attr("limit", req.limit)
            .attr("offset", req.offset)
            .enter();
        let result = self.service.list(variant, req.page());
        span.finish(result)
            .map(|page| ListBookingsRes::from_page(variant, page))
    }

    pub fn list_deleted(
        &self,
        variant: BookingVariant,
        req: &ListReq,
    ) -> RepoResult<ListBookingsRes> {
        let span = CallSpan::new(variant, "list_deleted")
            .attr("limit", req.limit)
            .attr("offset", req.offset)
            .enter();
        let result = self.service.list_deleted(variant, req.page());
        span.finish(result)
            .map(|page| ListBookingsRes::from_page(variant, page))
    }

    pub fn update(&self, variant: BookingVariant, req: &GeneralBook) -> RepoResult<GeneralBook> {
        let span = CallSpan::new(variant, "update").attr("id", &req.id).enter();
        let result = req
            .to_booking(variant)
            .and_then(|booking| self.service.update(variant, &booking));
        span.finish(result)
            .map(|stored| GeneralBook::from_booking(variant, &stored))
    }

    pub fn delete(&self, variant: BookingVariant, req: &IdReq) -> RepoResult<DeleteRes> {
        let span = CallSpan::new(variant, "delete").attr("id", &req.id).enter();
        let result = parse_booking_id(&req.id).and_then(|id| self.service.delete(variant, id));
        span.finish(result).map(|()| DeleteRes { success: true })
    }
}
