//! Per-call span logging.
//!
//! # Invariants
//! - Every finished span logs exactly one start and one end line.
//! - End lines carry `duration_ms` and, on failure, a stable `error_code`.

use crate::dispatch::StatusCode;
use booking_core::{BookingVariant, RepoResult};
use log::{info, warn};
use std::fmt::Display;
use std::time::Instant;

/// Logged scope around one transport call.
#[derive(Debug)]
pub struct CallSpan {
    method: String,
    attributes: String,
    started_at: Instant,
}

impl CallSpan {
    pub fn new(variant: BookingVariant, operation: &str) -> Self {
        Self {
            method: format!("{}.{operation}", variant.label()),
            attributes: String::new(),
            started_at: Instant::now(),
        }
    }

    /// Adds an identifying attribute to both span lines.
    pub fn attr(mut self, key: &str, value: impl Display) -> Self {
        self.attributes.push_str(&format!(" {key}={value}"));
        self
    }

    /// Logs the start line and restarts the clock.
    pub fn enter(mut self) -> Self {
        self.started_at = Instant::now();
        info!(
            "event=rpc_call module=rpc status=start method={}{}",
            self.method, self.attributes
        );
        self
    }

    /// Logs the end line for `result` and hands it back unchanged.
    pub fn finish<T>(self, result: RepoResult<T>) -> RepoResult<T> {
        let duration_ms = self.started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!(
                "event=rpc_call module=rpc status=ok method={}{} duration_ms={}",
                self.method, self.attributes, duration_ms
            ),
            Err(err) => warn!(
                "event=rpc_call module=rpc status=error method={}{} duration_ms={} error_code={} error={}",
                self.method,
                self.attributes,
                duration_ms,
                StatusCode::of(err).as_str(),
                err
            ),
        }
        result
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}
