//! Core use-case services.
//!
//! # Responsibility
//! - Wrap repository calls into use-case level APIs.
//! - Keep transport layers decoupled from storage details.

pub mod booking_service;
