//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into access-checked use-case APIs.
//! - Shape records into tabular listings for list renderers.

pub mod atm_service;
pub mod listing;
