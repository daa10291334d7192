//! ATM domain model.
//!
//! # Responsibility
//! - Define field specifications and the builders producing them.
//! - Assemble the `atm` record type schema.
//! - Define the ATM record, its configuration sub-type and value objects.
//!
//! # Invariants
//! - Schemas are built once and never mutated afterwards.
//! - Per-day open hours are keyed by `WeekDay`, never by ad-hoc strings.

pub mod atm;
pub mod atm_type;
pub mod field;
pub mod open_hours;
pub mod schema;
pub mod weekday;
