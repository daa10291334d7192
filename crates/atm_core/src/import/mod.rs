//! Bulk creation of ATM records from CSV uploads.
//!
//! # Responsibility
//! - Accept an uploaded CSV file and create one record per valid row.
//! - Report per-row validation failures without aborting the batch.
//!
//! # See also
//! - `model::schema` for the column names and constraints rows are
//!   checked against.

pub mod atm_import;
pub mod csv;
