//! Access control for ATM records.
//!
//! Operation checks map to permission sets combined with OR. A missing
//! permission yields `Neutral` so other policy layers may still grant.

pub mod permission;
pub mod policy;
