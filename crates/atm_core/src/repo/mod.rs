//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for ATM records and
//!   ATM types.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Atm::validate()` /
//!   `AtmType::validate()` before persistence.
//! - Repositories only accept connections migrated to the latest schema.

use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::Connection;

pub mod atm_repo;
pub mod atm_type_repo;

pub use atm_repo::{RepoError, RepoResult};

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
