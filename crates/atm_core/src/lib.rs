//! Core library for the `atm` record type: field schema, record model,
//! access policy, SQLite persistence and CSV import.

pub mod access;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::permission::{parse_permission, AtmPermission, PermissionError};
pub use access::policy::{
    AccessContext, AccessResult, Account, AccountPermissions, AtmAccessPolicy, EntityOperation,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use import::atm_import::{
    AtmImporter, ImportError, ImportOptions, ImportReport, ImportUpload, ImportValidationError,
    RowOutcome,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::atm::{Atm, AtmId, AtmValidationError, Ownable, TimestampTracked, UserId};
pub use model::atm_type::{AtmType, AtmTypeValidationError};
pub use model::field::{FieldKind, FieldSpec, FieldSpecError};
pub use model::open_hours::OpenHours;
pub use model::schema::{
    atm_schema, atm_schema_shared, RecordTypeSchema, SchemaError, StandardFieldTypeRegistry,
};
pub use model::weekday::WeekDay;
pub use repo::atm_repo::{
    AtmListQuery, AtmRepository, RepoError, RepoResult, SaveStatus, SqliteAtmRepository,
};
pub use repo::atm_type_repo::{AtmTypeRepository, SqliteAtmTypeRepository};
pub use service::atm_service::{AtmService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
