//! ATM record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist `Atm` records into the `atms` table, one column per schema
//!   field.
//! - Run the record pre-save hook on every write.
//! - The caller's record only changes once the write succeeded.
//!
//! # Invariants
//! - `save` inserts records without an id and updates records with one.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing order is `changed DESC, id ASC`.

use crate::db::DbError;
use crate::model::atm::{
    Atm, AtmId, AtmValidationError, Ownable, TimestampTracked, ANONYMOUS_USER_ID,
};
use crate::model::atm_type::AtmTypeValidationError;
use crate::model::weekday::{open_hours_field_name, HoursBound, WeekDay};
use crate::repo::ensure_connection_ready;
use once_cell::sync::Lazy;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const FIXED_COLUMNS: [&str; 14] = [
    "uuid",
    "bundle",
    "status",
    "uid",
    "created",
    "changed",
    "device_type",
    "city",
    "address",
    "district",
    "gps_lat",
    "gps_lon",
    "brand",
    "fee",
];

/// Writable columns in bind order. `id` is assigned by SQLite.
static WRITE_COLUMNS: Lazy<Vec<String>> = Lazy::new(|| {
    let mut columns: Vec<String> = FIXED_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect();
    for day in WeekDay::ALL {
        for bound in HoursBound::BOTH {
            columns.push(open_hours_field_name(day, bound));
        }
    }
    columns
});

static SELECT_SQL: Lazy<String> =
    Lazy::new(|| format!("SELECT id, {} FROM atms", WRITE_COLUMNS.join(", ")));

static INSERT_SQL: Lazy<String> = Lazy::new(|| {
    let placeholders = (1..=WRITE_COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO atms ({}) VALUES ({placeholders});",
        WRITE_COLUMNS.join(", ")
    )
});

static UPDATE_SQL: Lazy<String> = Lazy::new(|| {
    let assignments = WRITE_COLUMNS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE atms SET {assignments} WHERE id = ?{};",
        WRITE_COLUMNS.len() + 1
    )
});

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for ATM and ATM type persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(AtmValidationError),
    TypeValidation(AtmTypeValidationError),
    Db(DbError),
    NotFound(String),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// A write touched an unexpected number of rows.
    InconsistentState(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TypeValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted atm data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "atm repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InconsistentState(message) => write!(f, "inconsistent atm storage: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::TypeValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::InconsistentState(_) => None,
        }
    }
}

impl From<AtmValidationError> for RepoError {
    fn from(value: AtmValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AtmTypeValidationError> for RepoError {
    fn from(value: AtmTypeValidationError) -> Self {
        Self::TypeValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Outcome of a successful `save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    SavedNew,
    SavedUpdated,
}

impl SaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SavedNew => "new",
            Self::SavedUpdated => "updated",
        }
    }
}

/// Query options for listing ATM records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtmListQuery {
    /// Only records of this ATM type.
    pub bundle: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for ATM records.
pub trait AtmRepository {
    /// Runs the pre-save hook, validates, then inserts or updates.
    fn save(&self, atm: &mut Atm) -> RepoResult<SaveStatus>;
    fn get_atm(&self, id: AtmId) -> RepoResult<Option<Atm>>;
    fn list_atms(&self, query: &AtmListQuery) -> RepoResult<Vec<Atm>>;
    fn delete_atm(&self, id: AtmId) -> RepoResult<()>;
}

/// SQLite-backed ATM repository.
pub struct SqliteAtmRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAtmRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AtmRepository for SqliteAtmRepository<'_> {
    fn save(&self, atm: &mut Atm) -> RepoResult<SaveStatus> {
        let mut staged = atm.clone();
        staged.pre_save(now_epoch_ms());
        staged.validate()?;

        let mut values = write_values(&staged)?;
        let status = match staged.id() {
            None => {
                let inserted = self
                    .conn
                    .execute(INSERT_SQL.as_str(), params_from_iter(values))?;
                if inserted != 1 {
                    return Err(RepoError::InconsistentState(format!(
                        "insert of {} touched {inserted} rows",
                        staged.uuid()
                    )));
                }
                staged.assign_id(self.conn.last_insert_rowid());
                SaveStatus::SavedNew
            }
            Some(id) => {
                values.push(Value::Integer(id));
                let changed = self
                    .conn
                    .execute(UPDATE_SQL.as_str(), params_from_iter(values))?;
                if changed == 0 {
                    return Err(RepoError::NotFound(id.to_string()));
                }
                SaveStatus::SavedUpdated
            }
        };

        *atm = staged;
        Ok(status)
    }

    fn get_atm(&self, id: AtmId) -> RepoResult<Option<Atm>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1;", SELECT_SQL.as_str()))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_atm_row(row)?));
        }
        Ok(None)
    }

    fn list_atms(&self, query: &AtmListQuery) -> RepoResult<Vec<Atm>> {
        let mut sql = format!("{} WHERE 1 = 1", SELECT_SQL.as_str());
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(bundle) = query.bundle.as_deref() {
            sql.push_str(" AND bundle = ?");
            bind_values.push(Value::Text(bundle.to_string()));
        }

        sql.push_str(" ORDER BY changed DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut atms = Vec::new();
        while let Some(row) = rows.next()? {
            atms.push(parse_atm_row(row)?);
        }
        Ok(atms)
    }

    fn delete_atm(&self, id: AtmId) -> RepoResult<()> {
        let deleted = self.conn.execute("DELETE FROM atms WHERE id = ?1;", [id])?;
        if deleted == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn write_values(atm: &Atm) -> RepoResult<Vec<Value>> {
    let owner = atm.owner_id().unwrap_or(ANONYMOUS_USER_ID);
    let owner = i64::try_from(owner)
        .map_err(|_| RepoError::InvalidData(format!("owner id {owner} out of range")))?;
    let created = atm
        .created_time()
        .ok_or_else(|| RepoError::InconsistentState("created time unset after pre-save".into()))?;
    let changed = atm
        .changed_time()
        .ok_or_else(|| RepoError::InconsistentState("changed time unset after pre-save".into()))?;

    let mut values = vec![
        Value::Text(atm.uuid().to_string()),
        Value::Text(atm.bundle().to_string()),
        Value::Integer(bool_to_int(atm.is_enabled())),
        Value::Integer(owner),
        Value::Integer(created),
        Value::Integer(changed),
        optional_text(atm.device_type()),
        optional_text(atm.city()),
        optional_text(atm.address()),
        optional_text(atm.district()),
        optional_text(atm.latitude()),
        optional_text(atm.longitude()),
        optional_text(atm.brand()),
        atm.fee_setting()
            .map_or(Value::Null, |fee| Value::Integer(bool_to_int(fee))),
    ];
    for day in WeekDay::ALL {
        for bound in HoursBound::BOTH {
            values.push(optional_text(
                atm.open_hours().day(day).get(bound).unwrap_or_default(),
            ));
        }
    }
    Ok(values)
}

fn parse_atm_row(row: &Row<'_>) -> RepoResult<Atm> {
    let id: AtmId = row.get("id")?;

    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in atms.uuid"))
    })?;

    let mut atm = Atm::with_uuid(uuid, row.get::<_, String>("bundle")?);
    atm.assign_id(id);
    atm.set_enabled(int_to_bool(row.get("status")?, "atms.status")?);

    let owner: i64 = row.get("uid")?;
    let owner = u64::try_from(owner)
        .map_err(|_| RepoError::InvalidData(format!("invalid owner `{owner}` in atms.uid")))?;
    atm.set_owner_id(owner);
    atm.set_created_time(Some(row.get("created")?));
    atm.set_changed_time(row.get("changed")?);

    atm.set_device_type(row.get("device_type")?);
    atm.set_city(row.get("city")?);
    atm.set_address(row.get("address")?);
    atm.set_district(row.get("district")?);
    atm.set_latitude(row.get("gps_lat")?);
    atm.set_longitude(row.get("gps_lon")?);
    atm.set_brand(row.get("brand")?);
    let fee = match row.get::<_, Option<i64>>("fee")? {
        Some(value) => Some(int_to_bool(value, "atms.fee")?),
        None => None,
    };
    atm.set_fee(fee);

    for day in WeekDay::ALL {
        for bound in HoursBound::BOTH {
            let column = open_hours_field_name(day, bound);
            atm.set_open_hours_bound(day, bound, row.get(column.as_str())?);
        }
    }

    atm.validate()?;
    Ok(atm)
}

fn optional_text(value: &str) -> Value {
    if value.is_empty() {
        Value::Null
    } else {
        Value::Text(value.to_string())
    }
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
