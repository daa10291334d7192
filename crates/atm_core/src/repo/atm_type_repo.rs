//! ATM type repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Type ids are unique machine names; duplicates surface as DB errors.
//! - Types still referenced by records cannot be deleted (foreign key).

use crate::model::atm_type::AtmType;
use crate::repo::atm_repo::{RepoError, RepoResult};
use crate::repo::ensure_connection_ready;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Repository interface for ATM types.
pub trait AtmTypeRepository {
    fn create_atm_type(&self, atm_type: &AtmType) -> RepoResult<()>;
    fn get_atm_type(&self, id: &str) -> RepoResult<Option<AtmType>>;
    /// All types ordered by label, then id.
    fn list_atm_types(&self) -> RepoResult<Vec<AtmType>>;
    fn delete_atm_type(&self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed ATM type repository.
pub struct SqliteAtmTypeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAtmTypeRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AtmTypeRepository for SqliteAtmTypeRepository<'_> {
    fn create_atm_type(&self, atm_type: &AtmType) -> RepoResult<()> {
        atm_type.validate()?;
        self.conn.execute(
            "INSERT INTO atm_types (id, label, uuid) VALUES (?1, ?2, ?3);",
            params![
                atm_type.id.as_str(),
                atm_type.label.as_str(),
                atm_type.uuid.to_string()
            ],
        )?;
        Ok(())
    }

    fn get_atm_type(&self, id: &str) -> RepoResult<Option<AtmType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label, uuid FROM atm_types WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_atm_type_row(row)?));
        }
        Ok(None)
    }

    fn list_atm_types(&self) -> RepoResult<Vec<AtmType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label, uuid FROM atm_types ORDER BY label ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(parse_atm_type_row(row)?);
        }
        Ok(types)
    }

    fn delete_atm_type(&self, id: &str) -> RepoResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM atm_types WHERE id = ?1;", [id])?;
        if deleted == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn parse_atm_type_row(row: &Row<'_>) -> RepoResult<AtmType> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in atm_types.uuid"))
    })?;
    let atm_type = AtmType {
        id: row.get("id")?,
        label: row.get("label")?,
        uuid,
    };
    atm_type.validate()?;
    Ok(atm_type)
}
