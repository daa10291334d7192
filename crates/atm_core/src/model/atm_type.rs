//! ATM type: the configuration bundle every ATM record belongs to.
//!
//! # Invariants
//! - `id` is a machine name: lowercase ASCII letters, digits and
//!   underscores, starting with a letter, at most 32 characters.
//! - `label` is non-empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MACHINE_NAME_MAX_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtmType {
    /// Machine name, referenced by `Atm::bundle`.
    pub id: String,
    /// Human-readable name.
    pub label: String,
    pub uuid: Uuid,
}

impl AtmType {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            uuid: Uuid::new_v4(),
        }
    }

    pub fn validate(&self) -> Result<(), AtmTypeValidationError> {
        if !is_machine_name(&self.id) {
            return Err(AtmTypeValidationError::InvalidId(self.id.clone()));
        }
        if self.label.trim().is_empty() {
            return Err(AtmTypeValidationError::EmptyLabel);
        }
        if self.uuid.is_nil() {
            return Err(AtmTypeValidationError::NilUuid);
        }
        Ok(())
    }
}

fn is_machine_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    value.len() <= MACHINE_NAME_MAX_LENGTH
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtmTypeValidationError {
    InvalidId(String),
    EmptyLabel,
    NilUuid,
}

impl Display for AtmTypeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(f, "atm type id is not a machine name: {value}"),
            Self::EmptyLabel => write!(f, "atm type label must not be empty"),
            Self::NilUuid => write!(f, "atm type uuid must not be nil"),
        }
    }
}

impl Error for AtmTypeValidationError {}
