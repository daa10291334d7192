//! Permission declarations of the ATM module.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Permission string granting read access to ATM records.
pub const PERMISSION_VIEW: &str = "view atm";
/// Permission string granting edit access to ATM records.
pub const PERMISSION_EDIT: &str = "edit atm";
/// Permission string granting delete access to ATM records.
pub const PERMISSION_DELETE: &str = "delete atm";
/// Permission string granting record creation, including imports.
pub const PERMISSION_CREATE: &str = "create atm";
/// Blanket permission implying every other one.
pub const PERMISSION_ADMINISTER: &str = "administer atm types";

/// One declared permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AtmPermission {
    View,
    Edit,
    Delete,
    Create,
    Administer,
}

impl AtmPermission {
    pub const ALL: [AtmPermission; 5] = [
        AtmPermission::View,
        AtmPermission::Edit,
        AtmPermission::Delete,
        AtmPermission::Create,
        AtmPermission::Administer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => PERMISSION_VIEW,
            Self::Edit => PERMISSION_EDIT,
            Self::Delete => PERMISSION_DELETE,
            Self::Create => PERMISSION_CREATE,
            Self::Administer => PERMISSION_ADMINISTER,
        }
    }

    /// Title shown on permission administration screens.
    pub fn title(self) -> &'static str {
        match self {
            Self::View => "View atm",
            Self::Edit => "Edit atm",
            Self::Delete => "Delete atm",
            Self::Create => "Create atm",
            Self::Administer => "Administer atm types",
        }
    }

    /// Whether granting the permission should be restricted to trusted roles.
    pub fn restrict_access(self) -> bool {
        matches!(self, Self::Administer)
    }
}

/// Parses one permission string.
pub fn parse_permission(value: &str) -> Result<AtmPermission, PermissionError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(PermissionError::EmptyPermission);
    }
    AtmPermission::ALL
        .into_iter()
        .find(|permission| permission.as_str() == normalized)
        .ok_or_else(|| PermissionError::UnknownPermission(normalized.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    EmptyPermission,
    UnknownPermission(String),
}

impl Display for PermissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPermission => write!(f, "permission value must not be empty"),
            Self::UnknownPermission(value) => write!(f, "permission is not declared: {value}"),
        }
    }
}

impl Error for PermissionError {}
