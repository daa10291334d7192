//! Access policy for ATM record operations.
//!
//! # Invariants
//! - `view`/`update`/`delete` are allowed iff the account holds the
//!   operation permission OR `administer atm types`; otherwise `Neutral`.
//! - Creation is allowed iff the account holds `create atm` OR
//!   `administer atm types`; otherwise `Neutral`.
//! - Unknown operations are always `Neutral`.
//! - Checks never read record field values and never fail.

use crate::access::permission::{
    PERMISSION_ADMINISTER, PERMISSION_CREATE, PERMISSION_DELETE, PERMISSION_EDIT,
    PERMISSION_VIEW,
};
use crate::model::atm::{Atm, UserId};
use std::collections::BTreeSet;

/// Three-valued access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Allowed,
    /// No opinion; other policy layers decide.
    Neutral,
    Forbidden,
}

impl AccessResult {
    /// `Allowed` if the account holds any of `permissions`, else `Neutral`.
    pub fn allowed_if_has_permissions(
        account: &impl AccountPermissions,
        permissions: &[&str],
    ) -> Self {
        if account.has_any_permission(permissions) {
            Self::Allowed
        } else {
            Self::Neutral
        }
    }

    /// Combines two layers: `Forbidden` wins, then `Allowed`, else `Neutral`.
    pub fn or(self, other: AccessResult) -> AccessResult {
        match (self, other) {
            (Self::Forbidden, _) | (_, Self::Forbidden) => Self::Forbidden,
            (Self::Allowed, _) | (_, Self::Allowed) => Self::Allowed,
            _ => Self::Neutral,
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

/// Host collaborator answering permission questions for one principal.
pub trait AccountPermissions {
    fn id(&self) -> UserId;
    fn has_permission(&self, permission: &str) -> bool;

    fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions
            .iter()
            .any(|permission| self.has_permission(permission))
    }
}

/// In-memory principal with an explicit permission set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    id: UserId,
    permissions: BTreeSet<String>,
}

impl Account {
    pub fn new<I, S>(id: UserId, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// The anonymous user without permissions.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl AccountPermissions for Account {
    fn id(&self) -> UserId {
        self.id
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Record operation tags checked by `check_access`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityOperation {
    View,
    Update,
    Delete,
}

impl EntityOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn permission(self) -> &'static str {
        match self {
            Self::View => PERMISSION_VIEW,
            Self::Update => PERMISSION_EDIT,
            Self::Delete => PERMISSION_DELETE,
        }
    }
}

/// Parses a record operation tag; unknown tags yield `None`.
pub fn parse_entity_operation(value: &str) -> Option<EntityOperation> {
    match value {
        "view" => Some(EntityOperation::View),
        "update" => Some(EntityOperation::Update),
        "delete" => Some(EntityOperation::Delete),
        _ => None,
    }
}

/// Context of a create check. The bundle is informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    pub bundle: Option<String>,
}

/// Access policy of the `atm` record type.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtmAccessPolicy;

impl AtmAccessPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Checks one operation on an existing record.
    pub fn check_access(
        &self,
        _atm: &Atm,
        operation: &str,
        account: &impl AccountPermissions,
    ) -> AccessResult {
        match parse_entity_operation(operation) {
            Some(operation) => self.check_operation(operation, account),
            None => AccessResult::Neutral,
        }
    }

    /// Typed form of `check_access`.
    pub fn check_operation(
        &self,
        operation: EntityOperation,
        account: &impl AccountPermissions,
    ) -> AccessResult {
        AccessResult::allowed_if_has_permissions(
            account,
            &[operation.permission(), PERMISSION_ADMINISTER],
        )
    }

    /// Checks record creation independent of any record instance.
    pub fn check_create_access(
        &self,
        account: &impl AccountPermissions,
        _context: &AccessContext,
    ) -> AccessResult {
        AccessResult::allowed_if_has_permissions(account, &[PERMISSION_CREATE, PERMISSION_ADMINISTER])
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessResult, Account, AccountPermissions};

    #[test]
    fn or_combinator_precedence() {
        use AccessResult::{Allowed, Forbidden, Neutral};
        assert_eq!(Neutral.or(Neutral), Neutral);
        assert_eq!(Neutral.or(Allowed), Allowed);
        assert_eq!(Allowed.or(Neutral), Allowed);
        assert_eq!(Allowed.or(Forbidden), Forbidden);
        assert_eq!(Forbidden.or(Allowed), Forbidden);
    }

    #[test]
    fn has_any_permission_uses_or_semantics() {
        let account = Account::new(7, ["edit atm"]);
        assert!(account.has_any_permission(&["view atm", "edit atm"]));
        assert!(!account.has_any_permission(&["view atm", "delete atm"]));
        assert!(!account.has_any_permission(&[]));
    }

    #[test]
    fn anonymous_account_has_no_permissions() {
        let account = Account::anonymous();
        assert_eq!(account.id(), 0);
        assert!(!account.has_permission("view atm"));
    }
}
