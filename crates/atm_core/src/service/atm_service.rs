//! ATM record use-case service.
//!
//! # Responsibility
//! - Save records and report whether they were created or updated.
//! - Guard reads, writes and deletes with `AtmAccessPolicy`.
//!
//! # Invariants
//! - Every guarded call checks access before touching storage writes.
//! - A save that is neither "new" nor "updated" fails with
//!   `ServiceError::SaveFailed`; it is never reported as success.

use crate::access::policy::{AccessContext, AccountPermissions, AtmAccessPolicy, EntityOperation};
use crate::model::atm::{Atm, AtmId, Ownable};
use crate::repo::atm_repo::{AtmListQuery, AtmRepository, RepoError, SaveStatus};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for ATM use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// The account lacks permission for the operation.
    AccessDenied { operation: &'static str },
    /// Target record does not exist.
    NotFound(AtmId),
    /// Update requested for a record that was never saved.
    NotPersisted,
    /// Persistence finished without creating or updating the record.
    SaveFailed(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied { operation } => write!(f, "access denied: {operation}"),
            Self::NotFound(id) => write!(f, "atm not found: {id}"),
            Self::NotPersisted => write!(f, "atm has not been saved yet"),
            Self::SaveFailed(details) => write!(f, "could not save atm: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for ATM records.
pub struct AtmService<R: AtmRepository> {
    repo: R,
    policy: AtmAccessPolicy,
}

impl<R: AtmRepository> AtmService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            policy: AtmAccessPolicy::new(),
        }
    }

    /// Persists a record without access checks.
    ///
    /// # Side effects
    /// - Emits `event=atm_saved` with `status=new|updated`.
    pub fn save_atm(&self, atm: &mut Atm) -> ServiceResult<SaveStatus> {
        match self.repo.save(atm) {
            Ok(status) => {
                info!(
                    "event=atm_saved module=service status={} atm_id={} label={:?}",
                    status.as_str(),
                    atm.id().unwrap_or_default(),
                    atm.label()
                );
                Ok(status)
            }
            Err(RepoError::NotFound(id)) => {
                error!(
                    "event=atm_saved module=service status=error error_code=save_failed atm_id={id}"
                );
                Err(ServiceError::SaveFailed(format!(
                    "record {id} is neither new nor stored"
                )))
            }
            Err(err) => {
                warn!("event=atm_saved module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Creates a new record owned by `account` unless an owner is set.
    pub fn create_atm(
        &self,
        account: &impl AccountPermissions,
        atm: &mut Atm,
    ) -> ServiceResult<SaveStatus> {
        let context = AccessContext {
            bundle: Some(atm.bundle().to_string()),
        };
        if !self
            .policy
            .check_create_access(account, &context)
            .is_allowed()
        {
            return Err(ServiceError::AccessDenied {
                operation: "create",
            });
        }
        if atm.owner_id().is_none() {
            atm.set_owner_id(account.id());
        }
        self.save_atm(atm)
    }

    /// Saves changes of an already persisted record.
    pub fn update_atm(
        &self,
        account: &impl AccountPermissions,
        atm: &mut Atm,
    ) -> ServiceResult<SaveStatus> {
        if atm.is_new() {
            return Err(ServiceError::NotPersisted);
        }
        self.ensure_allowed(atm, EntityOperation::Update, account)?;
        self.save_atm(atm)
    }

    /// Gets one record; `None` when it does not exist.
    pub fn get_atm(
        &self,
        account: &impl AccountPermissions,
        id: AtmId,
    ) -> ServiceResult<Option<Atm>> {
        let Some(atm) = self.repo.get_atm(id)? else {
            return Ok(None);
        };
        self.ensure_allowed(&atm, EntityOperation::View, account)?;
        Ok(Some(atm))
    }

    /// Lists the records `account` may view.
    pub fn list_atms(
        &self,
        account: &impl AccountPermissions,
        query: &AtmListQuery,
    ) -> ServiceResult<Vec<Atm>> {
        let atms = self.repo.list_atms(query)?;
        Ok(atms
            .into_iter()
            .filter(|atm| {
                self.policy
                    .check_access(atm, EntityOperation::View.as_str(), account)
                    .is_allowed()
            })
            .collect())
    }

    pub fn delete_atm(&self, account: &impl AccountPermissions, id: AtmId) -> ServiceResult<()> {
        let atm = self.repo.get_atm(id)?.ok_or(ServiceError::NotFound(id))?;
        self.ensure_allowed(&atm, EntityOperation::Delete, account)?;
        self.repo.delete_atm(id)?;
        info!("event=atm_deleted module=service status=ok atm_id={id}");
        Ok(())
    }

    fn ensure_allowed(
        &self,
        atm: &Atm,
        operation: EntityOperation,
        account: &impl AccountPermissions,
    ) -> ServiceResult<()> {
        if self
            .policy
            .check_access(atm, operation.as_str(), account)
            .is_allowed()
        {
            return Ok(());
        }
        info!(
            "event=atm_access module=service status=denied operation={} account_id={}",
            operation.as_str(),
            account.id()
        );
        Err(ServiceError::AccessDenied {
            operation: operation.as_str(),
        })
    }
}
