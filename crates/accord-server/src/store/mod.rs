//! App, version and contract storage.
//!
//! The core only needs `get`-style reads; writes come from the admin API.
//! Version edits go through [`ResourceStore::modify_app`] so that concurrent
//! updates to the same app cannot lose each other's changes.

mod inmemory;
mod types;

use crate::contract::Contract;
use std::sync::Arc;
use thiserror::Error;

pub use inmemory::InMemoryStore;
pub use types::{App, Version, WirestubRecord};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("invalid {0}")]
    Invalid(String),
}

impl StoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound(_) => 404,
            StoreError::Conflict(_) => 409,
            StoreError::Invalid(_) => 400,
        }
    }
}

/// Backing storage for apps and contracts.
pub trait ResourceStore: Send + Sync {
    fn list_apps(&self) -> Vec<String>;
    fn get_app(&self, id: &str) -> Result<App, StoreError>;
    /// Stores a new app; an empty id is replaced by a generated one.
    fn create_app(&self, app: App) -> Result<App, StoreError>;
    fn update_app(&self, app: App) -> Result<App, StoreError>;
    fn delete_app(&self, id: &str) -> Result<App, StoreError>;

    /// Apply `f` to the stored app under the write lock and return the result.
    fn modify_app(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut App) -> Result<(), StoreError>,
    ) -> Result<App, StoreError>;

    fn list_contracts(&self) -> Vec<String>;
    fn get_contract(&self, id: &str) -> Result<Arc<Contract>, StoreError>;
    fn create_contract(&self, contract: Contract) -> Result<Arc<Contract>, StoreError>;
    /// Replace the contract stored under `contract.id`.
    fn update_contract(&self, contract: Contract) -> Result<Arc<Contract>, StoreError>;
    fn delete_contract(&self, id: &str) -> Result<Arc<Contract>, StoreError>;

    fn get_version(&self, app_id: &str, v: &str) -> Result<Version, StoreError> {
        self.get_app(app_id)?
            .version(v)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("version {v}")))
    }

    fn create_version(&self, app_id: &str, mut version: Version) -> Result<Version, StoreError> {
        if version.v.is_empty() {
            return Err(StoreError::Invalid("version: `v` is required".to_string()));
        }
        version.parent = Some(app_id.to_string());
        let created = version.clone();
        self.modify_app(app_id, &mut |app| {
            if app.version(&version.v).is_some() {
                return Err(StoreError::Conflict(format!("version {}", version.v)));
            }
            app.versions.push(version.clone());
            Ok(())
        })?;
        Ok(created)
    }

    fn update_version(&self, app_id: &str, mut version: Version) -> Result<Version, StoreError> {
        version.parent = Some(app_id.to_string());
        let updated = version.clone();
        self.modify_app(app_id, &mut |app| {
            let slot = app
                .versions
                .iter_mut()
                .find(|existing| existing.v == version.v)
                .ok_or_else(|| StoreError::NotFound(format!("version {}", version.v)))?;
            *slot = version.clone();
            Ok(())
        })?;
        Ok(updated)
    }

    fn delete_version(&self, app_id: &str, v: &str) -> Result<(), StoreError> {
        self.modify_app(app_id, &mut |app| {
            let before = app.versions.len();
            app.versions.retain(|version| version.v != v);
            if app.versions.len() == before {
                return Err(StoreError::NotFound(format!("version {v}")));
            }
            Ok(())
        })
        .map(|_| ())
    }
}
