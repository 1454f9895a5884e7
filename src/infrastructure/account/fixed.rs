use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;
use crate::domain::ports::account_provider::{AccountProvider, AccountSnapshot};

/// Account state that never changes. Used when no broker is attached.
pub struct FixedAccountProvider {
    snapshot: AccountSnapshot,
}

impl FixedAccountProvider {
    pub fn new(snapshot: AccountSnapshot) -> Self {
        Self { snapshot }
    }
}

impl AccountProvider for FixedAccountProvider {
    fn snapshot(&self) -> Result<AccountSnapshot, DomainError> {
        Ok(self.snapshot.clone())
    }
}

/// Account state exported to a JSON file by the broker sync job; re-read on
/// every snapshot so each decision sees the latest export.
pub struct JsonFileAccountProvider {
    path: PathBuf,
}

impl JsonFileAccountProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl AccountProvider for JsonFileAccountProvider {
    fn snapshot(&self) -> Result<AccountSnapshot, DomainError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            DomainError::Provider(format!("cannot read account file {}: {e}", self.path.display()))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}
