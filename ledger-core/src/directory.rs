//! Recipient resolution for transfers

use crate::{storage::Storage, types::UserId, Result};

/// Maps a free-form recipient reference (user id, username, address) to an account
pub trait RecipientResolver: Send + Sync {
    /// `Ok(None)` when the reference names no known account
    fn resolve(&self, reference: &str) -> Result<Option<UserId>>;
}

/// Resolves against the ledger's own records: exact user id first, then username
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    storage: Storage,
}

impl AccountDirectory {
    /// Directory over the given storage
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

impl RecipientResolver for AccountDirectory {
    fn resolve(&self, reference: &str) -> Result<Option<UserId>> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }

        let as_id = UserId::new(reference);
        if self.storage.account_exists(&as_id)? {
            return Ok(Some(as_id));
        }

        let username = reference.strip_prefix('@').unwrap_or(reference);
        self.storage.find_username(username)
    }
}
