use serde::{Deserialize, Serialize};

use super::domain::{User, UserId};

/// A user as read from the store, tagged with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: User,
    pub version: u64,
}

impl UserRecord {
    pub fn id(&self) -> &UserId {
        &self.user.id
    }
}

/// Persistence collaborator. Implementations serialize writes per record.
pub trait UserStore: Send + Sync {
    /// Stores a new user at version 1. Fails on duplicate id or login.
    fn insert(&self, user: User) -> Result<UserRecord, StoreError>;
    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;
    fn fetch_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError>;
    fn all(&self) -> Result<Vec<UserRecord>, StoreError>;
    /// Writes every record in `writes` or none of them.
    ///
    /// Each record's `version` is the version it was read at. If any stored version differs the
    /// batch is rejected with [`StoreError::Conflict`]; otherwise every record is stored at
    /// `version + 1` and the new records are returned in input order.
    fn compare_and_swap(&self, writes: Vec<UserRecord>) -> Result<Vec<UserRecord>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} was modified concurrently")]
    Conflict(UserId),
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("login '{0}' already registered")]
    DuplicateLogin(String),
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}
