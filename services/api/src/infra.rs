use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use topper::leaderboard::{StoreError, User, UserId, UserRecord, UserStore};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local user store. Every write holds the table lock, so a batch is applied whole.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUserStore {
    records: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl InMemoryUserStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<UserId, UserRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("user table lock poisoned".to_string()))
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: User) -> Result<UserRecord, StoreError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&user.id) {
            return Err(StoreError::Conflict(user.id));
        }
        if guard.values().any(|record| record.user.login == user.login) {
            return Err(StoreError::DuplicateLogin(user.login));
        }
        let record = UserRecord { user, version: 1 };
        guard.insert(record.user.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn fetch_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .lock()?
            .values()
            .find(|record| record.user.login == login)
            .cloned())
    }

    fn all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut records: Vec<UserRecord> = self.lock()?.values().cloned().collect();
        records.sort_by(|a, b| a.user.id.cmp(&b.user.id));
        Ok(records)
    }

    fn compare_and_swap(&self, writes: Vec<UserRecord>) -> Result<Vec<UserRecord>, StoreError> {
        let mut guard = self.lock()?;
        for write in &writes {
            let current = guard
                .get(write.id())
                .ok_or_else(|| StoreError::NotFound(write.id().clone()))?;
            if current.version != write.version {
                return Err(StoreError::Conflict(write.id().clone()));
            }
        }

        let mut stored = Vec::with_capacity(writes.len());
        for mut record in writes {
            record.version += 1;
            guard.insert(record.user.id.clone(), record.clone());
            stored.push(record);
        }
        Ok(stored)
    }
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
