use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::leaderboard::clock::ManualClock;
use crate::leaderboard::config::LeaderboardConfig;
use crate::leaderboard::domain::{Gift, GiftId, Money, Profile, User, UserId};
use crate::leaderboard::service::LeaderboardService;
use crate::leaderboard::store::{StoreError, UserRecord, UserStore};

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
}

/// Bare user: no name, optional city, nothing else.
pub(super) fn user(id: &str, city: Option<&str>) -> User {
    let profile = Profile {
        location: city.map(str::to_string),
        ..Profile::default()
    };
    User::new(UserId::from(id), id, profile, 3, start())
}

/// User whose rating is exactly `target`, padded through the passive rating.
pub(super) fn scored(id: &str, city: Option<&str>, target: i64) -> User {
    let mut user = user(id, city);
    let base = if city.is_some() { 20 } else { 0 };
    user.passive_rating = target - base;
    user
}

pub(super) fn gift(rating: i64, cost_minor: u64) -> Gift {
    Gift {
        id: GiftId(format!("gift-r{rating}")),
        name: format!("Gift worth {rating}"),
        cost: Money::from_minor(cost_minor),
        rating,
        icon: "🎁".to_string(),
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<BTreeMap<UserId, UserRecord>>,
}

impl MemoryStore {
    pub(super) fn seeded(users: Vec<User>) -> Self {
        let store = Self::default();
        for user in users {
            store.insert(user).expect("seed user");
        }
        store
    }

    pub(super) fn user(&self, id: &str) -> User {
        self.fetch(&UserId::from(id))
            .expect("fetch succeeds")
            .expect("user present")
            .user
    }
}

impl UserStore for MemoryStore {
    fn insert(&self, user: User) -> Result<UserRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
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
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.user.login == login)
            .cloned())
    }

    fn all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn compare_and_swap(&self, writes: Vec<UserRecord>) -> Result<Vec<UserRecord>, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        for write in &writes {
            match guard.get(&write.user.id) {
                None => return Err(StoreError::NotFound(write.user.id.clone())),
                Some(current) if current.version != write.version => {
                    return Err(StoreError::Conflict(write.user.id.clone()))
                }
                Some(_) => {}
            }
        }

        let stored: Vec<UserRecord> = writes
            .into_iter()
            .map(|write| UserRecord {
                version: write.version + 1,
                user: write.user,
            })
            .collect();
        for record in &stored {
            guard.insert(record.user.id.clone(), record.clone());
        }
        Ok(stored)
    }
}

/// Memory store that injects write failures.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: MemoryStore,
    next_errors: Mutex<VecDeque<StoreError>>,
    failing_user: Mutex<Option<UserId>>,
}

impl FlakyStore {
    pub(super) fn seeded(users: Vec<User>) -> Self {
        Self {
            inner: MemoryStore::seeded(users),
            ..Self::default()
        }
    }

    /// The next write fails with `error`, whatever it touches.
    pub(super) fn fail_next_write(&self, error: StoreError) {
        self.next_errors
            .lock()
            .expect("flaky mutex poisoned")
            .push_back(error);
    }

    /// Every write touching `id` fails as unavailable.
    pub(super) fn fail_writes_for(&self, id: &str) {
        *self.failing_user.lock().expect("flaky mutex poisoned") = Some(UserId::from(id));
    }
}

impl UserStore for FlakyStore {
    fn insert(&self, user: User) -> Result<UserRecord, StoreError> {
        self.inner.insert(user)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        self.inner.fetch(id)
    }

    fn fetch_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError> {
        self.inner.fetch_by_login(login)
    }

    fn all(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.inner.all()
    }

    fn compare_and_swap(&self, writes: Vec<UserRecord>) -> Result<Vec<UserRecord>, StoreError> {
        if let Some(error) = self
            .next_errors
            .lock()
            .expect("flaky mutex poisoned")
            .pop_front()
        {
            return Err(error);
        }
        if let Some(failing) = self
            .failing_user
            .lock()
            .expect("flaky mutex poisoned")
            .as_ref()
        {
            if writes.iter().any(|write| &write.user.id == failing) {
                return Err(StoreError::Unavailable(format!("{failing} is offline")));
            }
        }
        self.inner.compare_and_swap(writes)
    }
}

/// Store whose every call fails.
pub(super) struct UnavailableStore;

impl UserStore for UnavailableStore {
    fn insert(&self, _user: User) -> Result<UserRecord, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn fetch_by_login(&self, _login: &str) -> Result<Option<UserRecord>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn all(&self) -> Result<Vec<UserRecord>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn compare_and_swap(&self, _writes: Vec<UserRecord>) -> Result<Vec<UserRecord>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }
}

pub(super) type TestService<S> = LeaderboardService<S, ManualClock>;

pub(super) fn build_service<S>(
    store: S,
    config: &LeaderboardConfig,
) -> (Arc<TestService<S>>, Arc<S>, Arc<ManualClock>)
where
    S: UserStore + 'static,
{
    let store = Arc::new(store);
    let clock = Arc::new(ManualClock::new(start()));
    let service = Arc::new(LeaderboardService::new(
        store.clone(),
        clock.clone(),
        config,
    ));
    (service, store, clock)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    serde_json::from_slice(&bytes).expect("valid json")
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializable")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}
