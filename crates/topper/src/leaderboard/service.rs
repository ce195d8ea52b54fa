use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use super::budget::LikePolicy;
use super::catalog::GiftCatalog;
use super::clock::Clock;
use super::config::LeaderboardConfig;
use super::domain::{
    normalize_profile, Gift, GiftId, ProfilePatch, Registration, User, UserId, ValidationError,
};
use super::ledger::{self, InsufficientFunds, LedgerError, RateLimitError};
use super::ranking::{self, LeaderboardScope, RankedUser};
use super::rating::{refresh_display_rating, score};
use super::store::{StoreError, UserRecord, UserStore};
use super::sweep::{PassiveBonusSweep, SweepReport};
use super::views::{AccountView, InteractionReceipt, UserView};

/// Facade composing the store, clock, like policy, gift catalog, and passive sweep.
pub struct LeaderboardService<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    catalog: Arc<GiftCatalog>,
    likes: LikePolicy,
    sweep: Arc<PassiveBonusSweep<S, C>>,
}

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("user-{id:06}"))
}

impl<S, C> LeaderboardService<S, C>
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, config: &LeaderboardConfig) -> Self {
        Self::with_catalog(store, clock, config, GiftCatalog::standard())
    }

    pub fn with_catalog(
        store: Arc<S>,
        clock: Arc<C>,
        config: &LeaderboardConfig,
        catalog: GiftCatalog,
    ) -> Self {
        let sweep = Arc::new(PassiveBonusSweep::new(
            store.clone(),
            clock.clone(),
            config.sweep,
        ));

        Self {
            store,
            clock,
            catalog: Arc::new(catalog),
            likes: config.likes.clone(),
            sweep,
        }
    }

    /// Shared handle to the sweep so a scheduler can drive it.
    pub fn sweep(&self) -> Arc<PassiveBonusSweep<S, C>> {
        self.sweep.clone()
    }

    pub fn gifts(&self) -> &[Gift] {
        self.catalog.gifts()
    }

    /// Creates a user for an identity the auth collaborator has already verified.
    pub fn register(&self, registration: Registration) -> Result<UserRecord, LeaderboardError> {
        let login = registration.login.trim().to_string();
        if login.is_empty() {
            return Err(ValidationError::EmptyLogin.into());
        }
        if self.store.fetch_by_login(&login)?.is_some() {
            return Err(ValidationError::LoginTaken(login).into());
        }

        let profile = normalize_profile(registration.profile)?;
        let mut user = User::new(
            next_user_id(),
            login,
            profile,
            self.likes.budget,
            self.clock.now(),
        );
        refresh_display_rating(&mut user);

        let record = self.store.insert(user)?;
        info!(user_id = %record.user.id, "user registered");
        Ok(record)
    }

    pub fn profile(&self, id: &UserId) -> Result<UserView, LeaderboardError> {
        let record = self.load(id)?;
        Ok(UserView::from_user(&record.user))
    }

    pub fn account(&self, id: &UserId) -> Result<AccountView, LeaderboardError> {
        let record = self.load(id)?;
        Ok(AccountView::from_user(
            &record.user,
            &self.likes,
            self.clock.now(),
        ))
    }

    pub fn update_profile(
        &self,
        id: &UserId,
        patch: ProfilePatch,
    ) -> Result<UserView, LeaderboardError> {
        let mut record = self.load(id)?;
        record.user.profile = patch.apply(&record.user.profile)?;
        refresh_display_rating(&mut record.user);

        let stored = self.commit_one(record)?;
        Ok(UserView::from_user(&stored.user))
    }

    pub fn like(
        &self,
        actor_id: &UserId,
        target_id: &UserId,
    ) -> Result<InteractionReceipt, LeaderboardError> {
        if actor_id == target_id {
            return Err(ValidationError::SelfTarget { action: "like" }.into());
        }

        let now = self.clock.now();
        let mut actor = self.load(actor_id)?;
        let mut target = self.load(target_id)?;

        ledger::like(&mut actor.user, &mut target.user, &self.likes, now)?;
        refresh_display_rating(&mut actor.user);
        refresh_display_rating(&mut target.user);

        let (actor, target) = self.commit_pair(actor, target)?;
        debug!(actor = %actor_id, target = %target_id, "like recorded");
        Ok(self.receipt(&actor.user, &target.user))
    }

    pub fn claim_daily_bonus(&self, id: &UserId) -> Result<AccountView, LeaderboardError> {
        let now = self.clock.now();
        let mut record = self.load(id)?;
        ledger::claim_daily_bonus(&mut record.user, &self.likes, now)?;

        let stored = self.commit_one(record)?;
        Ok(AccountView::from_user(&stored.user, &self.likes, now))
    }

    pub fn send_gift(
        &self,
        sender_id: &UserId,
        receiver_id: &UserId,
        gift_id: &GiftId,
    ) -> Result<InteractionReceipt, LeaderboardError> {
        if sender_id == receiver_id {
            return Err(ValidationError::SelfTarget { action: "gift" }.into());
        }
        let gift = self
            .catalog
            .get(gift_id)
            .ok_or_else(|| ValidationError::UnknownGift(gift_id.0.clone()))?;

        let mut sender = self.load(sender_id)?;
        let mut receiver = self.load(receiver_id)?;

        ledger::send_gift(&mut sender.user, &mut receiver.user, gift)?;
        refresh_display_rating(&mut receiver.user);

        let (sender, receiver) = self.commit_pair(sender, receiver)?;
        info!(sender = %sender_id, receiver = %receiver_id, gift = %gift.id.0, "gift sent");
        Ok(self.receipt(&sender.user, &receiver.user))
    }

    /// Credits a completed payment, in whole currency units, to the user's balance.
    pub fn top_up(&self, id: &UserId, whole_units: u64) -> Result<AccountView, LeaderboardError> {
        let mut record = self.load(id)?;
        ledger::top_up(&mut record.user, whole_units)?;

        let stored = self.commit_one(record)?;
        Ok(AccountView::from_user(
            &stored.user,
            &self.likes,
            self.clock.now(),
        ))
    }

    pub fn leaderboard(
        &self,
        scope: &LeaderboardScope,
    ) -> Result<Vec<RankedUser>, LeaderboardError> {
        let users = self.snapshot()?;
        Ok(ranking::leaderboard(&users, scope))
    }

    pub fn city_podium(&self, city: &str) -> Result<Vec<RankedUser>, LeaderboardError> {
        let users = self.snapshot()?;
        Ok(ranking::city_podium(&users, city))
    }

    /// Runs one passive sweep immediately.
    pub fn run_sweep(&self) -> Result<SweepReport, LeaderboardError> {
        Ok(self.sweep.run_once()?)
    }

    fn load(&self, id: &UserId) -> Result<UserRecord, LeaderboardError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| LeaderboardError::NotFound(id.clone()))
    }

    fn snapshot(&self) -> Result<Vec<User>, LeaderboardError> {
        Ok(self
            .store
            .all()?
            .into_iter()
            .map(|record| record.user)
            .collect())
    }

    fn commit_one(&self, record: UserRecord) -> Result<UserRecord, LeaderboardError> {
        let id = record.user.id.clone();
        self.store
            .compare_and_swap(vec![record])?
            .pop()
            .ok_or_else(|| StoreError::NotFound(id).into())
    }

    fn commit_pair(
        &self,
        first: UserRecord,
        second: UserRecord,
    ) -> Result<(UserRecord, UserRecord), LeaderboardError> {
        let first_id = first.user.id.clone();
        let mut stored = self.store.compare_and_swap(vec![first, second])?.into_iter();
        match (stored.next(), stored.next()) {
            (Some(first), Some(second)) => Ok((first, second)),
            _ => Err(StoreError::NotFound(first_id).into()),
        }
    }

    fn receipt(&self, actor: &User, target: &User) -> InteractionReceipt {
        InteractionReceipt {
            actor: AccountView::from_user(actor, &self.likes, self.clock.now()),
            target_id: target.id.clone(),
            target_rating: score(target),
        }
    }
}

/// Error raised by the leaderboard service.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
    #[error("user {0} changed concurrently, retry with a fresh read")]
    ConcurrentUpdate(UserId),
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error(transparent)]
    Store(StoreError),
}

impl LeaderboardError {
    pub fn code(&self) -> &'static str {
        match self {
            LeaderboardError::Validation(_) => "VALIDATION_FAILED",
            LeaderboardError::RateLimited(err) => err.code(),
            LeaderboardError::InsufficientFunds(_) => "INSUFFICIENT_BALANCE",
            LeaderboardError::ConcurrentUpdate(_) => "CONCURRENT_UPDATE",
            LeaderboardError::NotFound(_) => "NOT_FOUND",
            LeaderboardError::Store(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Whether the caller should re-read and retry rather than show the rejection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeaderboardError::ConcurrentUpdate(_))
    }
}

impl From<StoreError> for LeaderboardError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(id) => Self::ConcurrentUpdate(id),
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::DuplicateLogin(login) => {
                Self::Validation(ValidationError::LoginTaken(login))
            }
            other @ StoreError::Unavailable(_) => Self::Store(other),
        }
    }
}

impl From<LedgerError> for LeaderboardError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Validation(err) => Self::Validation(err),
            LedgerError::RateLimited(err) => Self::RateLimited(err),
            LedgerError::InsufficientFunds(err) => Self::InsufficientFunds(err),
        }
    }
}
