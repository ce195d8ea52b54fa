//! Passive bonus sweep: the top performers of every city earn a flat passive rating bump.
//!
//! Planning is a pure function of a snapshot. Applying the plan issues one compare-and-swap per
//! winner, so a crash mid-sweep leaves every user either fully awarded or untouched, and the
//! whole sweep can be recomputed from scratch on the next tick.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::domain::{User, UserId};
use super::ranking::ranking_order;
use super::rating::{refresh_display_rating, score};
use super::store::{StoreError, UserRecord, UserStore};

/// Attempts per winner before a conflicting write is reported as failed.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Reward size and podium depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    pub bonus: i64,
    pub winners_per_city: usize,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            bonus: 2,
            winners_per_city: 3,
        }
    }
}

/// Winners selected for one city, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityWinners {
    pub city: String,
    pub winners: Vec<UserId>,
}

/// Outcome of planning a sweep over one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPlan {
    pub cities: Vec<CityWinners>,
}

impl SweepPlan {
    pub fn winner_ids(&self) -> BTreeSet<&UserId> {
        self.cities
            .iter()
            .flat_map(|city| city.winners.iter())
            .collect()
    }

    pub fn is_winner(&self, id: &UserId) -> bool {
        self.cities
            .iter()
            .any(|city| city.winners.iter().any(|winner| winner == id))
    }
}

/// Picks the top `winners_per_city` of each city. Users without a city never qualify.
pub fn plan_passive_bonus(users: &[User], policy: &SweepPolicy) -> SweepPlan {
    let mut by_city: BTreeMap<&str, Vec<(i64, &User)>> = BTreeMap::new();
    for user in users {
        if let Some(city) = user.city() {
            by_city.entry(city).or_default().push((score(user), user));
        }
    }

    let cities = by_city
        .into_iter()
        .map(|(city, mut members)| {
            members.sort_by(ranking_order);
            CityWinners {
                city: city.to_string(),
                winners: members
                    .into_iter()
                    .take(policy.winners_per_city)
                    .map(|(_, user)| user.id.clone())
                    .collect(),
            }
        })
        .collect();

    SweepPlan { cities }
}

/// Applies one sweep to an in-memory user list and returns the updated list.
pub fn apply_passive_bonus(mut users: Vec<User>, policy: &SweepPolicy) -> Vec<User> {
    let plan = plan_passive_bonus(&users, policy);
    for user in users.iter_mut().filter(|user| plan.is_winner(&user.id)) {
        award(user, policy.bonus);
    }
    users
}

fn award(user: &mut User, bonus: i64) {
    user.passive_rating = user.passive_rating.saturating_add(bonus);
    refresh_display_rating(user);
}

/// A winner whose bonus could not be written this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub user_id: UserId,
    pub reason: String,
}

/// What one sweep cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub plan: SweepPlan,
    pub awarded: Vec<UserId>,
    pub failed: Vec<SweepFailure>,
}

/// Runs the sweep against a [`UserStore`].
pub struct PassiveBonusSweep<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    policy: SweepPolicy,
}

impl<S, C> PassiveBonusSweep<S, C>
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, policy: SweepPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// One full sweep. Only a failed snapshot read aborts; per-user failures are collected.
    pub fn run_once(&self) -> Result<SweepReport, StoreError> {
        let started_at = self.clock.now();
        let snapshot = self.store.all()?;
        let users: Vec<User> = snapshot.iter().map(|record| record.user.clone()).collect();
        let plan = plan_passive_bonus(&users, &self.policy);

        let mut by_id: BTreeMap<UserId, UserRecord> = snapshot
            .into_iter()
            .map(|record| (record.user.id.clone(), record))
            .collect();

        let mut awarded = Vec::new();
        let mut failed = Vec::new();
        for id in plan.winner_ids() {
            let Some(record) = by_id.remove(id) else {
                continue;
            };
            match self.write_bonus(record) {
                Ok(()) => awarded.push(id.clone()),
                Err(err) => {
                    warn!(user_id = %id, error = %err, "passive bonus write failed");
                    failed.push(SweepFailure {
                        user_id: id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            cities = plan.cities.len(),
            awarded = awarded.len(),
            failed = failed.len(),
            "passive bonus sweep finished"
        );

        Ok(SweepReport {
            started_at,
            plan,
            awarded,
            failed,
        })
    }

    fn write_bonus(&self, mut record: UserRecord) -> Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            award(&mut record.user, self.policy.bonus);
            match self.store.compare_and_swap(vec![record]) {
                Ok(_) => return Ok(()),
                Err(StoreError::Conflict(id)) if attempt < MAX_WRITE_ATTEMPTS => {
                    debug!(user_id = %id, attempt, "passive bonus conflicted, re-reading");
                    attempt += 1;
                    record = self
                        .store
                        .fetch(&id)?
                        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
