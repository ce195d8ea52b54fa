//! Rating and passive-bonus engine.
//!
//! Scoring is a pure function over a [`User`] snapshot. Likes, gifts, top-ups, and the periodic
//! city sweep are guarded read-modify-write sequences committed through [`UserStore`] with
//! version checks, so concurrent writers never drop each other's updates.

pub mod budget;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod ledger;
pub mod ranking;
pub mod rating;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod sweep;
pub mod views;

#[cfg(test)]
mod tests;

pub use budget::{BudgetWindow, LikePolicy, Replenishment};
pub use catalog::GiftCatalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LeaderboardConfig;
pub use domain::{
    Gift, GiftId, LikeAllowance, Money, Profile, ProfilePatch, Registration, User, UserId,
    ValidationError, MAX_HOBBIES,
};
pub use ledger::{InsufficientFunds, LedgerError, RateLimitError};
pub use ranking::{LeaderboardScope, RankedUser};
pub use rating::{breakdown, score, ScoreBreakdown, ScoreComponent, ScoreSource};
pub use router::leaderboard_router;
pub use scheduler::SweepScheduler;
pub use service::{LeaderboardError, LeaderboardService};
pub use store::{StoreError, UserRecord, UserStore};
pub use sweep::{
    apply_passive_bonus, plan_passive_bonus, PassiveBonusSweep, SweepPlan, SweepPolicy,
    SweepReport,
};
pub use views::{AccountView, InteractionReceipt, UserView};
