use chrono::{DateTime, Utc};
use serde::Serialize;

use super::budget::{LikePolicy, Replenishment};
use super::domain::{Gift, Money, User, UserId};
use super::rating::{breakdown, score, ScoreBreakdown};

/// Public profile with a freshly computed rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub user_id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub hobbies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub likes_received: u64,
    pub gifts_received: Vec<Gift>,
    pub passive_rating: i64,
    pub rating: ScoreBreakdown,
}

impl UserView {
    pub fn from_user(user: &User) -> Self {
        let profile = &user.profile;
        Self {
            user_id: user.id.clone(),
            name: profile.name.clone(),
            age: profile.age,
            location: profile.city().map(str::to_string),
            hobbies: profile.hobbies.clone(),
            about_me: profile.about_me.clone(),
            relationship_status: profile.relationship_status.clone(),
            avatar_url: profile.avatar_url.clone(),
            likes_received: user.likes_received,
            gifts_received: user.gifts_received.clone(),
            passive_rating: user.passive_rating,
            rating: breakdown(user),
        }
    }
}

/// The acting user's own balances, returned after each interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub user_id: UserId,
    pub balance: Money,
    pub available_likes: u32,
    /// When the like budget next refills (automatic) or may next be claimed.
    pub next_refill_at: DateTime<Utc>,
    pub rating: i64,
}

impl AccountView {
    pub fn from_user(user: &User, policy: &LikePolicy, now: DateTime<Utc>) -> Self {
        let last = user.likes.last_recharge_at;
        let automatic_reset = policy.replenishment == Replenishment::Automatic
            && policy.window_elapsed(last, now);
        let available_likes = if automatic_reset {
            policy.budget
        } else {
            user.likes.available
        };
        let next_refill_at = if automatic_reset {
            policy.next_window(now)
        } else {
            policy.next_window(last)
        };

        Self {
            user_id: user.id.clone(),
            balance: user.balance,
            available_likes,
            next_refill_at,
            rating: score(user),
        }
    }
}

/// Result of a like or gift: the actor's balances and the target's new rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionReceipt {
    pub actor: AccountView,
    pub target_id: UserId,
    pub target_rating: i64,
}
