//! Guarded mutations feeding the counters the rating reads.
//!
//! Each operation validates every precondition before touching either record, so a rejection
//! leaves both sides exactly as they were. Persisting the pair atomically is the store's job.

use chrono::{DateTime, Utc};

use super::budget::{LikePolicy, Replenishment};
use super::domain::{Gift, Money, User, ValidationError};

/// Whole-unit bounds accepted by a balance top-up.
pub const TOP_UP_MIN: u64 = 10;
pub const TOP_UP_MAX: u64 = 999;

/// User-facing rate-limit rejections; retryable once the reported instant passes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("no likes left for today, budget refills at {refill_at}")]
    DailyLimitExhausted { refill_at: DateTime<Utc> },
    #[error("this user was already liked recently, try again after {retry_at}")]
    TargetCooldownActive { retry_at: DateTime<Utc> },
    #[error("daily like bonus already claimed, next claim at {retry_at}")]
    TooSoon { retry_at: DateTime<Utc> },
}

impl RateLimitError {
    pub fn code(&self) -> &'static str {
        match self {
            RateLimitError::DailyLimitExhausted { .. } => "DAILY_LIMIT_EXHAUSTED",
            RateLimitError::TargetCooldownActive { .. } => "TARGET_COOLDOWN_ACTIVE",
            RateLimitError::TooSoon { .. } => "TOO_SOON",
        }
    }

    pub fn retry_at(&self) -> DateTime<Utc> {
        match self {
            RateLimitError::DailyLimitExhausted { refill_at } => *refill_at,
            RateLimitError::TargetCooldownActive { retry_at }
            | RateLimitError::TooSoon { retry_at } => *retry_at,
        }
    }
}

/// Gift cost exceeds the sender's balance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("balance {balance} does not cover gift cost {cost}")]
pub struct InsufficientFunds {
    pub balance: Money,
    pub cost: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
}

/// `actor` likes `target`. The caller guarantees they are different users.
pub fn like(
    actor: &mut User,
    target: &mut User,
    policy: &LikePolicy,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    let mut allowance = actor.likes.clone();
    policy.refresh(&mut allowance, now);

    if allowance.available == 0 {
        return Err(RateLimitError::DailyLimitExhausted {
            refill_at: policy.next_window(allowance.last_recharge_at),
        }
        .into());
    }

    if let Some(retry_at) = policy.cooldown_until(&allowance, &target.id, now) {
        return Err(RateLimitError::TargetCooldownActive { retry_at }.into());
    }

    allowance.available -= 1;
    allowance.given_total = allowance.given_total.saturating_add(1);
    allowance.last_liked.insert(target.id.clone(), now);

    actor.likes = allowance;
    target.likes_received = target.likes_received.saturating_add(1);
    Ok(())
}

/// Claims the periodic like refill. Only meaningful for [`Replenishment::OnClaim`] budgets.
pub fn claim_daily_bonus(
    user: &mut User,
    policy: &LikePolicy,
    now: DateTime<Utc>,
) -> Result<u32, LedgerError> {
    if policy.replenishment != Replenishment::OnClaim {
        return Err(ValidationError::ClaimUnavailable.into());
    }

    let last = user.likes.last_recharge_at;
    if !policy.window_elapsed(last, now) {
        return Err(RateLimitError::TooSoon {
            retry_at: policy.next_window(last),
        }
        .into());
    }

    user.likes.available = user.likes.available.saturating_add(policy.refill_amount);
    user.likes.last_recharge_at = now;
    Ok(user.likes.available)
}

/// Moves `gift.cost` from `sender` and appends a copy of `gift` to `receiver`.
pub fn send_gift(sender: &mut User, receiver: &mut User, gift: &Gift) -> Result<(), LedgerError> {
    if gift.cost == Money::ZERO {
        return Err(ValidationError::FreeGift(gift.id.0.clone()).into());
    }

    let remaining = sender
        .balance
        .checked_sub(gift.cost)
        .ok_or(InsufficientFunds {
            balance: sender.balance,
            cost: gift.cost,
        })?;

    sender.balance = remaining;
    receiver.gifts_received.push(gift.clone());
    Ok(())
}

/// Credits a top-up given in whole currency units.
pub fn top_up(user: &mut User, whole_units: u64) -> Result<Money, LedgerError> {
    if !(TOP_UP_MIN..=TOP_UP_MAX).contains(&whole_units) {
        return Err(ValidationError::TopUpOutOfRange {
            min: TOP_UP_MIN,
            max: TOP_UP_MAX,
            found: whole_units,
        }
        .into());
    }

    user.balance = user.balance.saturating_add(Money::from_major(whole_units));
    Ok(user.balance)
}
