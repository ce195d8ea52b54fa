use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{LikeAllowance, UserId};

/// How a spent like budget comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Replenishment {
    /// The budget resets to full on the first like after the window rolls over.
    Automatic,
    /// The user must claim the refill explicitly once per window.
    OnClaim,
}

/// How the replenishment window is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetWindow {
    /// A full `period` must elapse since the last recharge.
    Rolling,
    /// The UTC calendar date must change since the last recharge. `period` is ignored.
    Calendar,
}

/// Bounded interaction budget with periodic replenishment plus the per-target cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePolicy {
    pub budget: u32,
    pub refill_amount: u32,
    pub period: Duration,
    pub window: BudgetWindow,
    pub replenishment: Replenishment,
    pub cooldown: Duration,
}

impl Default for LikePolicy {
    fn default() -> Self {
        Self {
            budget: 3,
            refill_amount: 3,
            period: Duration::hours(24),
            window: BudgetWindow::Rolling,
            replenishment: Replenishment::Automatic,
            cooldown: Duration::hours(24),
        }
    }
}

impl LikePolicy {
    /// Whether a new replenishment window has opened since `since`.
    pub fn window_elapsed(&self, since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.window {
            BudgetWindow::Rolling => now - since >= self.period,
            BudgetWindow::Calendar => now.date_naive() > since.date_naive(),
        }
    }

    /// First instant at which the window that started at `since` has elapsed.
    pub fn next_window(&self, since: DateTime<Utc>) -> DateTime<Utc> {
        match self.window {
            BudgetWindow::Rolling => since
                .checked_add_signed(self.period)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            BudgetWindow::Calendar => since
                .date_naive()
                .succ_opt()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Resets an automatic budget when its window has rolled over.
    pub(crate) fn refresh(&self, allowance: &mut LikeAllowance, now: DateTime<Utc>) {
        if self.replenishment == Replenishment::Automatic
            && self.window_elapsed(allowance.last_recharge_at, now)
        {
            allowance.available = self.budget;
            allowance.last_recharge_at = now;
        }
    }

    /// When `target` may be liked again, if the cooldown is still running.
    pub fn cooldown_until(
        &self,
        allowance: &LikeAllowance,
        target: &UserId,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let last = allowance.last_liked.get(target)?;
        let retry_at = last
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (now < retry_at).then_some(retry_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn rolling_window_needs_a_full_period() {
        let policy = LikePolicy::default();
        assert!(!policy.window_elapsed(at(1, 22), at(2, 21)));
        assert!(policy.window_elapsed(at(1, 22), at(2, 22)));
        assert_eq!(policy.next_window(at(1, 22)), at(2, 22));
    }

    #[test]
    fn calendar_window_rolls_at_utc_midnight() {
        let policy = LikePolicy {
            window: BudgetWindow::Calendar,
            ..LikePolicy::default()
        };
        assert!(!policy.window_elapsed(at(1, 1), at(1, 23)));
        assert!(policy.window_elapsed(at(1, 23), at(2, 0)));
        assert_eq!(policy.next_window(at(1, 23)), at(2, 0));
    }

    #[test]
    fn refresh_only_resets_automatic_budgets() {
        let mut allowance = LikeAllowance::new(0, at(1, 8));
        let claim = LikePolicy {
            replenishment: Replenishment::OnClaim,
            ..LikePolicy::default()
        };
        claim.refresh(&mut allowance, at(3, 8));
        assert_eq!(allowance.available, 0);

        LikePolicy::default().refresh(&mut allowance, at(3, 8));
        assert_eq!(allowance.available, 3);
        assert_eq!(allowance.last_recharge_at, at(3, 8));
    }

    #[test]
    fn cooldown_expires_after_exactly_one_period() {
        let policy = LikePolicy::default();
        let target = UserId::from("user-b");
        let mut allowance = LikeAllowance::new(3, at(1, 8));
        allowance.last_liked.insert(target.clone(), at(1, 9));

        assert_eq!(
            policy.cooldown_until(&allowance, &target, at(2, 8)),
            Some(at(2, 9))
        );
        assert_eq!(policy.cooldown_until(&allowance, &target, at(2, 9)), None);
        assert_eq!(
            policy.cooldown_until(&allowance, &UserId::from("other"), at(1, 10)),
            None
        );
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let policy = LikePolicy {
            period: Duration::hours(2_500_000_000),
            cooldown: Duration::hours(2_500_000_000),
            ..LikePolicy::default()
        };
        let target = UserId::from("user-b");
        let mut allowance = LikeAllowance::new(3, at(1, 8));
        allowance.last_liked.insert(target.clone(), at(1, 9));

        assert_eq!(policy.next_window(at(1, 8)), DateTime::<Utc>::MAX_UTC);
        assert_eq!(
            policy.cooldown_until(&allowance, &target, at(2, 9)),
            Some(DateTime::<Utc>::MAX_UTC)
        );
    }
}
