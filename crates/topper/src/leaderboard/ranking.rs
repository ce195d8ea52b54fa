use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{User, UserId};
use super::rating::score;

/// Size of the per-city podium shown on the home view.
pub const PODIUM_SIZE: usize = 3;

/// Which slice of the user base a leaderboard covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "city")]
pub enum LeaderboardScope {
    Global,
    City(String),
}

/// One leaderboard row. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedUser {
    pub rank: usize,
    pub user_id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub rating: i64,
    pub likes_received: u64,
    pub gifts_received: usize,
}

/// Highest rating first; equal ratings fall back to ascending user id.
pub(crate) fn ranking_order(a: &(i64, &User), b: &(i64, &User)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id))
}

/// Scores and orders `users` for display.
pub fn rank<'a, I>(users: I) -> Vec<(i64, &'a User)>
where
    I: IntoIterator<Item = &'a User>,
{
    let mut scored: Vec<(i64, &User)> = users.into_iter().map(|u| (score(u), u)).collect();
    scored.sort_by(ranking_order);
    scored
}

pub fn leaderboard(users: &[User], scope: &LeaderboardScope) -> Vec<RankedUser> {
    let members = users.iter().filter(|user| match scope {
        LeaderboardScope::Global => true,
        LeaderboardScope::City(city) => user.city() == Some(city.trim()),
    });

    rank(members)
        .into_iter()
        .enumerate()
        .map(|(index, (rating, user))| RankedUser {
            rank: index + 1,
            user_id: user.id.clone(),
            name: user.profile.name.clone(),
            location: user.city().map(str::to_string),
            avatar_url: user.profile.avatar_url.clone(),
            rating,
            likes_received: user.likes_received,
            gifts_received: user.gifts_received.len(),
        })
        .collect()
}

pub fn city_podium(users: &[User], city: &str) -> Vec<RankedUser> {
    let mut rows = leaderboard(users, &LeaderboardScope::City(city.to_string()));
    rows.truncate(PODIUM_SIZE);
    rows
}
