//! Profile scoring: a pure, total function from a user snapshot to an integer rating.

mod rules;

use serde::{Deserialize, Serialize};

use super::domain::User;

/// Rating of `user` at this instant. Never fails and never reads anything but `user`.
pub fn score(user: &User) -> i64 {
    rules::score_components(user)
        .iter()
        .fold(0i64, |total, component| total.saturating_add(component.points))
}

/// Refreshes the display copy of the rating stored on the record.
pub(crate) fn refresh_display_rating(user: &mut User) {
    user.rating = score(user);
}

/// Per-source view of a rating so profile pages can explain where points came from.
pub fn breakdown(user: &User) -> ScoreBreakdown {
    let components = rules::score_components(user);
    let total = components
        .iter()
        .fold(0i64, |total, component| total.saturating_add(component.points));
    ScoreBreakdown { total, components }
}

/// Attribute or counter that contributed to a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Name,
    Age,
    Location,
    Hobbies,
    AboutMe,
    RelationshipStatus,
    Likes,
    Gifts,
    PassiveBonus,
}

/// Discrete contribution to a rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub source: ScoreSource,
    pub points: i64,
}

impl ScoreComponent {
    fn new(source: ScoreSource, points: i64) -> Self {
        Self { source, points }
    }
}

/// Rating total plus the components that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: i64,
    pub components: Vec<ScoreComponent>,
}

impl ScoreBreakdown {
    pub fn points_from(&self, source: ScoreSource) -> i64 {
        self.components
            .iter()
            .filter(|component| component.source == source)
            .map(|component| component.points)
            .sum()
    }
}
