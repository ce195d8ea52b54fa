use super::super::domain::User;
use super::{ScoreComponent, ScoreSource};

pub(crate) const NAME_POINTS: i64 = 1;
pub(crate) const AGE_POINTS: i64 = 1;
pub(crate) const LOCATION_POINTS: i64 = 20;
pub(crate) const POINTS_PER_HOBBY: i64 = 2;
pub(crate) const ABOUT_ME_POINTS: i64 = 3;
pub(crate) const ABOUT_ME_MIN_CHARS: usize = 50;
pub(crate) const RELATIONSHIP_POINTS: i64 = 5;

/// Every point source that applies to `user`, in table order. Zero-valued sources are omitted.
pub(crate) fn score_components(user: &User) -> Vec<ScoreComponent> {
    let profile = &user.profile;
    let mut components = Vec::with_capacity(9);

    if !profile.name.trim().is_empty() {
        components.push(ScoreComponent::new(ScoreSource::Name, NAME_POINTS));
    }

    if profile.age.is_some_and(|age| age > 0) {
        components.push(ScoreComponent::new(ScoreSource::Age, AGE_POINTS));
    }

    // The city bonus outweighs every other completeness term combined.
    if profile.city().is_some() {
        components.push(ScoreComponent::new(ScoreSource::Location, LOCATION_POINTS));
    }

    if !profile.hobbies.is_empty() {
        let points = POINTS_PER_HOBBY * profile.hobbies.len() as i64;
        components.push(ScoreComponent::new(ScoreSource::Hobbies, points));
    }

    if profile
        .about_me
        .as_deref()
        .is_some_and(|text| text.chars().count() >= ABOUT_ME_MIN_CHARS)
    {
        components.push(ScoreComponent::new(ScoreSource::AboutMe, ABOUT_ME_POINTS));
    }

    if profile
        .relationship_status
        .as_deref()
        .is_some_and(|status| !status.trim().is_empty())
    {
        components.push(ScoreComponent::new(
            ScoreSource::RelationshipStatus,
            RELATIONSHIP_POINTS,
        ));
    }

    if user.likes_received > 0 {
        let points = i64::try_from(user.likes_received).unwrap_or(i64::MAX);
        components.push(ScoreComponent::new(ScoreSource::Likes, points));
    }

    if !user.gifts_received.is_empty() {
        let points = user
            .gifts_received
            .iter()
            .fold(0i64, |sum, gift| sum.saturating_add(gift.rating));
        components.push(ScoreComponent::new(ScoreSource::Gifts, points));
    }

    // Seed accounts may carry a negative passive rating; it is added as-is.
    if user.passive_rating != 0 {
        components.push(ScoreComponent::new(
            ScoreSource::PassiveBonus,
            user.passive_rating,
        ));
    }

    components
}
