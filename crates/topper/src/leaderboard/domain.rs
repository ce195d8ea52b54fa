use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hobby selections accepted at profile entry.
pub const MAX_HOBBIES: usize = 5;

/// Stable identifier for a user record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Currency amount held in minor units (kopecks).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub const fn from_major(major: u64) -> Self {
        Self(major * 100)
    }

    pub fn minor(self) -> u64 {
        self.0
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Identifier of a catalog gift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GiftId(pub String);

/// Catalog gift. Receivers keep their own copy, so catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,
    pub name: String,
    pub cost: Money,
    pub rating: i64,
    pub icon: String,
}

/// Self-described profile attributes. Everything is optional so half-finished profiles still score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub relationship_status: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Profile {
    /// City the user competes in, if one is set.
    pub fn city(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }
}

/// Like budget and per-target cooldown bookkeeping for the acting side of a like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeAllowance {
    pub available: u32,
    pub given_total: u64,
    pub last_recharge_at: DateTime<Utc>,
    #[serde(default)]
    pub last_liked: BTreeMap<UserId, DateTime<Utc>>,
}

impl LikeAllowance {
    pub fn new(available: u32, now: DateTime<Utc>) -> Self {
        Self {
            available,
            given_total: 0,
            last_recharge_at: now,
            last_liked: BTreeMap::new(),
        }
    }
}

/// Profile plus social standing. `rating` is a display cache; decisions always rescore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub profile: Profile,
    pub likes_received: u64,
    pub gifts_received: Vec<Gift>,
    pub passive_rating: i64,
    pub balance: Money,
    pub likes: LikeAllowance,
    #[serde(default)]
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: UserId,
        login: impl Into<String>,
        profile: Profile,
        like_budget: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            login: login.into(),
            profile,
            likes_received: 0,
            gifts_received: Vec::new(),
            passive_rating: 0,
            balance: Money::ZERO,
            likes: LikeAllowance::new(like_budget, now),
            rating: 0,
            created_at: now,
        }
    }

    pub fn city(&self) -> Option<&str> {
        self.profile.city()
    }
}

/// Registration payload handed over by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub login: String,
    #[serde(default)]
    pub profile: Profile,
}

/// Partial profile edit. `Some("")` clears a text field and `Some(0)` clears the age.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub hobbies: Option<Vec<String>>,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub relationship_status: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ProfilePatch {
    /// Applies the patch to a copy of `profile`; the original is untouched on error.
    pub fn apply(self, profile: &Profile) -> Result<Profile, ValidationError> {
        let mut next = profile.clone();

        if let Some(name) = self.name {
            next.name = name.trim().to_string();
        }
        if let Some(age) = self.age {
            next.age = (age > 0).then_some(age);
        }
        if let Some(location) = self.location {
            next.location = non_blank(location);
        }
        if let Some(hobbies) = self.hobbies {
            next.hobbies = normalize_hobbies(hobbies)?;
        }
        if let Some(about_me) = self.about_me {
            next.about_me = non_blank(about_me);
        }
        if let Some(status) = self.relationship_status {
            next.relationship_status = non_blank(status);
        }
        if let Some(url) = self.avatar_url {
            next.avatar_url = non_blank(url);
        }
        if let Some(note) = self.note {
            next.note = non_blank(note);
        }

        Ok(next)
    }
}

/// Cleans a freshly registered profile the same way an edit would.
pub fn normalize_profile(profile: Profile) -> Result<Profile, ValidationError> {
    let patch = ProfilePatch {
        name: Some(profile.name),
        age: profile.age,
        location: profile.location,
        hobbies: Some(profile.hobbies),
        about_me: profile.about_me,
        relationship_status: profile.relationship_status,
        avatar_url: profile.avatar_url,
        note: profile.note,
    };
    patch.apply(&Profile::default())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_hobbies(hobbies: Vec<String>) -> Result<Vec<String>, ValidationError> {
    let mut cleaned: Vec<String> = Vec::with_capacity(hobbies.len());
    for hobby in hobbies {
        let hobby = hobby.trim();
        if hobby.is_empty() || cleaned.iter().any(|existing| existing == hobby) {
            continue;
        }
        cleaned.push(hobby.to_string());
    }

    if cleaned.len() > MAX_HOBBIES {
        return Err(ValidationError::TooManyHobbies {
            max: MAX_HOBBIES,
            found: cleaned.len(),
        });
    }

    Ok(cleaned)
}

/// Malformed input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("login must not be empty")]
    EmptyLogin,
    #[error("login '{0}' is already taken")]
    LoginTaken(String),
    #[error("at most {max} hobbies allowed, found {found}")]
    TooManyHobbies { max: usize, found: usize },
    #[error("users cannot {action} themselves")]
    SelfTarget { action: &'static str },
    #[error("unknown gift '{0}'")]
    UnknownGift(String),
    #[error("gift '{0}' has no cost configured")]
    FreeGift(String),
    #[error("top-up amount must be between {min} and {max}, got {found}")]
    TopUpOutOfRange { min: u64, max: u64, found: u64 },
    #[error("like budget refills automatically and cannot be claimed")]
    ClaimUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_clears_blank_fields_and_trims() {
        let profile = Profile {
            name: "Olena".to_string(),
            location: Some("Lviv".to_string()),
            about_me: Some("hello".to_string()),
            ..Profile::default()
        };
        let patch = ProfilePatch {
            name: Some("  Olena K ".to_string()),
            location: Some("   ".to_string()),
            age: Some(0),
            ..ProfilePatch::default()
        };

        let updated = patch.apply(&profile).expect("patch applies");
        assert_eq!(updated.name, "Olena K");
        assert_eq!(updated.location, None);
        assert_eq!(updated.age, None);
        assert_eq!(updated.about_me.as_deref(), Some("hello"));
    }

    #[test]
    fn patch_rejects_more_than_five_distinct_hobbies() {
        let hobbies = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let patch = ProfilePatch {
            hobbies: Some(hobbies),
            ..ProfilePatch::default()
        };

        assert_eq!(
            patch.apply(&Profile::default()),
            Err(ValidationError::TooManyHobbies { max: 5, found: 6 })
        );
    }

    #[test]
    fn duplicate_hobbies_collapse_before_the_cap() {
        let hobbies = ["music", "music", " chess ", "chess", "", "art"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let patch = ProfilePatch {
            hobbies: Some(hobbies),
            ..ProfilePatch::default()
        };

        let updated = patch.apply(&Profile::default()).expect("patch applies");
        assert_eq!(updated.hobbies, vec!["music", "chess", "art"]);
    }

    #[test]
    fn money_displays_major_and_minor_units() {
        assert_eq!(Money::from_minor(499).to_string(), "4.99");
        assert_eq!(Money::from_major(10).to_string(), "10.00");
    }
}
