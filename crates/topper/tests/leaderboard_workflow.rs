use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use topper::leaderboard::{
    apply_passive_bonus, score, Gift, GiftId, LeaderboardConfig, LeaderboardScope,
    LeaderboardService, ManualClock, Money, Profile, Registration, StoreError, User, UserId,
    UserRecord, UserStore, SweepPolicy,
};

#[derive(Default)]
struct VersionedStore {
    rows: Mutex<BTreeMap<UserId, UserRecord>>,
}

impl UserStore for VersionedStore {
    fn insert(&self, user: User) -> Result<UserRecord, StoreError> {
        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        if rows.values().any(|row| row.user.login == user.login) {
            return Err(StoreError::DuplicateLogin(user.login));
        }
        let record = UserRecord { user, version: 1 };
        rows.insert(record.user.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.rows.lock().expect("rows mutex poisoned").get(id).cloned())
    }

    fn fetch_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError> {
        let rows = self.rows.lock().expect("rows mutex poisoned");
        Ok(rows.values().find(|row| row.user.login == login).cloned())
    }

    fn all(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.rows.lock().expect("rows mutex poisoned").values().cloned().collect())
    }

    fn compare_and_swap(&self, writes: Vec<UserRecord>) -> Result<Vec<UserRecord>, StoreError> {
        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        for write in &writes {
            match rows.get(write.id()) {
                Some(row) if row.version == write.version => {}
                Some(_) => return Err(StoreError::Conflict(write.id().clone())),
                None => return Err(StoreError::NotFound(write.id().clone())),
            }
        }
        Ok(writes
            .into_iter()
            .map(|mut write| {
                write.version += 1;
                rows.insert(write.user.id.clone(), write.clone());
                write
            })
            .collect())
    }
}

fn member(login: &str, city: &str) -> Registration {
    Registration {
        login: login.to_string(),
        profile: Profile {
            name: login.to_string(),
            location: Some(city.to_string()),
            ..Profile::default()
        },
    }
}

#[test]
fn complete_profile_scores_fifty_one() {
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    let profile = Profile {
        name: "A".to_string(),
        age: Some(30),
        location: Some("Kyiv".to_string()),
        hobbies: vec!["x".to_string(), "y".to_string()],
        about_me: Some("a".repeat(60)),
        relationship_status: Some("single".to_string()),
        ..Profile::default()
    };
    let mut user = User::new(UserId::from("a"), "a", profile, 3, now);
    user.likes_received = 5;
    user.gifts_received.push(Gift {
        id: GiftId("gift-5".to_string()),
        name: "Heart".to_string(),
        cost: Money::from_minor(899),
        rating: 10,
        icon: "❤️".to_string(),
    });
    user.passive_rating = 2;

    assert_eq!(score(&user), 51);
}

#[test]
fn sweep_scenario_awards_both_cities() {
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    let seeded = |id: &str, city: &str, rating: i64| {
        let profile = Profile {
            location: Some(city.to_string()),
            ..Profile::default()
        };
        let mut user = User::new(UserId::from(id), id, profile, 3, now);
        user.passive_rating = rating - 20;
        user
    };
    let users = vec![
        seeded("lviv-40", "Lviv", 40),
        seeded("lviv-10", "Lviv", 10),
        seeded("kyiv-5", "Kyiv", 5),
    ];

    let swept = apply_passive_bonus(users.clone(), &SweepPolicy::default());

    let deltas: Vec<i64> = users
        .iter()
        .zip(&swept)
        .map(|(before, after)| after.passive_rating - before.passive_rating)
        .collect();
    assert_eq!(deltas, vec![2, 2, 2]);
}

#[test]
fn a_day_of_interactions_then_a_sweep() {
    let start = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let store = Arc::new(VersionedStore::default());
    let clock = Arc::new(ManualClock::new(start));
    let service = LeaderboardService::new(store, clock.clone(), &LeaderboardConfig::default());

    let ids: Vec<UserId> = ["ann", "bo", "cy", "di", "ed"]
        .into_iter()
        .map(|login| {
            service
                .register(member(login, "Kharkiv"))
                .expect("registered")
                .user
                .id
        })
        .collect();

    service.like(&ids[0], &ids[4]).expect("like");
    service.like(&ids[1], &ids[4]).expect("like");
    service.like(&ids[2], &ids[3]).expect("like");
    service.top_up(&ids[0], 100).expect("top up");
    service
        .send_gift(&ids[0], &ids[2], &GiftId("gift-4".to_string()))
        .expect("gift");

    let err = service.like(&ids[0], &ids[4]).expect_err("cooldown");
    assert_eq!(err.code(), "TARGET_COOLDOWN_ACTIVE");

    clock.advance(Duration::hours(24));
    let report = service.run_sweep().expect("sweep");
    assert_eq!(report.awarded.len(), 3);

    let board = service
        .leaderboard(&LeaderboardScope::City("Kharkiv".to_string()))
        .expect("board");
    let order: Vec<&UserId> = board.iter().map(|row| &row.user_id).collect();
    assert_eq!(order, vec![&ids[2], &ids[4], &ids[3], &ids[0], &ids[1]]);
    assert_eq!(board[0].rating, 21 + 25 + 2);
    assert_eq!(board[1].rating, 21 + 2 + 2);

    service.like(&ids[0], &ids[4]).expect("cooldown elapsed");
}
