use crate::infra::InMemoryUserStore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Args;
use std::sync::Arc;
use topper::config::AppConfig;
use topper::error::AppError;
use topper::leaderboard::{
    GiftId, LeaderboardConfig, LeaderboardError, LeaderboardScope, LeaderboardService,
    ManualClock, Profile, RankedUser, Registration, SweepReport, UserId,
};

type DemoService = LeaderboardService<InMemoryUserStore, ManualClock>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated start instant (RFC 3339). Defaults to 2025-05-01T09:00:00Z.
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) start: Option<DateTime<Utc>>,
    /// Number of simulated days, each closed by a passive sweep.
    #[arg(long, default_value_t = 2)]
    pub(crate) days: u32,
}

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Sweep cycles to run back to back over the demo population.
    #[arg(long, default_value_t = 1)]
    pub(crate) cycles: u32,
    /// Print the final sweep report as JSON instead of a summary.
    #[arg(long)]
    pub(crate) json: bool,
}

struct Seed {
    login: &'static str,
    name: &'static str,
    city: Option<&'static str>,
    hobbies: &'static [&'static str],
    top_up: u64,
}

const POPULATION: &[Seed] = &[
    Seed {
        login: "oksana",
        name: "Oksana",
        city: Some("Kyiv"),
        hobbies: &["tennis", "jazz"],
        top_up: 200,
    },
    Seed {
        login: "dmytro",
        name: "Dmytro",
        city: Some("Kyiv"),
        hobbies: &["chess"],
        top_up: 50,
    },
    Seed {
        login: "sofia",
        name: "Sofia",
        city: Some("Kyiv"),
        hobbies: &[],
        top_up: 0,
    },
    Seed {
        login: "maksym",
        name: "Maksym",
        city: Some("Kyiv"),
        hobbies: &["running", "films", "cooking"],
        top_up: 0,
    },
    Seed {
        login: "yulia",
        name: "Yulia",
        city: Some("Lviv"),
        hobbies: &["coffee"],
        top_up: 120,
    },
    Seed {
        login: "andriy",
        name: "Andriy",
        city: Some("Lviv"),
        hobbies: &[],
        top_up: 0,
    },
    Seed {
        login: "nomad",
        name: "Nomad",
        city: None,
        hobbies: &["travel", "photo", "maps"],
        top_up: 10,
    },
];

fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn build_service(
    config: &LeaderboardConfig,
    start: DateTime<Utc>,
) -> (DemoService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let service = LeaderboardService::new(
        Arc::new(InMemoryUserStore::default()),
        clock.clone(),
        config,
    );
    (service, clock)
}

fn seed_population(service: &DemoService) -> Result<Vec<UserId>, AppError> {
    let mut ids = Vec::with_capacity(POPULATION.len());
    for seed in POPULATION {
        let record = service.register(Registration {
            login: seed.login.to_string(),
            profile: Profile {
                name: seed.name.to_string(),
                location: seed.city.map(str::to_string),
                hobbies: seed.hobbies.iter().map(|hobby| hobby.to_string()).collect(),
                ..Profile::default()
            },
        })?;
        if seed.top_up > 0 {
            service.top_up(&record.user.id, seed.top_up)?;
        }
        ids.push(record.user.id);
    }
    Ok(ids)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?.leaderboard;
    let start = args.start.unwrap_or_else(default_start);
    let (service, clock) = build_service(&config, start);
    let ids = seed_population(&service)?;

    println!("Topper rating demo starting {}", start.to_rfc3339());
    println!(
        "- {} users registered, {} gifts in the catalog",
        ids.len(),
        service.gifts().len()
    );
    render_board(
        "Initial standings",
        &service.leaderboard(&LeaderboardScope::Global)?,
    );

    for day in 1..=args.days {
        println!("\nDay {day}");
        play_day(&service, &ids)?;

        clock.advance(Duration::hours(24));
        let report = service.run_sweep()?;
        render_sweep(&report);
    }

    render_board(
        "\nFinal standings",
        &service.leaderboard(&LeaderboardScope::Global)?,
    );
    for city in ["Kyiv", "Lviv"] {
        render_board(&format!("\n{city} podium"), &service.city_podium(city)?);
    }

    Ok(())
}

/// Every user likes the next two in the list; the first and last users then swap gifts.
fn play_day(service: &DemoService, ids: &[UserId]) -> Result<(), AppError> {
    for (index, actor) in ids.iter().enumerate() {
        for offset in 1..=2 {
            let target = &ids[(index + offset) % ids.len()];
            report_outcome(actor, "like", target, service.like(actor, target))?;
        }
    }

    if let [first, second, ..] = ids {
        report_outcome(first, "repeat like", second, service.like(first, second))?;
    }

    let gift = GiftId("gift-5".to_string());
    if let [first, .., last] = ids {
        report_outcome(first, "gift", last, service.send_gift(first, last, &gift))?;
        report_outcome(last, "gift", first, service.send_gift(last, first, &gift))?;
    }

    Ok(())
}

/// Prints business rejections and propagates everything else.
fn report_outcome<T>(
    actor: &UserId,
    action: &str,
    target: &UserId,
    outcome: Result<T, LeaderboardError>,
) -> Result<(), AppError> {
    match outcome {
        Ok(_) => Ok(()),
        Err(LeaderboardError::Store(err)) => Err(LeaderboardError::Store(err).into()),
        Err(err) => {
            println!("  {actor} {action} -> {target} rejected [{}]: {err}", err.code());
            Ok(())
        }
    }
}

pub(crate) fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?.leaderboard;
    let (service, clock) = build_service(&config, default_start());
    seed_population(&service)?;

    let mut last_report = None;
    let interval = Duration::from_std(config.sweep_interval).unwrap_or(Duration::hours(24));
    for _ in 0..args.cycles.max(1) {
        clock.advance(interval);
        last_report = Some(service.run_sweep()?);
    }
    let Some(report) = last_report else {
        return Ok(());
    };

    if args.json {
        let body = serde_json::to_string_pretty(&report)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{body}");
    } else {
        render_sweep(&report);
        for city in &report.plan.cities {
            let podium = service.city_podium(&city.city)?;
            render_board(&format!("\n{} podium", city.city), &podium);
        }
    }

    Ok(())
}

fn render_sweep(report: &SweepReport) {
    println!(
        "Passive sweep at {}: {} awarded, {} failed",
        report.started_at.to_rfc3339(),
        report.awarded.len(),
        report.failed.len()
    );
    for city in &report.plan.cities {
        let winners: Vec<&str> = city.winners.iter().map(|id| id.0.as_str()).collect();
        println!("  - {}: {}", city.city, winners.join(", "));
    }
    for failure in &report.failed {
        println!("  ! {} not awarded: {}", failure.user_id, failure.reason);
    }
}

fn render_board(title: &str, rows: &[RankedUser]) {
    println!("{title}");
    if rows.is_empty() {
        println!("  (nobody yet)");
    }
    for row in rows {
        println!(
            "  {:>2}. {:<10} {:>4} pts  {:<6} {} likes, {} gifts",
            row.rank,
            row.name,
            row.rating,
            row.location.as_deref().unwrap_or("-"),
            row.likes_received,
            row.gifts_received
        );
    }
}
