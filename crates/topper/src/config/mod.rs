use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::leaderboard::{BudgetWindow, LeaderboardConfig, LikePolicy, Replenishment, SweepPolicy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub leaderboard: LeaderboardConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            leaderboard: load_leaderboard()?,
        })
    }
}

/// Upper bound for hour-based like settings, one century.
const MAX_POLICY_HOURS: i64 = 24 * 365 * 100;
/// Upper bound for the sweep interval, one century.
const MAX_SWEEP_INTERVAL_SECS: u64 = 3_600 * 24 * 365 * 100;

fn load_leaderboard() -> Result<LeaderboardConfig, ConfigError> {
    let defaults = LeaderboardConfig::default();

    let budget: u32 = positive("APP_LIKE_BUDGET", defaults.likes.budget)?;
    let refill_amount: u32 = positive("APP_LIKE_REFILL_AMOUNT", defaults.likes.refill_amount)?;
    let period_hours = bounded("APP_LIKE_PERIOD_HOURS", 24, MAX_POLICY_HOURS)?;
    let cooldown_hours = bounded("APP_LIKE_COOLDOWN_HOURS", 24, MAX_POLICY_HOURS)?;

    let replenishment = match var_or("APP_LIKE_REPLENISHMENT", "automatic").as_str() {
        "automatic" | "auto" => Replenishment::Automatic,
        "claim" | "on_claim" => Replenishment::OnClaim,
        other => return Err(ConfigError::invalid_choice("APP_LIKE_REPLENISHMENT", other)),
    };
    let window = match var_or("APP_LIKE_WINDOW", "rolling").as_str() {
        "rolling" => BudgetWindow::Rolling,
        "calendar" => BudgetWindow::Calendar,
        other => return Err(ConfigError::invalid_choice("APP_LIKE_WINDOW", other)),
    };

    let sweep_enabled = match var_or("APP_SWEEP_ENABLED", "true").as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        other => return Err(ConfigError::invalid_choice("APP_SWEEP_ENABLED", other)),
    };
    let interval_secs = bounded(
        "APP_SWEEP_INTERVAL_SECS",
        defaults.sweep_interval.as_secs(),
        MAX_SWEEP_INTERVAL_SECS,
    )?;
    let bonus: i64 = positive("APP_SWEEP_BONUS", defaults.sweep.bonus)?;
    let winners_per_city: usize = positive("APP_SWEEP_WINNERS", defaults.sweep.winners_per_city)?;

    Ok(LeaderboardConfig {
        likes: LikePolicy {
            budget,
            refill_amount,
            period: chrono::Duration::hours(period_hours),
            window,
            replenishment,
            cooldown: chrono::Duration::hours(cooldown_hours),
        },
        sweep: SweepPolicy {
            bonus,
            winners_per_city,
        },
        sweep_enabled,
        sweep_interval: Duration::from_secs(interval_secs),
    })
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_else(|_| default.to_string())
}

fn positive<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}

/// Like [`positive`], but also rejects values above `max`.
fn bounded<T>(key: &'static str, default: T, max: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let value = positive(key, default)?;
    if value > max {
        return Err(ConfigError::InvalidNumber {
            key,
            value: env::var(key).unwrap_or_default(),
        });
    }
    Ok(value)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidChoice { key: &'static str, value: String },
}

impl ConfigError {
    fn invalid_choice(key: &'static str, value: &str) -> Self {
        Self::InvalidChoice {
            key,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number, got '{value}'")
            }
            ConfigError::InvalidChoice { key, value } => {
                write!(f, "{key} does not accept '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidChoice { .. } => None,
        }
    }
}
