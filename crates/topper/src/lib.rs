//! Rating and passive-bonus engine behind the Topper social leaderboard.
//!
//! The [`leaderboard`] module holds the scoring rules, the guarded like/gift mutations, and the
//! periodic city sweep. Persistence, authentication, and the wall clock are injected through
//! traits so the engine runs the same against the in-memory adapter, a hosted backend, or a
//! simulated clock in tests.

pub mod config;
pub mod error;
pub mod leaderboard;
pub mod telemetry;
