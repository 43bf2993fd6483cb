use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Upper bound for `MATCH_TTL_SECS` (30 days).
pub const MAX_MATCH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub host: String,
    pub port: u16,
    /// How long a player may sit in the waiting set without re-requesting.
    pub match_ttl_secs: i64,
    pub match_sweep_secs: u64,
    pub rating_k_factor: i32,
}

fn clamp_ttl_secs(secs: i64) -> i64 {
    let clamped = secs.clamp(1, MAX_MATCH_TTL_SECS);
    if clamped != secs {
        tracing::warn!(requested = secs, used = clamped, "MATCH_TTL_SECS out of range, clamped");
    }
    clamped
}

fn var_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET_KEY")
                .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string()),
            jwt_expire_hours: var_or("JWT_EXPIRE_HOURS", 168), // 7 days
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: var_or("PORT", 8000),
            match_ttl_secs: clamp_ttl_secs(var_or("MATCH_TTL_SECS", 300)),
            match_sweep_secs: var_or("MATCH_SWEEP_SECS", 60).max(1),
            rating_k_factor: var_or("RATING_K_FACTOR", chess_core::rating::K_FACTOR),
        })
    }

    pub fn match_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(clamp_ttl_secs(self.match_ttl_secs))
            .unwrap_or_else(|| chrono::Duration::seconds(MAX_MATCH_TTL_SECS))
    }

    pub fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.match_sweep_secs)
    }

    pub fn elo(&self) -> chess_core::EloConfig {
        chess_core::EloConfig {
            k_factor: self.rating_k_factor,
            ..Default::default()
        }
    }
}
