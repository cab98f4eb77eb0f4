//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;
const DEFAULT_LOGIN_RATE_LIMIT: u32 = 10;

#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite file (from CHALLENGE_BOARD_DB_PATH). `None` uses the platform data dir.
    pub db_path: Option<PathBuf>,
    /// How long a sign-in stays valid (from CHALLENGE_BOARD_SESSION_TTL_HOURS).
    pub session_ttl: chrono::Duration,
    /// Login attempts allowed per IP per minute (from CHALLENGE_BOARD_LOGIN_RATE_LIMIT).
    pub login_rate_limit: u32,
    /// Allowed CORS origins (from CHALLENGE_BOARD_CORS_ORIGINS, comma-separated).
    pub cors_origins: Option<Vec<String>>,
    /// Take the client IP from X-Forwarded-For / X-Real-IP
    /// (from CHALLENGE_BOARD_TRUST_PROXY). Only safe behind a proxy that
    /// overwrites those headers.
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = std::env::var("CHALLENGE_BOARD_DB_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let session_ttl_hours = std::env::var("CHALLENGE_BOARD_SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        let login_rate_limit = std::env::var("CHALLENGE_BOARD_LOGIN_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_LOGIN_RATE_LIMIT);

        let cors_origins = std::env::var("CHALLENGE_BOARD_CORS_ORIGINS")
            .ok()
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect());

        let trust_proxy = std::env::var("CHALLENGE_BOARD_TRUST_PROXY")
            .map(|s| parse_flag(&s))
            .unwrap_or(false);

        Self {
            db_path,
            session_ttl: chrono::Duration::hours(session_ttl_hours),
            login_rate_limit,
            cors_origins,
            trust_proxy,
        }
    }

    /// Resolve the database path, falling back to the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", "challenge-board")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("challenge-board.db"))
    }

    /// Sliding window used by the login rate limiter.
    pub fn login_rate_window(&self) -> Duration {
        Duration::from_secs(60)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            login_rate_limit: DEFAULT_LOGIN_RATE_LIMIT,
            cors_origins: None,
            trust_proxy: false,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
