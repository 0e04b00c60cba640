use serde::Deserialize;
use time::{macros::date, Date, UtcOffset};

use crate::meals::format::parse_iso_date;

/// Verification settings for session tokens issued by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub audience: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    /// First day shown on the calendar grid.
    pub calendar_start: Date,
    /// Offset used for "today" and report timestamps.
    pub utc_offset: UtcOffset,
    /// On the first toggle of a date, mark the other two meals as taken.
    pub seed_untouched_meals: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_JWT_SECRET")?,
            audience: std::env::var("SESSION_JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".into()),
            issuer: std::env::var("SESSION_JWT_ISSUER").ok().filter(|v| !v.is_empty()),
        };
        let calendar_start = match std::env::var("CALENDAR_START_DATE") {
            Ok(v) => parse_iso_date(&v)
                .map_err(|e| anyhow::anyhow!("CALENDAR_START_DATE '{v}': {e}"))?,
            Err(_) => date!(2024-05-02),
        };
        let offset_minutes = std::env::var("REPORT_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(330);
        let utc_offset = UtcOffset::from_whole_seconds(offset_minutes * 60)?;
        Ok(Self {
            database_url,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            session,
            calendar_start,
            utc_offset,
            seed_untouched_meals: std::env::var("MEAL_SEED_UNTOUCHED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        })
    }
}

fn parse_flag(v: &str) -> bool {
    !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}
