//! ServiceConfig - タイムゾーンと保存キー

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::domain::{Deferral, DeferralOption, format_wake_time, resolve};

pub const DEFAULT_STORAGE_KEY: &str = "snoozed_tabs";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid time zone {0:?}: expected \"local\", \"utc\" or an offset like \"+09:00\"")]
    InvalidZone(String),
}

/// Zone in which wall-clock rules ("18:00", "next Monday") are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl Zone {
    pub fn resolve(&self, option: DeferralOption, now: DateTime<Utc>) -> Deferral {
        match self {
            Zone::Local => resolve(option, &now.with_timezone(&Local)),
            Zone::Utc => resolve(option, &now),
            Zone::Fixed(offset) => resolve(option, &now.with_timezone(offset)),
        }
    }

    pub fn wake_label(&self, deferral: Deferral, now: DateTime<Utc>) -> String {
        match self {
            Zone::Local => format_wake_time(deferral, &now.with_timezone(&Local)),
            Zone::Utc => format_wake_time(deferral, &now),
            Zone::Fixed(offset) => format_wake_time(deferral, &now.with_timezone(offset)),
        }
    }
}

impl FromStr for Zone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(Zone::Local),
            "utc" | "z" => return Ok(Zone::Utc),
            _ => {}
        }

        let invalid = || ConfigError::InvalidZone(s.to_string());
        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Zone::Fixed)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => f.write_str("local"),
            Zone::Utc => f.write_str("utc"),
            Zone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub zone: Zone,
    /// Key of the collection value in the host key-value store.
    pub storage_key: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            zone: Zone::Local,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}
