//! Time-remaining classification and wake labels for display.

use chrono::{DateTime, Days, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use super::item::Deferral;

/// Gap between now and a wake instant, in its largest non-zero unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Overdue,
    Minutes(i64),
    Hours(i64),
    Days(i64),
    /// Unscheduled deferral; never due.
    Someday,
}

impl TimeRemaining {
    pub fn is_overdue(self) -> bool {
        matches!(self, TimeRemaining::Overdue)
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, unit) = match self {
            TimeRemaining::Overdue => return f.write_str("Overdue"),
            TimeRemaining::Someday => return f.write_str("Someday"),
            TimeRemaining::Minutes(n) => (n, "minute"),
            TimeRemaining::Hours(n) => (n, "hour"),
            TimeRemaining::Days(n) => (n, "day"),
        };
        let plural = if *n == 1 { "" } else { "s" };
        write!(f, "{n} {unit}{plural}")
    }
}

impl Serialize for TimeRemaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Floor-rounded gap from `now` to `wake_at`.
pub fn time_remaining(wake_at: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let gap = wake_at - now;
    if gap <= chrono::Duration::zero() {
        return TimeRemaining::Overdue;
    }

    let minutes = gap.num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        TimeRemaining::Days(days)
    } else if hours > 0 {
        TimeRemaining::Hours(hours)
    } else {
        TimeRemaining::Minutes(minutes)
    }
}

pub fn remaining(deferral: Deferral, now: DateTime<Utc>) -> TimeRemaining {
    match deferral {
        Deferral::Scheduled { wake_at } => time_remaining(wake_at, now),
        Deferral::Unscheduled => TimeRemaining::Someday,
    }
}

/// "Today at 18:00", "Tomorrow at 08:00", "Jul 20, 12:00" or "Someday",
/// relative to the local date of `now`.
pub fn format_wake_time<Tz: TimeZone>(deferral: Deferral, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let Deferral::Scheduled { wake_at } = deferral else {
        return "Someday".to_string();
    };

    let local = wake_at.with_timezone(&now.timezone());
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1));

    if local.date_naive() == today {
        format!("Today at {}", local.format("%H:%M"))
    } else if Some(local.date_naive()) == tomorrow {
        format!("Tomorrow at {}", local.format("%H:%M"))
    } else {
        local.format("%b %-d, %H:%M").to_string()
    }
}
