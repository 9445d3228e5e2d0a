//! Deferral options: the closed set of symbolic presets a caller can pick.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic deferral preset.
///
/// Serialized as its canonical kebab-case name. Parsing never fails:
/// legacy names are accepted as aliases and anything unrecognized falls back
/// to [`DeferralOption::NextFewHours`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeferralOption {
    /// now + 3h
    NextFewHours,
    /// 18:00 today, or tomorrow if already past
    ThisEvening,
    /// 08:00 tomorrow
    NextMorning,
    /// now + 3 days
    LaterThisWeek,
    /// 08:00 on the next Saturday (never today)
    UpcomingWeekend,
    /// 08:00 on the next Monday
    NextWeek,
    /// now + 14 days
    CoupleOfWeeks,
    /// now + 30 days
    NextMonth,
    /// No scheduled wake; restored manually only.
    Indefinite,
}

impl DeferralOption {
    pub const ALL: [DeferralOption; 9] = [
        DeferralOption::NextFewHours,
        DeferralOption::ThisEvening,
        DeferralOption::NextMorning,
        DeferralOption::LaterThisWeek,
        DeferralOption::UpcomingWeekend,
        DeferralOption::NextWeek,
        DeferralOption::CoupleOfWeeks,
        DeferralOption::NextMonth,
        DeferralOption::Indefinite,
    ];

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            DeferralOption::NextFewHours => "next-few-hours",
            DeferralOption::ThisEvening => "this-evening",
            DeferralOption::NextMorning => "next-morning",
            DeferralOption::LaterThisWeek => "later-this-week",
            DeferralOption::UpcomingWeekend => "upcoming-weekend",
            DeferralOption::NextWeek => "next-week",
            DeferralOption::CoupleOfWeeks => "couple-of-weeks",
            DeferralOption::NextMonth => "next-month",
            DeferralOption::Indefinite => "indefinite",
        }
    }

    /// Human readable description of the rule.
    pub fn label(self) -> &'static str {
        match self {
            DeferralOption::NextFewHours => "3 hours from now",
            DeferralOption::ThisEvening => "6pm today",
            DeferralOption::NextMorning => "8am tomorrow",
            DeferralOption::LaterThisWeek => "3 days from now",
            DeferralOption::UpcomingWeekend => "8am Saturday",
            DeferralOption::NextWeek => "8am next Monday",
            DeferralOption::CoupleOfWeeks => "2 weeks from now",
            DeferralOption::NextMonth => "30 days from now",
            DeferralOption::Indefinite => "Indefinitely",
        }
    }

    pub fn is_indefinite(self) -> bool {
        matches!(self, DeferralOption::Indefinite)
    }

    /// Lenient parse. Unknown names resolve like "next few hours".
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "next-few-hours" | "later-today" => DeferralOption::NextFewHours,
            "this-evening" | "tonight" => DeferralOption::ThisEvening,
            "next-morning" | "tomorrow" => DeferralOption::NextMorning,
            "later-this-week" => DeferralOption::LaterThisWeek,
            "upcoming-weekend" | "this-weekend" => DeferralOption::UpcomingWeekend,
            "next-week" => DeferralOption::NextWeek,
            "couple-of-weeks" | "couple-weeks" => DeferralOption::CoupleOfWeeks,
            "next-month" => DeferralOption::NextMonth,
            "indefinite" | "someday" => DeferralOption::Indefinite,
            other => {
                tracing::debug!(option = other, "unrecognized deferral option, using next-few-hours");
                DeferralOption::NextFewHours
            }
        }
    }
}

impl From<String> for DeferralOption {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for DeferralOption {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<DeferralOption> for String {
    fn from(value: DeferralOption) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeferralOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
