//! Deferral rules: option + current time → wake instant.
//!
//! Pure functions. Wall-clock rules (18:00, 08:00, weekday targets) and
//! day offsets are evaluated in the time zone carried by `now`; the result is
//! always returned in UTC.
//!
//! # DST
//! Day offsets keep the local wall-clock time. An ambiguous local time picks
//! the earlier instant; a skipped local time moves one hour forward.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};

use super::item::Deferral;
use super::option::DeferralOption;

const EVENING_HOUR: u32 = 18;
const MORNING_HOUR: u32 = 8;
const SATURDAY_FROM_SUNDAY: u32 = 6;

/// Resolve a deferral option against `now`.
///
/// Never fails. Every scheduled result is strictly after `now`.
pub fn resolve<Tz: TimeZone>(option: DeferralOption, now: &DateTime<Tz>) -> Deferral {
    let tz = now.timezone();
    let today = now.date_naive();
    let weekday = now.weekday().num_days_from_sunday();

    let wake_at = match option {
        DeferralOption::NextFewHours => now.clone() + Duration::hours(3),
        DeferralOption::ThisEvening => {
            let tonight = at_hour(&tz, today, EVENING_HOUR);
            if tonight <= *now {
                at_hour(&tz, add_days(today, 1), EVENING_HOUR)
            } else {
                tonight
            }
        }
        DeferralOption::NextMorning => at_hour(&tz, add_days(today, 1), MORNING_HOUR),
        DeferralOption::LaterThisWeek => shift_days(now, 3),
        DeferralOption::UpcomingWeekend => {
            let days = if weekday == SATURDAY_FROM_SUNDAY {
                7
            } else {
                SATURDAY_FROM_SUNDAY - weekday
            };
            at_hour(&tz, add_days(today, u64::from(days)), MORNING_HOUR)
        }
        DeferralOption::NextWeek => {
            let days = if weekday == 0 { 1 } else { 8 - weekday };
            at_hour(&tz, add_days(today, u64::from(days)), MORNING_HOUR)
        }
        DeferralOption::CoupleOfWeeks => shift_days(now, 14),
        DeferralOption::NextMonth => shift_days(now, 30),
        DeferralOption::Indefinite => return Deferral::Unscheduled,
    };

    Deferral::Scheduled {
        wake_at: wake_at.with_timezone(&Utc),
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn at_hour<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    from_local(tz, date.and_time(time))
}

fn shift_days<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> DateTime<Tz> {
    match now.naive_local().checked_add_days(Days::new(days)) {
        Some(naive) => from_local(&now.timezone(), naive),
        None => now.clone() + Duration::days(days as i64),
    }
}

fn from_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(value) => value,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use rstest::rstest;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn wake(option: DeferralOption, now: &str) -> DateTime<Utc> {
        resolve(option, &utc(now)).wake_at().unwrap()
    }

    // 2025-07-17 is a Thursday.
    #[rstest]
    #[case::next_few_hours(DeferralOption::NextFewHours, "2025-07-17T15:00:00Z")]
    #[case::this_evening(DeferralOption::ThisEvening, "2025-07-17T18:00:00Z")]
    #[case::next_morning(DeferralOption::NextMorning, "2025-07-18T08:00:00Z")]
    #[case::later_this_week(DeferralOption::LaterThisWeek, "2025-07-20T12:00:00Z")]
    #[case::upcoming_weekend(DeferralOption::UpcomingWeekend, "2025-07-19T08:00:00Z")]
    #[case::next_week(DeferralOption::NextWeek, "2025-07-21T08:00:00Z")]
    #[case::couple_of_weeks(DeferralOption::CoupleOfWeeks, "2025-07-31T12:00:00Z")]
    #[case::next_month(DeferralOption::NextMonth, "2025-08-16T12:00:00Z")]
    fn resolves_from_thursday_noon(#[case] option: DeferralOption, #[case] expected: &str) {
        assert_eq!(wake(option, "2025-07-17T12:00:00Z"), utc(expected));
    }

    #[test]
    fn indefinite_is_unscheduled() {
        let now = utc("2025-07-17T12:00:00Z");
        assert_eq!(resolve(DeferralOption::Indefinite, &now), Deferral::Unscheduled);
    }

    #[rstest]
    #[case::before_six("2025-07-17T17:59:59Z", "2025-07-17T18:00:00Z")]
    #[case::exactly_six("2025-07-17T18:00:00Z", "2025-07-18T18:00:00Z")]
    #[case::after_six("2025-07-17T19:30:00Z", "2025-07-18T18:00:00Z")]
    #[case::new_year("2025-12-31T20:00:00Z", "2026-01-01T18:00:00Z")]
    fn this_evening_rolls_over_once_past_six(#[case] now: &str, #[case] expected: &str) {
        assert_eq!(wake(DeferralOption::ThisEvening, now), utc(expected));
    }

    #[rstest]
    #[case::early_hours("2025-07-17T01:00:00Z", "2025-07-18T08:00:00Z")]
    #[case::leap_day("2024-02-28T22:00:00Z", "2024-02-29T08:00:00Z")]
    #[case::month_end("2025-04-30T09:00:00Z", "2025-05-01T08:00:00Z")]
    fn next_morning_is_always_tomorrow(#[case] now: &str, #[case] expected: &str) {
        assert_eq!(wake(DeferralOption::NextMorning, now), utc(expected));
    }

    #[rstest]
    #[case::saturday_before_eight("2025-07-19T06:00:00Z", "2025-07-26T08:00:00Z")]
    #[case::saturday_afternoon("2025-07-19T15:00:00Z", "2025-07-26T08:00:00Z")]
    #[case::sunday("2025-07-20T10:00:00Z", "2025-07-26T08:00:00Z")]
    #[case::friday("2025-07-18T23:00:00Z", "2025-07-19T08:00:00Z")]
    fn upcoming_weekend_is_never_today(#[case] now: &str, #[case] expected: &str) {
        assert_eq!(wake(DeferralOption::UpcomingWeekend, now), utc(expected));
    }

    #[rstest]
    #[case::sunday("2025-07-20T10:00:00Z", "2025-07-21T08:00:00Z")]
    #[case::monday("2025-07-21T06:00:00Z", "2025-07-28T08:00:00Z")]
    #[case::saturday("2025-07-26T10:00:00Z", "2025-07-28T08:00:00Z")]
    fn next_week_targets_monday(#[case] now: &str, #[case] expected: &str) {
        assert_eq!(wake(DeferralOption::NextWeek, now), utc(expected));
    }

    #[test]
    fn wall_clock_rules_use_the_zone_of_now() {
        // 12:00Z is 21:00 in +09:00, already past 18:00 local.
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = utc("2025-07-17T12:00:00Z").with_timezone(&tokyo);

        let evening = resolve(DeferralOption::ThisEvening, &now).wake_at().unwrap();
        assert_eq!(evening, utc("2025-07-18T09:00:00Z"));

        let morning = resolve(DeferralOption::NextMorning, &now).wake_at().unwrap();
        assert_eq!(morning, utc("2025-07-17T23:00:00Z"));
    }

    #[test]
    fn scheduled_results_are_always_in_the_future() {
        let start = utc("2025-07-13T00:00:00Z");
        let zones = [
            FixedOffset::east_opt(0).unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap(),
            FixedOffset::east_opt(13 * 3600).unwrap(),
        ];
        for zone in zones {
            // every 37 minutes across two weeks hits every weekday/hour combination
            for step in 0..(14 * 24 * 60 / 37) {
                let now = (start + Duration::minutes(37 * step)).with_timezone(&zone);
                for option in DeferralOption::ALL {
                    match resolve(option, &now) {
                        Deferral::Scheduled { wake_at } => {
                            assert!(wake_at > now, "{option} at {now} resolved to {wake_at}")
                        }
                        Deferral::Unscheduled => assert!(option.is_indefinite()),
                    }
                }
            }
        }
    }
}
