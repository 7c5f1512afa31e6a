//! Human-relative durations ("about 3 hours ago", "in 2 days").
//!
//! Buckets follow the conventional English wording used across GitHub
//! tooling: minutes up to 45, "about N hours" up to a day, days up to a
//! month, then months and years.

use chrono::{DateTime, Datelike, Timelike, Utc};

const MINUTES_IN_DAY: f64 = 1_440.0;
const MINUTES_IN_ALMOST_TWO_DAYS: f64 = 2_520.0;
const MINUTES_IN_MONTH: f64 = 43_200.0;
const MINUTES_IN_TWO_MONTHS: f64 = 86_400.0;

/// Distance from `now` to `date`, with an "ago"/"in" suffix.
#[must_use]
pub fn format_distance_to_now(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let distance = format_distance(date, now);
    if date > now {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

/// Unsuffixed distance between two instants, order-independent.
#[must_use]
pub fn format_distance(date: DateTime<Utc>, base: DateTime<Utc>) -> String {
    let (earlier, later) = if date <= base { (date, base) } else { (base, date) };

    #[allow(clippy::cast_precision_loss)]
    let seconds = (later - earlier).num_seconds() as f64;
    let minutes = (seconds / 60.0).round();

    if minutes < 2.0 {
        return if minutes == 0.0 {
            "less than a minute".to_string()
        } else {
            plural(minutes, "1 minute", "minutes")
        };
    }
    if minutes < 45.0 {
        return plural(minutes, "1 minute", "minutes");
    }
    if minutes < 90.0 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = (minutes / 60.0).round();
        return about(plural(hours, "1 hour", "hours"));
    }
    if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = (minutes / MINUTES_IN_DAY).round();
        return plural(days, "1 day", "days");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        let months = (minutes / MINUTES_IN_MONTH).round();
        return about(plural(months, "1 month", "months"));
    }

    let months = calendar_months_between(earlier, later);
    if months < 12 {
        let nearest = (minutes / MINUTES_IN_MONTH).round();
        return plural(nearest, "1 month", "months");
    }

    let years = months / 12;
    match months % 12 {
        0..=2 => about(plural_count(years, "year")),
        3..=8 => format!("over {}", plural_count(years, "year")),
        _ => format!("almost {}", plural_count(years + 1, "year")),
    }
}

fn plural(count: f64, one: &str, many: &str) -> String {
    if count == 1.0 {
        one.to_string()
    } else {
        format!("{count} {many}")
    }
}

fn plural_count(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

fn about(distance: String) -> String {
    format!("about {distance}")
}

/// Whole calendar months between two instants, not counting a final
/// partial month.
fn calendar_months_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let mut months = i64::from(later.year() - earlier.year()) * 12
        + i64::from(later.month()) - i64::from(earlier.month());

    let later_in_month = (later.day(), later.num_seconds_from_midnight());
    let earlier_in_month = (earlier.day(), earlier.num_seconds_from_midnight());
    if months > 0 && later_in_month < earlier_in_month {
        months -= 1;
    }
    months
}
