//! Named relative dates.
//!
//! Matches names such as `today`, `eom`, `easter` or `21st` by
//! case-insensitive prefix (minimum 3 characters) and resolves them
//! against the current local date.

use tsk_util::autocomplete;

use crate::date::{days_in_month, CalDate, DAY};

/// Supported relative names, weekday names included.
const RELATIVES: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "now",
    "today",
    "tomorrow",
    "yesterday",
    "eow",
    "eoww",
    "eocw",
    "eom",
    "eoq",
    "eoy",
    "sow",
    "soww",
    "socw",
    "som",
    "soq",
    "soy",
    "goodfriday",
    "easter",
    "eastermonday",
    "ascension",
    "pentecost",
    "midsommar",
    "midsommarafton",
    "later",
    "someday",
];

/// Day-of-week number for a weekday name, 0 = Sunday. Accepts a
/// case-insensitive prefix of at least 3 characters.
pub fn day_of_week(name: &str) -> Option<u32> {
    const DAYS: &[&str] = &[
        "sunday",
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
    ];
    let lower = name.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    DAYS.iter()
        .position(|d| d.starts_with(&lower))
        .map(|i| i as u32)
}

/// Resolve a named relative date against today. `weekstart` is the
/// configured first day of the week, 0 = Sunday.
pub fn parse_named(input: &str, weekstart: u32) -> Option<CalDate> {
    if let Some(date) = parse_ordinal(input) {
        return Some(date);
    }

    let lower = input.to_lowercase();
    let supported: Vec<String> = RELATIVES.iter().map(|r| r.to_string()).collect();
    let matches = autocomplete(&lower, &supported, 3);
    if matches.len() != 1 {
        return None;
    }
    let found = matches[0].as_str();

    let now = CalDate::now();
    let today = now.start_of_day();

    // Day-of-week style names resolve to the next strictly-future
    // occurrence, wrapping a full week when today is the target day.
    let dow_target = match found {
        "eow" | "eoww" => Some(5),
        "eocw" => Some((weekstart + 6) % 7),
        "sow" | "soww" => Some(1),
        "socw" => Some(weekstart),
        other => day_of_week(other),
    };
    if let Some(dow) = dow_target {
        let today_dow = today.day_of_week();
        let ahead = if today_dow >= dow {
            dow + 7 - today_dow
        } else {
            dow - today_dow
        };
        return Some(CalDate::from_epoch(today.epoch() + ahead as i64 * DAY).start_of_day());
    }

    match found {
        "now" => Some(now),
        "today" => Some(today),
        "tomorrow" => Some(CalDate::from_epoch(today.epoch() + DAY).start_of_day()),
        "yesterday" => Some(CalDate::from_epoch(today.epoch() - DAY).start_of_day()),
        "som" => Some(today.start_of_month()),
        "eom" => {
            let (m, y) = (today.month(), today.year());
            CalDate::local(y, m, days_in_month(m, y), 0, 0, 0).ok()
        }
        "soq" => {
            let q = quarter_start_month(today.month());
            CalDate::local(today.year(), q, 1, 0, 0, 0).ok()
        }
        "eoq" => {
            let q = quarter_start_month(today.month()) + 2;
            CalDate::local(today.year(), q, days_in_month(q, today.year()), 0, 0, 0).ok()
        }
        "soy" => Some(today.start_of_year()),
        "eoy" => CalDate::local(today.year(), 12, 31, 0, 0, 0).ok(),
        "goodfriday" => CalDate::easter(today.year())
            .ok()
            .map(|e| CalDate::from_epoch(e.epoch() - 2 * DAY)),
        "easter" => CalDate::easter(today.year()).ok(),
        "eastermonday" => CalDate::easter(today.year())
            .ok()
            .map(|e| CalDate::from_epoch(e.epoch() + DAY)),
        "ascension" => CalDate::easter(today.year())
            .ok()
            .map(|e| CalDate::from_epoch(e.epoch() + 39 * DAY)),
        "pentecost" => CalDate::easter(today.year())
            .ok()
            .map(|e| CalDate::from_epoch(e.epoch() + 49 * DAY)),
        "midsommar" => june_weekday(today.year(), 20, 26, 6),
        "midsommarafton" => june_weekday(today.year(), 19, 25, 5),
        "later" | "someday" => CalDate::local(2038, 1, 18, 0, 0, 0).ok(),
        _ => None,
    }
}

/// First month of the quarter containing `month`.
fn quarter_start_month(month: u32) -> u32 {
    match month {
        1..=3 => 1,
        4..=6 => 4,
        7..=9 => 7,
        _ => 10,
    }
}

/// The day in June within [lo, hi] that falls on `dow`.
fn june_weekday(year: i32, lo: u32, hi: u32, dow: u32) -> Option<CalDate> {
    for day in lo..=hi {
        if let Ok(date) = CalDate::local(year, 6, day, 0, 0, 0) {
            if date.day_of_week() == dow {
                return Some(date);
            }
        }
    }
    None
}

/// Ordinal day-of-month: `21st` means the next date whose day-of-month
/// is 21, skipping months too short for the requested day.
fn parse_ordinal(input: &str) -> Option<CalDate> {
    let lower = input.to_lowercase();
    let digits_end = lower.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let suffix = &lower[digits_end..];
    if !matches!(suffix, "st" | "nd" | "rd" | "th") {
        return None;
    }
    let n: u32 = lower[..digits_end].parse().ok()?;
    if !(1..=31).contains(&n) {
        return None;
    }

    let today = CalDate::now().start_of_day();
    let mut y = today.year();
    let mut m = today.month();
    if n <= today.day() {
        advance_month(&mut m, &mut y);
    }
    while n > days_in_month(m, y) {
        advance_month(&mut m, &mut y);
    }
    CalDate::local(y, m, n, 0, 0, 0).ok()
}

fn advance_month(m: &mut u32, y: &mut i32) {
    *m += 1;
    if *m > 12 {
        *m = 1;
        *y += 1;
    }
}
