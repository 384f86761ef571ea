//! Calendar dates.
//!
//! A `CalDate` is an epoch-second timestamp plus a flag recording whether
//! the value was derived in UTC. Calendar components (year, month, week)
//! are computed in the local zone unless the value is UTC-derived;
//! comparison is always by epoch.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};

use tsk_util::{Error, Result};

use crate::duration::Span;
use crate::format;
use crate::named;

/// Seconds in a day.
pub const DAY: i64 = 86_400;

/// A point on the calendar, second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalDate {
    epoch: i64,
    utc: bool,
}

impl CalDate {
    /// The current instant, local derivation.
    pub fn now() -> Self {
        CalDate {
            epoch: Utc::now().timestamp(),
            utc: false,
        }
    }

    /// From raw epoch seconds, local derivation.
    pub fn from_epoch(epoch: i64) -> Self {
        CalDate { epoch, utc: false }
    }

    /// From raw epoch seconds, UTC derivation.
    pub fn from_epoch_utc(epoch: i64) -> Self {
        CalDate { epoch, utc: true }
    }

    /// Build a local-zone date from calendar components, validating them.
    pub fn local(y: i32, m: u32, d: u32, h: u32, n: u32, s: u32) -> Result<Self> {
        if !valid(m, d, y, h, n, s) {
            return Err(Error::Validation(format!(
                "'{}-{}-{} {}:{}:{}' is not a valid date",
                y, m, d, h, n, s
            )));
        }
        let epoch = Local
            .with_ymd_and_hms(y, m, d, h, n, s)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| Error::Validation(format!("'{}-{}-{}' is not representable", y, m, d)))?;
        Ok(CalDate { epoch, utc: false })
    }

    /// Build a UTC date from calendar components, validating them.
    pub fn utc(y: i32, m: u32, d: u32, h: u32, n: u32, s: u32) -> Result<Self> {
        if !valid(m, d, y, h, n, s) {
            return Err(Error::Validation(format!(
                "'{}-{}-{} {}:{}:{}' is not a valid date",
                y, m, d, h, n, s
            )));
        }
        let epoch = Utc
            .with_ymd_and_hms(y, m, d, h, n, s)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| Error::Validation(format!("'{}-{}-{}' is not representable", y, m, d)))?;
        Ok(CalDate { epoch, utc: true })
    }

    /// Epoch seconds.
    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    /// Whether this value was derived in UTC.
    pub fn is_utc(&self) -> bool {
        self.utc
    }

    fn components(&self) -> DateTime<Local> {
        to_local(self.epoch)
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        if self.utc {
            to_utc(self.epoch).year()
        } else {
            self.components().year()
        }
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        if self.utc {
            to_utc(self.epoch).month()
        } else {
            self.components().month()
        }
    }

    /// Day of month, 1-31.
    pub fn day(&self) -> u32 {
        if self.utc {
            to_utc(self.epoch).day()
        } else {
            self.components().day()
        }
    }

    /// Hour, 0-23.
    pub fn hour(&self) -> u32 {
        if self.utc {
            to_utc(self.epoch).hour()
        } else {
            self.components().hour()
        }
    }

    /// Minute, 0-59.
    pub fn minute(&self) -> u32 {
        if self.utc {
            to_utc(self.epoch).minute()
        } else {
            self.components().minute()
        }
    }

    /// Second, 0-59.
    pub fn second(&self) -> u32 {
        if self.utc {
            to_utc(self.epoch).second()
        } else {
            self.components().second()
        }
    }

    /// Day of week, 0 = Sunday .. 6 = Saturday.
    pub fn day_of_week(&self) -> u32 {
        self.components().weekday().num_days_from_sunday()
    }

    /// Day of year, 1-366.
    pub fn day_of_year(&self) -> u32 {
        self.components().ordinal()
    }

    /// Week of year. ISO week numbering when the week starts on Monday,
    /// Sunday-origin numbering otherwise.
    pub fn week_of_year(&self, weekstart: u32) -> u32 {
        let dt = self.components();
        let directive = if weekstart == 1 { "%V" } else { "%U" };
        dt.format(directive).to_string().parse().unwrap_or(0)
    }

    /// Midnight at the start of this date's day.
    pub fn start_of_day(&self) -> Self {
        let c = self.components();
        CalDate::local(c.year(), c.month(), c.day(), 0, 0, 0).unwrap_or(*self)
    }

    /// Midnight at the start of this date's week, per the given week
    /// start day (0 = Sunday).
    pub fn start_of_week(&self, weekstart: u32) -> Self {
        let back = (self.day_of_week() + 7 - weekstart) % 7;
        CalDate::from_epoch(self.start_of_day().epoch - back as i64 * DAY).start_of_day()
    }

    /// Midnight on the first day of this date's month.
    pub fn start_of_month(&self) -> Self {
        let c = self.components();
        CalDate::local(c.year(), c.month(), 1, 0, 0, 0).unwrap_or(*self)
    }

    /// Midnight on January 1 of this date's year.
    pub fn start_of_year(&self) -> Self {
        let c = self.components();
        CalDate::local(c.year(), 1, 1, 0, 0, 0).unwrap_or(*self)
    }

    /// True when both dates fall on the same local calendar day.
    pub fn same_day(&self, other: &CalDate) -> bool {
        let a = self.components();
        let b = other.components();
        a.year() == b.year() && a.ordinal() == b.ordinal()
    }

    /// True when both dates fall in the same week, per the week start.
    pub fn same_week(&self, other: &CalDate, weekstart: u32) -> bool {
        self.start_of_week(weekstart).epoch == other.start_of_week(weekstart).epoch
    }

    /// True when both dates fall in the same local calendar month.
    pub fn same_month(&self, other: &CalDate) -> bool {
        let a = self.components();
        let b = other.components();
        a.year() == b.year() && a.month() == b.month()
    }

    /// True when both dates fall in the same local calendar year.
    pub fn same_year(&self, other: &CalDate) -> bool {
        self.components().year() == other.components().year()
    }

    /// True when both dates fall in the same local clock hour.
    pub fn same_hour(&self, other: &CalDate) -> bool {
        self.same_day(other) && self.components().hour() == other.components().hour()
    }

    /// Easter Sunday of the given year, local midnight.
    ///
    /// Anonymous Gregorian computus.
    pub fn easter(year: i32) -> Result<Self> {
        let a = year % 19;
        let b = year / 100;
        let c = year % 100;
        let d = b / 4;
        let e = b % 4;
        let f = (b + 8) / 25;
        let g = (b - f + 1) / 3;
        let h = (19 * a + b - d - g + 15) % 30;
        let i = c / 4;
        let k = c % 4;
        let l = (32 + 2 * e + 2 * i - h - k) % 7;
        let m = (a + 11 * h + 22 * l) / 451;
        let month = (h + l - 7 * m + 114) / 31;
        let day = ((h + l - 7 * m + 114) % 31) + 1;
        CalDate::local(year, month as u32, day as u32, 0, 0, 0)
    }

    /// Lenient parse: named relative dates, the configured format
    /// string, ISO-8601 forms, then bare 9-10 digit epoch seconds.
    pub fn parse(input: &str, dateformat: &str, weekstart: u32) -> Result<Self> {
        if let Some(date) = named::parse_named(input, weekstart) {
            return Ok(date);
        }

        if let Some(date) = format::parse_formatted(input, dateformat) {
            return Ok(date);
        }

        if let Some((date, len)) = parse_iso(input) {
            if len == input.len() {
                return Ok(date);
            }
        }

        if (9..=10).contains(&input.len()) && input.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(epoch) = input.parse::<i64>() {
                return Ok(CalDate::from_epoch(epoch));
            }
        }

        Err(Error::Validation(format!("'{}' is not a valid date", input)))
    }
}

impl std::ops::Add<Span> for CalDate {
    type Output = CalDate;

    fn add(self, rhs: Span) -> CalDate {
        CalDate {
            epoch: self.epoch + rhs.seconds(),
            utc: self.utc,
        }
    }
}

impl std::ops::Sub<Span> for CalDate {
    type Output = CalDate;

    fn sub(self, rhs: Span) -> CalDate {
        CalDate {
            epoch: self.epoch - rhs.seconds(),
            utc: self.utc,
        }
    }
}

impl std::ops::Sub<CalDate> for CalDate {
    type Output = Span;

    fn sub(self, rhs: CalDate) -> Span {
        Span::from_seconds(self.epoch - rhs.epoch)
    }
}

fn to_local(epoch: i64) -> DateTime<Local> {
    Local
        .timestamp_opt(epoch, 0)
        .earliest()
        .unwrap_or_else(|| DateTime::UNIX_EPOCH.with_timezone(&Local))
}

fn to_utc(epoch: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(epoch, 0)
        .earliest()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Gregorian leap-year rule.
pub fn leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in the given month of the given year.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    const DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && leap_year(year) {
        29
    } else if (1..=12).contains(&month) {
        DAYS[(month - 1) as usize]
    } else {
        0
    }
}

/// Component validity per the calendar rules.
pub fn valid(m: u32, d: u32, y: i32, h: u32, n: u32, s: u32) -> bool {
    (1..=12).contains(&m)
        && d >= 1
        && d <= days_in_month(m, y)
        && h <= 23
        && n <= 59
        && s <= 59
}

/// Strict ISO-8601 recognizer, returning the parsed date and the number
/// of bytes consumed. Recognized forms:
///
/// - `YYYY-MM-DD` and `YYYY-MM-DDThh:mm[:ss][Z|±hh[:mm]]`
/// - `YYYYMMDDThhmmss[Z]`
/// - `YYYY-DDD` (ordinal)
/// - `YYYY-Www[-D]` (ISO week)
pub fn parse_iso(input: &str) -> Option<(CalDate, usize)> {
    let b = input.as_bytes();

    let digits = |from: usize, n: usize| -> Option<i64> {
        if b.len() < from + n {
            return None;
        }
        let mut v: i64 = 0;
        for &c in &b[from..from + n] {
            if !c.is_ascii_digit() {
                return None;
            }
            v = v * 10 + (c - b'0') as i64;
        }
        Some(v)
    };
    let at = |i: usize, c: u8| -> bool { b.len() > i && b[i] == c };

    let year = digits(0, 4)? as i32;

    // YYYY-Www[-D]
    if at(4, b'-') && at(5, b'W') {
        let week = digits(6, 2)? as u32;
        let mut pos = 8;
        let mut dow = 1u32;
        if at(8, b'-') {
            if let Some(d) = digits(9, 1) {
                dow = d as u32;
                pos = 10;
            }
        }
        let weekday = match dow {
            1 => chrono::Weekday::Mon,
            2 => chrono::Weekday::Tue,
            3 => chrono::Weekday::Wed,
            4 => chrono::Weekday::Thu,
            5 => chrono::Weekday::Fri,
            6 => chrono::Weekday::Sat,
            7 => chrono::Weekday::Sun,
            _ => return None,
        };
        let date = chrono::NaiveDate::from_isoywd_opt(year, week, weekday)?;
        let epoch = Local
            .with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
            .earliest()?
            .timestamp();
        return Some((CalDate::from_epoch(epoch), pos));
    }

    // Extended forms.
    if at(4, b'-') {
        // YYYY-MM-DD[...]
        if let (Some(month), true) = (digits(5, 2), at(7, b'-')) {
            if let Some(day) = digits(8, 2) {
                let (m, d) = (month as u32, day as u32);
                if !valid(m, d, year, 0, 0, 0) {
                    return None;
                }
                if at(10, b'T') {
                    // Time part hh:mm[:ss]
                    let hh = digits(11, 2)?;
                    if !at(13, b':') {
                        return None;
                    }
                    let nn = digits(14, 2)?;
                    let mut pos = 16;
                    let mut ss = 0i64;
                    if at(16, b':') {
                        ss = digits(17, 2)?;
                        pos = 19;
                    }
                    if !valid(m, d, year, hh as u32, nn as u32, ss as u32) {
                        return None;
                    }

                    // Zone: Z, ±hh[:mm], or local.
                    if at(pos, b'Z') {
                        let date =
                            CalDate::utc(year, m, d, hh as u32, nn as u32, ss as u32).ok()?;
                        return Some((date, pos + 1));
                    }
                    if at(pos, b'+') || at(pos, b'-') {
                        let sign: i64 = if b[pos] == b'+' { 1 } else { -1 };
                        let oh = digits(pos + 1, 2)?;
                        let mut pos2 = pos + 3;
                        let mut om = 0i64;
                        if at(pos + 3, b':') {
                            om = digits(pos + 4, 2)?;
                            pos2 = pos + 6;
                        }
                        let naive = chrono::NaiveDate::from_ymd_opt(year, m, d)?
                            .and_hms_opt(hh as u32, nn as u32, ss as u32)?;
                        let epoch = naive.and_utc().timestamp() - sign * (oh * 3600 + om * 60);
                        return Some((CalDate::from_epoch_utc(epoch), pos2));
                    }
                    let date = CalDate::local(year, m, d, hh as u32, nn as u32, ss as u32).ok()?;
                    return Some((date, pos));
                }
                let date = CalDate::local(year, m, d, 0, 0, 0).ok()?;
                return Some((date, 10));
            }
        }

        // YYYY-DDD (ordinal)
        if let Some(doy) = digits(5, 3) {
            if b.len() == 8 || !b[8].is_ascii_digit() {
                let date = chrono::NaiveDate::from_yo_opt(year, doy as u32)?;
                let epoch = Local
                    .with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
                    .earliest()?
                    .timestamp();
                return Some((CalDate::from_epoch(epoch), 8));
            }
        }

        return None;
    }

    // Basic form: YYYYMMDDThhmmss[Z]
    let month = digits(4, 2)? as u32;
    let day = digits(6, 2)? as u32;
    if !at(8, b'T') {
        return None;
    }
    let hh = digits(9, 2)? as u32;
    let nn = digits(11, 2)? as u32;
    let ss = digits(13, 2)? as u32;
    if !valid(month, day, year, hh, nn, ss) {
        return None;
    }
    if at(15, b'Z') {
        let date = CalDate::utc(year, month, day, hh, nn, ss).ok()?;
        return Some((date, 16));
    }
    let date = CalDate::local(year, month, day, hh, nn, ss).ok()?;
    Some((date, 15))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leap_year() {
        assert!(leap_year(2000));
        assert!(leap_year(2016));
        assert!(!leap_year(1900));
        assert!(!leap_year(2015));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(1, 2015), 31);
        assert_eq!(days_in_month(2, 2015), 28);
        assert_eq!(days_in_month(2, 2016), 29);
        assert_eq!(days_in_month(4, 2015), 30);
        assert_eq!(days_in_month(13, 2015), 0);
    }

    #[test]
    fn test_valid() {
        assert!(valid(2, 29, 2016, 0, 0, 0));
        assert!(!valid(2, 29, 2015, 0, 0, 0));
        assert!(!valid(0, 1, 2015, 0, 0, 0));
        assert!(!valid(1, 1, 2015, 24, 0, 0));
        assert!(!valid(1, 1, 2015, 0, 60, 0));
    }

    #[test]
    fn test_parse_iso_extended_date() {
        let (d, len) = parse_iso("2015-07-04").unwrap();
        assert_eq!(len, 10);
        assert_eq!(d.year(), 2015);
        assert_eq!(d.month(), 7);
        assert_eq!(d.day(), 4);
        assert_eq!(d.hour(), 0);
        assert!(!d.is_utc());
    }

    #[test]
    fn test_parse_iso_extended_datetime_utc() {
        let (d, len) = parse_iso("2015-07-04T10:20:30Z").unwrap();
        assert_eq!(len, 20);
        assert!(d.is_utc());
        assert_eq!(d.year(), 2015);
        assert_eq!(d.hour(), 10);
        assert_eq!(d.minute(), 20);
        assert_eq!(d.second(), 30);
    }

    #[test]
    fn test_parse_iso_offset() {
        let (a, _) = parse_iso("2015-07-04T10:00:00+02:00").unwrap();
        let (b, _) = parse_iso("2015-07-04T08:00:00Z").unwrap();
        assert_eq!(a.epoch(), b.epoch());
    }

    #[test]
    fn test_parse_iso_basic() {
        let (d, len) = parse_iso("20150704T102030Z").unwrap();
        assert_eq!(len, 16);
        assert!(d.is_utc());
        assert_eq!(d.day(), 4);
    }

    #[test]
    fn test_parse_iso_ordinal() {
        let (d, len) = parse_iso("2015-365").unwrap();
        assert_eq!(len, 8);
        assert_eq!(d.month(), 12);
        assert_eq!(d.day(), 31);
    }

    #[test]
    fn test_parse_iso_week() {
        let (d, len) = parse_iso("2015-W01-1").unwrap();
        assert_eq!(len, 10);
        // ISO week 1 of 2015 started Monday 2014-12-29.
        assert_eq!(d.year(), 2014);
        assert_eq!(d.month(), 12);
        assert_eq!(d.day(), 29);
    }

    #[test]
    fn test_parse_iso_rejects_invalid() {
        assert!(parse_iso("2015-13-01").is_none());
        assert!(parse_iso("2015-02-29").is_none());
        assert!(parse_iso("not-a-date").is_none());
        assert!(parse_iso("20150704").is_none()); // basic form needs a time
    }

    #[test]
    fn test_date_plus_minus_duration() {
        let (d, _) = parse_iso("2015-07-04").unwrap();
        let later = d + Span::from_seconds(2 * DAY);
        assert_eq!(later.day(), 6);
        let back = later - Span::from_seconds(2 * DAY);
        assert_eq!(back.epoch(), d.epoch());
    }

    #[test]
    fn test_date_minus_date() {
        let (a, _) = parse_iso("2015-07-06").unwrap();
        let (b, _) = parse_iso("2015-07-04").unwrap();
        assert_eq!((a - b).seconds(), 2 * DAY);
    }

    #[test]
    fn test_easter() {
        let e = CalDate::easter(2015).unwrap();
        assert_eq!((e.month(), e.day()), (4, 5));
        let e = CalDate::easter(2016).unwrap();
        assert_eq!((e.month(), e.day()), (3, 27));
        let e = CalDate::easter(2018).unwrap();
        assert_eq!((e.month(), e.day()), (4, 1));
    }

    #[test]
    fn test_start_of_month_year() {
        let (d, _) = parse_iso("2015-07-04T10:00:00").unwrap();
        let som = d.start_of_month();
        assert_eq!((som.month(), som.day(), som.hour()), (7, 1, 0));
        let soy = d.start_of_year();
        assert_eq!((soy.month(), soy.day()), (1, 1));
    }

    #[test]
    fn test_same_day_week_month() {
        let (a, _) = parse_iso("2015-07-04T08:00:00").unwrap();
        let (b, _) = parse_iso("2015-07-04T20:00:00").unwrap();
        let (c, _) = parse_iso("2015-07-05T08:00:00").unwrap();
        assert!(a.same_day(&b));
        assert!(!a.same_day(&c));
        assert!(a.same_month(&c));
        assert!(a.same_year(&c));
        assert!(a.same_hour(&a));
        assert!(!a.same_hour(&b));
    }

    #[test]
    fn test_parse_epoch() {
        let d = CalDate::parse("1450000000", "m/d/Y", 1).unwrap();
        assert_eq!(d.epoch(), 1_450_000_000);
    }

    #[test]
    fn test_start_of_week() {
        // 2015-07-04 was a Saturday.
        let (d, _) = parse_iso("2015-07-04").unwrap();
        assert_eq!(d.day_of_week(), 6);
        let monday = d.start_of_week(1);
        assert_eq!(monday.day_of_week(), 1);
        assert_eq!(monday.day(), 29); // 2015-06-29
        let sunday = d.start_of_week(0);
        assert_eq!(sunday.day_of_week(), 0);
        assert_eq!(sunday.day(), 28);
    }
}
