//! Configurable date format strings.
//!
//! A format string is a sequence of placeholders and literal characters.
//! Lowercase numeric placeholders render minimally and parse one or two
//! digits; uppercase render zero-padded and parse a fixed width.
//!
//! | Placeholder | Meaning                          |
//! |-------------|----------------------------------|
//! | `m` / `M`   | month                            |
//! | `d` / `D`   | day of month                     |
//! | `y` / `Y`   | 2-digit / 4-digit year           |
//! | `h` / `H`   | hour                             |
//! | `N`         | minute                           |
//! | `s` / `S`   | second                           |
//! | `a` / `A`   | short / full weekday name        |
//! | `b` / `B`   | short / full month name          |
//! | `v` / `V`   | week of year                     |
//! | `j` / `J`   | day of year                      |

use crate::date::{valid, CalDate};

/// Full month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Full weekday names, Sunday first.
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Render `date` according to `format`.
pub fn format(date: &CalDate, fmt: &str, weekstart: u32) -> String {
    let mut out = String::new();
    for c in fmt.chars() {
        match c {
            'm' => out.push_str(&date.month().to_string()),
            'M' => out.push_str(&format!("{:02}", date.month())),
            'd' => out.push_str(&date.day().to_string()),
            'D' => out.push_str(&format!("{:02}", date.day())),
            'y' => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            'Y' => out.push_str(&date.year().to_string()),
            'h' => out.push_str(&date.hour().to_string()),
            'H' => out.push_str(&format!("{:02}", date.hour())),
            'N' => out.push_str(&format!("{:02}", date.minute())),
            's' => out.push_str(&date.second().to_string()),
            'S' => out.push_str(&format!("{:02}", date.second())),
            'a' => out.push_str(&DAY_NAMES[date.day_of_week() as usize][..3]),
            'A' => out.push_str(DAY_NAMES[date.day_of_week() as usize]),
            'b' => out.push_str(&MONTH_NAMES[(date.month() - 1) as usize][..3]),
            'B' => out.push_str(MONTH_NAMES[(date.month() - 1) as usize]),
            'v' => out.push_str(&date.week_of_year(weekstart).to_string()),
            'V' => out.push_str(&format!("{:02}", date.week_of_year(weekstart))),
            'j' => out.push_str(&date.day_of_year().to_string()),
            'J' => out.push_str(&format!("{:03}", date.day_of_year())),
            other => out.push(other),
        }
    }
    out
}

/// Parse `input` against `format`, producing a local date. Returns
/// `None` when the input does not match the format or the components
/// are not a valid calendar date.
pub fn parse_formatted(input: &str, fmt: &str) -> Option<CalDate> {
    let bytes = input.as_bytes();
    let mut pos = 0;

    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut year: Option<i32> = None;
    let mut hour: u32 = 0;
    let mut minute: u32 = 0;
    let mut second: u32 = 0;

    for c in fmt.chars() {
        match c {
            'm' | 'd' | 'h' => {
                let max = if c == 'm' { 12 } else if c == 'd' { 31 } else { 23 };
                let v = scan_flexible(bytes, &mut pos, max)?;
                match c {
                    'm' => month = Some(v),
                    'd' => day = Some(v),
                    _ => hour = v,
                }
            }
            'M' | 'D' | 'H' | 'N' | 'S' | 'y' => {
                let v = scan_fixed(bytes, &mut pos, 2)?;
                match c {
                    'M' => month = Some(v),
                    'D' => day = Some(v),
                    'H' => hour = v,
                    'N' => minute = v,
                    'S' => second = v,
                    _ => year = Some(v as i32 + 2000),
                }
            }
            's' => second = scan_flexible(bytes, &mut pos, 59)?,
            'Y' => year = Some(scan_fixed(bytes, &mut pos, 4)? as i32),
            'a' | 'A' => {
                // Weekday names carry no date information; consume and
                // discard.
                scan_name(bytes, &mut pos, &DAY_NAMES, c == 'a')?;
            }
            'b' | 'B' => {
                let idx = scan_name(bytes, &mut pos, &MONTH_NAMES, c == 'b')?;
                month = Some(idx as u32 + 1);
            }
            'v' | 'V' | 'j' | 'J' => return None, // render-only placeholders
            literal => {
                if pos >= bytes.len() || bytes[pos] != literal as u8 {
                    return None;
                }
                pos += 1;
            }
        }
    }

    if pos != bytes.len() {
        return None;
    }

    let (m, d, y) = (month?, day?, year?);
    if !valid(m, d, y, hour, minute, second) {
        return None;
    }
    CalDate::local(y, m, d, hour, minute, second).ok()
}

/// One or two digits, preferring two when the result stays within `max`.
fn scan_flexible(bytes: &[u8], pos: &mut usize, max: u32) -> Option<u32> {
    if *pos >= bytes.len() || !bytes[*pos].is_ascii_digit() {
        return None;
    }
    let first = (bytes[*pos] - b'0') as u32;
    if *pos + 1 < bytes.len() && bytes[*pos + 1].is_ascii_digit() {
        let two = first * 10 + (bytes[*pos + 1] - b'0') as u32;
        if two <= max {
            *pos += 2;
            return Some(two);
        }
    }
    *pos += 1;
    Some(first)
}

/// Exactly `width` digits.
fn scan_fixed(bytes: &[u8], pos: &mut usize, width: usize) -> Option<u32> {
    if *pos + width > bytes.len() {
        return None;
    }
    let mut v = 0u32;
    for i in 0..width {
        let b = bytes[*pos + i];
        if !b.is_ascii_digit() {
            return None;
        }
        v = v * 10 + (b - b'0') as u32;
    }
    *pos += width;
    Some(v)
}

/// A case-insensitive name from `names`; short form consumes exactly
/// three letters. Returns the index of the matched name.
fn scan_name(bytes: &[u8], pos: &mut usize, names: &[&str], short: bool) -> Option<usize> {
    let rest = std::str::from_utf8(&bytes[*pos..]).ok()?;
    for (i, name) in names.iter().enumerate() {
        let candidate = if short { &name[..3] } else { name };
        if rest.len() >= candidate.len()
            && rest[..candidate.len()].eq_ignore_ascii_case(candidate)
        {
            *pos += candidate.len();
            return Some(i);
        }
    }
    None
}
