///! Observation time normalization
///!
///! OPUS reports start times either as calendar dates
///! ("2017-03-29T12:00:00.000") or in day-of-year notation
///! ("2017-089T12:00:00.000"). Both are normalized to
///! "YYYY-MM-DD HH:MM:SS".

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use planetary_common::{BotError, BotResult};

const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalize a raw observation time to `YYYY-MM-DD HH:MM:SS`.
///
/// Strings with fewer than two '-' are day-of-year notation.
pub fn normalize_time(raw: &str) -> BotResult<String> {
    let trimmed = raw.trim().trim_end_matches('Z');

    let datetime = if trimmed.matches('-').count() < 2 {
        parse_day_of_year(trimmed)
    } else {
        parse_calendar(trimmed)
    }
    .ok_or_else(|| BotError::Format(format!("Unrecognized observation time: {:?}", raw)))?;

    Ok(datetime.format(OUTPUT_FORMAT).to_string())
}

/// `YYYY-DDDTHH:MM:SS[.fff]`, `YYYY:DDD:HH:MM:SS` and shorter prefixes
fn parse_day_of_year(s: &str) -> Option<NaiveDateTime> {
    let normalized = s.replace(['-', 'T'], ":");
    let fields: Vec<&str> = normalized.split(':').collect();
    if fields.len() < 2 || fields.len() > 5 {
        return None;
    }

    let year: i32 = parse_digits(fields[0])?;
    let ordinal: u32 = parse_digits(fields[1])?;
    let date = NaiveDate::from_yo_opt(year, ordinal)?;
    let time = parse_clock(&fields[2..])?;

    Some(date.and_time(time))
}

/// `YYYY-MM-DD[(T| )HH:MM[:SS[.fff]]]`
fn parse_calendar(s: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = match s.split_once(['T', ' ']) {
        Some((date, time)) => (date, Some(time)),
        None => (s, None),
    };

    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let time = match time_part {
        Some(time) => {
            let fields: Vec<&str> = strip_offset(time)?.split(':').collect();
            if fields.len() < 2 {
                return None;
            }
            parse_clock(&fields)?
        }
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };

    Some(date.and_time(time))
}

/// Drop a trailing `±HH:MM`, `±HHMM` or `±HH` offset; the clock time is kept as written
fn strip_offset(time: &str) -> Option<&str> {
    let Some(pos) = time.rfind(['+', '-']) else {
        return Some(time);
    };
    let offset = &time[pos + 1..];
    let valid = match offset.len() {
        2 | 4 => offset.bytes().all(|b| b.is_ascii_digit()),
        5 => match offset.split_once(':') {
            Some((hours, minutes)) => {
                hours.len() == 2 && parse_digits::<u32>(hours).is_some() && parse_digits::<u32>(minutes).is_some()
            }
            None => false,
        },
        _ => false,
    };
    valid.then(|| &time[..pos])
}

/// Hours, minutes, seconds; missing fields are zero, fractional seconds dropped
fn parse_clock(fields: &[&str]) -> Option<NaiveTime> {
    if fields.len() > 3 {
        return None;
    }

    let hour: u32 = match fields.first() {
        Some(f) => parse_digits(f)?,
        None => 0,
    };
    let minute: u32 = match fields.get(1) {
        Some(f) => parse_digits(f)?,
        None => 0,
    };
    let second: u32 = match fields.get(2) {
        Some(&f) => {
            let (whole, frac) = f.split_once('.').unwrap_or((f, "0"));
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parse_digits(whole)?
        }
        None => 0,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn parse_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
