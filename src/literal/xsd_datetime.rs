//! XSD `date` and `dateTime` lexical parsing, UTC normalization and
//! canonical-form rendering (spec §4.10).
//!
//! The lexical grammar is
//! `'-'? yyyy '-' mm '-' dd ( 'T' hh ':' mm ':' ss ('.' fraction)? )? timezone?`
//! with `timezone ∈ 'Z' | ('+'|'-') hh ':' mm`. A present timezone is
//! normalized away by shifting the wall-clock fields to UTC; an absent
//! timezone is left as a "local, unzoned" value and rendered without a
//! `Z` suffix.

use crate::error::DateTimeParseError;
use regex::Regex;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::OnceLock;

fn lexical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^
            (?P<sign>-)?
            (?P<year>\d{4,})
            -(?P<month>\d{2})
            -(?P<day>\d{2})
            (?:T(?P<hour>\d{2}):(?P<minute>\d{2}):(?P<second>\d{2})(?:\.(?P<frac>\d+))?)?
            (?P<tz>Z|[+-]\d{2}:\d{2})?
            $
            ",
        )
        .expect("static regex is valid")
    })
}

/// A fully-parsed lexical form, before timezone normalization is applied.
struct Parsed {
    year: i64,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    microsecond: u32,
    has_time: bool,
    tz_offset_minutes: Option<i32>,
}

fn is_leap_year(year: i64) -> bool {
    year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
}

fn days_in_month(year: i64, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month already validated to 1..=12"),
    }
}

/// Year immediately after `year` on the XSD number line, which has no
/// year zero: the successor of -1 is 1.
fn next_year(year: i64) -> i64 {
    if year == -1 {
        1
    } else {
        year + 1
    }
}

/// Year immediately before `year`: the predecessor of 1 is -1.
fn prev_year(year: i64) -> i64 {
    if year == 1 {
        -1
    } else {
        year - 1
    }
}

fn step_day(year: i64, month: u8, day: u8, delta: i32) -> (i64, u8, u8) {
    match delta.cmp(&0) {
        Ordering::Equal => (year, month, day),
        Ordering::Greater => {
            let mut day = day + 1;
            let mut month = month;
            let mut year = year;
            if day > days_in_month(year, month) {
                day = 1;
                month += 1;
                if month > 12 {
                    month = 1;
                    year = next_year(year);
                }
            }
            step_day(year, month, day, delta - 1)
        }
        Ordering::Less => {
            let mut year = year;
            let mut month = month;
            let day = if day > 1 {
                day - 1
            } else {
                month = if month > 1 { month - 1 } else { 12 };
                if month == 12 {
                    year = prev_year(year);
                }
                days_in_month(year, month)
            };
            step_day(year, month, day, delta + 1)
        }
    }
}

fn parse_lexical(s: &str) -> Result<Parsed, DateTimeParseError> {
    let caps = lexical_re().captures(s).ok_or_else(|| DateTimeParseError::Malformed {
        offset: 0,
        reason: "does not match the XSD date/dateTime lexical grammar".to_string(),
    })?;

    let year_digits = &caps["year"];
    if year_digits.len() > 4 && year_digits.starts_with('0') {
        return Err(DateTimeParseError::Malformed {
            offset: 0,
            reason: "year has a leading zero but more than four digits".to_string(),
        });
    }
    let year_magnitude: i64 = year_digits
        .parse()
        .map_err(|_| DateTimeParseError::Malformed { offset: 0, reason: "year overflow".to_string() })?;
    if year_magnitude == 0 {
        return Err(DateTimeParseError::YearZero);
    }
    let year = if caps.name("sign").is_some() { -year_magnitude } else { year_magnitude };

    let month: u8 = caps["month"].parse().unwrap();
    if !(1..=12).contains(&month) {
        return Err(DateTimeParseError::MonthOutOfRange(month));
    }

    let day: u8 = caps["day"].parse().unwrap();
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeParseError::DayOutOfRange { year, month, day });
    }

    let has_time = caps.name("hour").is_some();
    let (hour, minute, second, microsecond) = if has_time {
        let hour: u8 = caps["hour"].parse().unwrap();
        if hour > 24 {
            return Err(DateTimeParseError::HourOutOfRange(hour));
        }
        let minute: u8 = caps["minute"].parse().unwrap();
        let second: u8 = caps["second"].parse().unwrap();
        if hour == 24 && (minute != 0 || second != 0) {
            return Err(DateTimeParseError::Hour24NotMidnight);
        }
        if minute > 59 {
            return Err(DateTimeParseError::MinuteOutOfRange(minute));
        }
        if second > 59 {
            return Err(DateTimeParseError::SecondOutOfRange(second));
        }
        let microsecond = match caps.name("frac") {
            Some(m) => {
                let mut digits = m.as_str().to_string();
                digits.truncate(6);
                while digits.len() < 6 {
                    digits.push('0');
                }
                digits.parse().unwrap()
            }
            None => 0,
        };
        (hour, minute, second, microsecond)
    } else {
        (0, 0, 0, 0)
    };

    let tz_offset_minutes = match caps.name("tz") {
        None => None,
        Some(m) if m.as_str() == "Z" => Some(0),
        Some(m) => {
            let text = m.as_str();
            let sign: i32 = if text.starts_with('-') { -1 } else { 1 };
            let tz_hour: i8 = text[1..3].parse().unwrap();
            let tz_minute: i8 = text[4..6].parse().unwrap();
            if !(0..=14).contains(&tz_hour) {
                return Err(DateTimeParseError::TimezoneHourOutOfRange(tz_hour));
            }
            if !(0..=59).contains(&tz_minute) {
                return Err(DateTimeParseError::TimezoneMinuteOutOfRange(tz_minute));
            }
            if tz_hour == 14 && tz_minute != 0 {
                return Err(DateTimeParseError::TimezoneHour14NotWhole);
            }
            Some(sign * (i32::from(tz_hour) * 60 + i32::from(tz_minute)))
        }
    };

    // Apply the 24:00:00 -> next day 00:00:00 cascade unconditionally,
    // ahead of any timezone normalization.
    let (year, month, day, hour) = if hour == 24 {
        let (y, m, d) = step_day(year, month, day, 1);
        (y, m, d, 0)
    } else {
        (year, month, day, hour)
    };

    Ok(Parsed {
        year,
        month,
        day,
        hour,
        minute,
        second,
        microsecond,
        has_time,
        tz_offset_minutes,
    })
}

/// Shift `(hour, minute)` by `-offset_minutes` (UTC = local - offset),
/// cascading the carry into `(year, month, day)`. Returns the shifted
/// tuple; `second`/`microsecond` are untouched since offsets are whole
/// minutes.
fn normalize_to_utc(year: i64, month: u8, day: u8, hour: u8, minute: u8, offset_minutes: i32) -> (i64, u8, u8, u8, u8) {
    let total_minutes = i32::from(hour) * 60 + i32::from(minute) - offset_minutes;
    let day_delta = total_minutes.div_euclid(1440);
    let minutes_in_day = total_minutes.rem_euclid(1440);
    let (year, month, day) = step_day(year, month, day, day_delta);
    (year, month, day, (minutes_in_day / 60) as u8, (minutes_in_day % 60) as u8)
}

fn format_year(year: i64) -> String {
    let magnitude = year.unsigned_abs();
    let sign = if year < 0 { "-" } else { "" };
    if magnitude < 10000 {
        format!("{sign}{magnitude:04}")
    } else {
        format!("{sign}{magnitude}")
    }
}

fn format_fraction(microsecond: u32) -> String {
    if microsecond == 0 {
        return String::new();
    }
    let mut digits = format!("{microsecond:06}");
    while digits.ends_with('0') {
        digits.pop();
    }
    format!(".{digits}")
}

/// A calendar date with no time-of-day component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XsdDate {
    pub year: i64,
    pub month: u8,
    pub day: u8,
    pub has_timezone: bool,
}

impl XsdDate {
    pub fn parse(s: &str) -> Result<Self, DateTimeParseError> {
        let parsed = parse_lexical(s)?;
        if parsed.has_time {
            return Err(DateTimeParseError::Malformed {
                offset: 0,
                reason: "date literal must not contain a time-of-day component".to_string(),
            });
        }
        let (year, month, day, has_timezone) = match parsed.tz_offset_minutes {
            Some(offset) => {
                // XSD date timezone normalization treats the implicit
                // time as local midnight and carries any resulting day
                // shift back into the date.
                let (y, m, d, _, _) = normalize_to_utc(parsed.year, parsed.month, parsed.day, 0, 0, offset);
                (y, m, d, true)
            }
            None => (parsed.year, parsed.month, parsed.day, false),
        };
        Ok(XsdDate { year, month, day, has_timezone })
    }

    pub fn to_canonical_string(&self) -> String {
        let suffix = if self.has_timezone { "Z" } else { "" };
        format!("{}-{:02}-{:02}{}", format_year(self.year), self.month, self.day, suffix)
    }

    pub fn compare(&self, other: &XsdDate) -> Ordering {
        (self.year, self.month, self.day).cmp(&(other.year, other.month, other.day))
    }
}

impl FromStr for XsdDate {
    type Err = DateTimeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XsdDate::parse(s)
    }
}

/// A calendar date and time, normalized to UTC when the source lexical
/// form carried an explicit timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XsdDateTime {
    pub year: i64,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
    pub has_timezone: bool,
}

impl XsdDateTime {
    pub fn parse(s: &str) -> Result<Self, DateTimeParseError> {
        let parsed = parse_lexical(s)?;
        if !parsed.has_time {
            return Err(DateTimeParseError::Malformed {
                offset: 0,
                reason: "dateTime literal requires a time-of-day component".to_string(),
            });
        }
        let (year, month, day, hour, minute, has_timezone) = match parsed.tz_offset_minutes {
            Some(offset) => {
                let (y, m, d, h, mi) =
                    normalize_to_utc(parsed.year, parsed.month, parsed.day, parsed.hour, parsed.minute, offset);
                (y, m, d, h, mi, true)
            }
            None => (parsed.year, parsed.month, parsed.day, parsed.hour, parsed.minute, false),
        };
        Ok(XsdDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second: parsed.second,
            microsecond: parsed.microsecond,
            has_timezone,
        })
    }

    pub fn to_canonical_string(&self) -> String {
        let suffix = if self.has_timezone { "Z" } else { "" };
        format!(
            "{}-{:02}-{:02}T{:02}:{:02}:{:02}{}{}",
            format_year(self.year),
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            format_fraction(self.microsecond),
            suffix,
        )
    }

    pub fn compare(&self, other: &XsdDateTime) -> Ordering {
        (self.year, self.month, self.day, self.hour, self.minute, self.second, self.microsecond).cmp(&(
            other.year,
            other.month,
            other.day,
            other.hour,
            other.minute,
            other.second,
            other.microsecond,
        ))
    }
}

impl FromStr for XsdDateTime {
    type Err = DateTimeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XsdDateTime::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(s: &str) -> String {
        XsdDateTime::parse(s).unwrap().to_canonical_string()
    }

    #[test]
    fn negative_offset_crosses_into_next_year() {
        assert_eq!(canon("2004-12-31T23:50:22-01:15"), "2005-01-01T01:05:22Z");
    }

    #[test]
    fn hour_24_normalizes_to_next_day_midnight() {
        assert_eq!(canon("2012-04-12T24:00:00"), "2012-04-13T00:00:00");
    }

    #[test]
    fn trailing_fraction_zeros_are_stripped() {
        assert_eq!(canon("2006-05-18T18:36:03.10Z"), "2006-05-18T18:36:03.1Z");
    }

    #[test]
    fn positive_offset_skips_year_zero_going_down() {
        assert_eq!(canon("0001-01-01T00:00:00+00:01"), "-0001-12-31T23:59:00Z");
    }

    #[test]
    fn year_zero_is_rejected() {
        assert!(matches!(XsdDateTime::parse("0000-01-01T00:00:00Z"), Err(DateTimeParseError::YearZero)));
    }

    #[test]
    fn february_29_requires_leap_year() {
        assert!(XsdDate::parse("2001-02-29").is_err());
        assert!(XsdDate::parse("2000-02-29").is_ok());
    }

    #[test]
    fn timezone_hour_14_requires_zero_minutes() {
        assert!(matches!(
            XsdDateTime::parse("2020-01-01T00:00:00+14:30"),
            Err(DateTimeParseError::TimezoneHour14NotWhole)
        ));
        assert!(XsdDateTime::parse("2020-01-01T00:00:00+14:00").is_ok());
    }

    #[test]
    fn canonical_round_trip_is_idempotent() {
        let first = canon("2004-12-31T23:50:22-01:15");
        let second = XsdDateTime::parse(&first).unwrap().to_canonical_string();
        assert_eq!(first, second);
    }

    #[test]
    fn date_without_timezone_has_no_z_suffix() {
        let d = XsdDate::parse("2020-06-01").unwrap();
        assert_eq!(d.to_canonical_string(), "2020-06-01");
    }

    #[test]
    fn ordering_is_lexicographic_over_the_calendar_tuple() {
        let a = XsdDateTime::parse("2020-01-01T00:00:00Z").unwrap();
        let b = XsdDateTime::parse("2020-01-01T00:00:01Z").unwrap();
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    proptest::proptest! {
        #[test]
        fn canonicalization_is_idempotent_over_generated_valid_datetimes(
            year in 1i64..3000,
            month in 1u8..=12,
            hour in 0u8..24,
            minute in 0u8..60,
            second in 0u8..60,
            tz_hour in 0u8..14,
            tz_minute in 0u8..60,
            negative_tz in proptest::bool::ANY,
        ) {
            let day = 1;
            let sign = if negative_tz { "-" } else { "+" };
            let lexical = format!(
                "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}{sign}{tz_hour:02}:{tz_minute:02}"
            );
            let parsed = XsdDateTime::parse(&lexical).unwrap();
            let first = parsed.to_canonical_string();
            let second = XsdDateTime::parse(&first).unwrap().to_canonical_string();
            proptest::prop_assert_eq!(first, second);
        }
    }
}
