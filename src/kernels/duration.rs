//! Pure parser for time-span literals.
//!
//! Accepted forms:
//! - unit components, optionally separated by whitespace or commas:
//!   `1.5 h`, `3W`, `2h30m`, `1 day, 4 hours`, `1.2e-05 s`
//! - a clock, optionally preceded by components: `02:03:04.5`, `1 days 02:03:04`
//! - ISO 8601: `P1DT2H3M4.5S`, `P2W`
//!
//! Spans are non-negative and must fit in `i64` nanoseconds. Decimal fractions
//! are converted exactly; only exponent notation goes through `f64`.

use chrono::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: u128 = 24 * NANOS_PER_HOUR;
const NANOS_PER_WEEK: u128 = 7 * NANOS_PER_DAY;

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "W" | "w" | "week" | "weeks" => NANOS_PER_WEEK,
        "D" | "d" | "day" | "days" => NANOS_PER_DAY,
        "H" | "h" | "hr" | "hrs" | "hour" | "hours" => NANOS_PER_HOUR,
        "T" | "m" | "min" | "mins" | "minute" | "minutes" => NANOS_PER_MINUTE,
        "S" | "s" | "sec" | "secs" | "second" | "seconds" => NANOS_PER_SECOND,
        "L" | "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => NANOS_PER_MILLI,
        "U" | "us" | "µs" | "micro" | "micros" | "microsecond" | "microseconds" => {
            NANOS_PER_MICRO
        }
        "N" | "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        _ => return None,
    };
    Some(nanos)
}

/// `number * unit`, in nanoseconds, rounded to the nearest nanosecond.
fn scaled(number: &str, unit: u128) -> Option<u128> {
    if number.contains(['e', 'E']) {
        let value: f64 = number.parse().ok()?;
        let nanos = (value * unit as f64).round();
        if !nanos.is_finite() || nanos < 0.0 || nanos > i64::MAX as f64 {
            return None;
        }
        return Some(nanos as u128);
    }

    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut total = whole.checked_mul(unit)?;
    if !frac_part.is_empty() {
        // Digits past 1e-18 cannot change the result for any unit above.
        let frac_part = &frac_part[..frac_part.len().min(18)];
        let digits: u128 = frac_part.parse().ok()?;
        let scale = 10u128.pow(frac_part.len() as u32);
        total = total.checked_add((digits * unit + scale / 2) / scale)?;
    }
    Some(total)
}

/// Splits a leading number (digits, `.`, and an optional exponent) off `s`.
fn split_number(s: &str) -> (&str, &str) {
    let bytes = s.as_bytes();
    let mut end = 0;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if end > 0 && end + 1 < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            end = exp;
        }
    }
    s.split_at(end)
}

/// Splits a leading unit name off `s`.
fn split_unit(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_alphabetic()))
        .map_or(s.len(), |(idx, _)| idx);
    s.split_at(end)
}

/// Sums a list of `<number><unit>` components. Empty input sums to zero.
fn parse_components(text: &str) -> Option<u128> {
    let mut rest = text;
    let mut total: u128 = 0;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return Some(total);
        }
        let (number, after) = split_number(rest);
        if number.is_empty() {
            return None;
        }
        let (unit, after) = split_unit(after.trim_start());
        let nanos = scaled(number, unit_nanos(unit)?)?;
        total = total.checked_add(nanos)?;
        rest = after;
    }
}

/// `H:MM:SS[.fff]`.
fn parse_clock(text: &str) -> Option<u128> {
    let mut parts = text.split(':');
    let (hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || minutes.len() != 2 || hours.is_empty() {
        return None;
    }
    let minutes = scaled(minutes, 1)?;
    let seconds_nanos = scaled(seconds, NANOS_PER_SECOND)?;
    if minutes >= 60 || seconds_nanos >= 60 * NANOS_PER_SECOND || seconds.contains(['e', 'E']) {
        return None;
    }
    scaled(hours, NANOS_PER_HOUR)?
        .checked_add(minutes * NANOS_PER_MINUTE)?
        .checked_add(seconds_nanos)
}

/// `P[nW][nD][T[nH][nM][nS]]`.
fn parse_iso8601(text: &str) -> Option<u128> {
    let body = text.strip_prefix('P')?;
    if body.is_empty() {
        return None;
    }
    let mut total: u128 = 0;
    let mut in_time = false;
    let mut rest = body;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('T') {
            if in_time || after.is_empty() {
                return None;
            }
            in_time = true;
            rest = after;
            continue;
        }
        let (number, after) = split_number(rest);
        let designator = after.chars().next()?;
        let unit = match (in_time, designator) {
            (false, 'W') => NANOS_PER_WEEK,
            (false, 'D') => NANOS_PER_DAY,
            (true, 'H') => NANOS_PER_HOUR,
            (true, 'M') => NANOS_PER_MINUTE,
            (true, 'S') => NANOS_PER_SECOND,
            _ => return None,
        };
        if number.is_empty() {
            return None;
        }
        total = total.checked_add(scaled(number, unit)?)?;
        rest = &after[designator.len_utf8()..];
    }
    Some(total)
}

fn parse_nanos(text: &str) -> Option<u128> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if s.starts_with('P') {
        return parse_iso8601(s);
    }
    if s.contains(':') {
        let (prefix, clock) = s.rsplit_once(char::is_whitespace).unwrap_or(("", s));
        return parse_components(prefix)?.checked_add(parse_clock(clock)?);
    }
    parse_components(s)
}

/// Parses a non-negative time span.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let nanos = parse_nanos(text)?;
    let nanos = i64::try_from(nanos).ok()?;
    Some(Duration::nanoseconds(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nanos(text: &str) -> Option<i64> {
        parse_duration(text).and_then(|d| d.num_nanoseconds())
    }

    #[test]
    fn test_unit_components() {
        assert_eq!(nanos("1.5 h"), Some(90 * 60 * 1_000_000_000));
        assert_eq!(nanos("3W"), Some(3 * 7 * 86_400 * 1_000_000_000));
        assert_eq!(nanos("2h30m"), Some(150 * 60 * 1_000_000_000));
        assert_eq!(nanos("1 day, 4 hours"), Some(28 * 3_600 * 1_000_000_000));
        assert_eq!(nanos("0.1 s"), Some(100_000_000));
        assert_eq!(nanos("250 ns"), Some(250));
        assert_eq!(nanos("1.2e-05 s"), Some(12_000));
    }

    #[test]
    fn test_clock_forms() {
        assert_eq!(nanos("02:03:04"), Some((2 * 3_600 + 3 * 60 + 4) * 1_000_000_000));
        assert_eq!(nanos("00:00:01.5"), Some(1_500_000_000));
        assert_eq!(
            nanos("1 days 00:00:01"),
            Some((86_400 + 1) * 1_000_000_000)
        );
        assert_eq!(nanos("00:61:00"), None);
    }

    #[test]
    fn test_iso8601() {
        assert_eq!(
            nanos("P1DT2H3M4.5S"),
            Some(((86_400 + 2 * 3_600 + 3 * 60 + 4) * 1_000_000_000) + 500_000_000)
        );
        assert_eq!(nanos("P2W"), Some(14 * 86_400 * 1_000_000_000));
        assert_eq!(nanos("PT"), None);
        assert_eq!(nanos("P1H"), None);
    }

    #[test]
    fn test_rejects() {
        assert_eq!(nanos(""), None);
        assert_eq!(nanos("5"), None);
        assert_eq!(nanos("-1 h"), None);
        assert_eq!(nanos("3 fortnights"), None);
        assert_eq!(nanos("h"), None);
        assert_eq!(nanos("1000000 W"), None);
    }
}
