//! Human-readable durations for timeouts and cache lifetimes.
//!
//! Accepted forms: "250ms", "5s", "2m", "1h", or a bare number of milliseconds.

use crate::error::Error;
use std::time::Duration;

/// Parses a duration string such as `"5s"` into a [`Duration`].
///
/// # Errors
///
/// Returns a configuration error if the string is empty, has an unknown
/// suffix, or its number does not fit in a `u64`.
///
/// # Examples
///
/// ```
/// use resourceful::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
/// assert_eq!(parse_duration("1500").unwrap(), Duration::from_millis(1500));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, Error> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::invalid_config("Duration cannot be empty"));
    }

    // "ms" must be tried before "m" and "s"
    let (digits, unit_millis): (&str, u64) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else {
        (s, 1)
    };

    let amount: u64 = digits.trim().parse().map_err(|_| {
        Error::invalid_config(format!(
            "Invalid duration '{s}'. Use a form like '250ms', '5s', '2m', '1h' or a number of milliseconds"
        ))
    })?;
    amount
        .checked_mul(unit_millis)
        .map(Duration::from_millis)
        .ok_or_else(|| Error::invalid_config(format!("Duration '{s}' is out of range")))
}
