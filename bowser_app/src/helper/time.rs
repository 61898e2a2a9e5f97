//! Durations in the config and the date formats used in messages.

use std::fmt;
use std::time::Duration;

use serde::Deserializer;
use serde::de::{Error, Visitor};
use serde_with::DeserializeAs;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// `June 03, 2019 14:02:11 UTC`
pub const LONG_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:long] [day], [year] [hour]:[minute]:[second] UTC");

/// `June 03, 2019 at 14:02 UTC`
pub const UPDATED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:long] [day], [year] at [hour]:[minute] UTC");

/// `Jun 03, 19 14:02 UTC`
pub const SHORT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day], [year repr:last_two] [hour]:[minute] UTC");

/// `06/03/19 14:02:11 UTC`
pub const NUMERIC_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[month]/[day]/[year repr:last_two] [hour]:[minute]:[second] UTC"
);

/// Formats a unix timestamp in seconds. Out-of-range values fall back to the
/// raw number.
pub fn format_unix(secs: i64, format: &[BorrowedFormatItem<'_>]) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|t| t.format(format).ok())
        .unwrap_or_else(|| secs.to_string())
}

/// Gets the current unix timestamp in seconds.
pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Parses `hh:mm:ss`, optionally prefixed with days as `d.hh:mm:ss`.
pub fn parse_dhms(v: &str) -> Option<Duration> {
    let v = v.trim();
    let (h, rest) = v.split_once(':')?;
    let (m, s) = rest.split_once(':')?;

    let (d, h) = match h.split_once('.') {
        Some((d, h)) => (d.parse::<u64>().ok()?, h),
        None => (0, h),
    };

    let h: u64 = h.parse().ok()?;
    let m: u64 = m.parse().ok()?;
    let s: u64 = s.parse().ok()?;
    if m >= 60 || s >= 60 {
        return None;
    }

    let secs = d
        .checked_mul(24)?
        .checked_add(h)?
        .checked_mul(60)?
        .checked_add(m)?
        .checked_mul(60)?
        .checked_add(s)?;

    Some(Duration::from_secs(secs))
}

/// [`serde_with`] adapter reading [`Duration`] from [`parse_dhms`] strings.
pub enum Dhms {}

impl<'de> DeserializeAs<'de, Duration> for Dhms {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_str(DhmsVisitor)
    }
}

struct DhmsVisitor;

impl Visitor<'_> for DhmsVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("duration string in hh:mm:ss format")
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Duration, E> {
        parse_dhms(v).ok_or_else(|| E::custom("expected duration in hh:mm:ss format"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn dhms_valid() {
        assert_eq!(parse_dhms("12:00:00"), Some(Duration::from_secs(12 * 3600)));
        assert_eq!(parse_dhms("0:00:15"), Some(Duration::from_secs(15)));
        assert_eq!(parse_dhms("1.04:30:00"), Some(Duration::from_secs(28 * 3600 + 1800)));
    }

    #[test]
    fn dhms_invalid() {
        assert_eq!(parse_dhms("12:60:00"), None);
        assert_eq!(parse_dhms("12:00"), None);
        assert_eq!(parse_dhms("-1:00:00"), None);
        assert_eq!(parse_dhms("soon"), None);
    }

    #[test]
    fn formats() {
        // 2019-06-03 14:02:11 UTC
        let secs = 1_559_570_531;
        assert_eq!(format_unix(secs, LONG_FORMAT), "June 03, 2019 14:02:11 UTC");
        assert_eq!(format_unix(secs, UPDATED_FORMAT), "June 03, 2019 at 14:02 UTC");
        assert_eq!(format_unix(secs, SHORT_FORMAT), "Jun 03, 19 14:02 UTC");
        assert_eq!(format_unix(secs, NUMERIC_FORMAT), "06/03/19 14:02:11 UTC");
    }
}
