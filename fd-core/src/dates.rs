//! Date and timestamp helpers.
//!
//! Calendar dates are stored as `YYYY-MM-DD`, instants as RFC 3339 UTC.

use chrono::{NaiveDate, SecondsFormat, Utc};

use crate::error::{FdError, FdResult};

/// Current instant as an RFC 3339 string with second precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Today's date (UTC) as `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` string, rejecting anything else.
pub fn parse_date(value: &str) -> FdResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| FdError::Validation(format!("invalid date \"{value}\": {e}")))
}

/// `YYYY-MM` bucket of a date or timestamp string, if it has one.
///
/// Accepts both `2024-03-09` and `2024-03-09T10:00:00Z`.
pub fn month_key(value: &str) -> Option<String> {
    let head = value.get(..7)?;
    let bytes = head.as_bytes();
    let well_formed = bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..].iter().all(u8::is_ascii_digit);
    well_formed.then(|| head.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key() {
        assert_eq!(month_key("2024-03-09").as_deref(), Some("2024-03"));
        assert_eq!(month_key("2024-11-30T08:00:00Z").as_deref(), Some("2024-11"));
        assert_eq!(month_key("03/09/2024"), None);
        assert_eq!(month_key("2024"), None);
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("tomorrow").is_err());
    }

    #[test]
    fn test_today_is_parseable() {
        assert!(parse_date(&today()).is_ok());
        assert!(now_rfc3339().ends_with('Z'));
    }
}
