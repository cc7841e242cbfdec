//! Argument extraction for tool calls.
//!
//! Agents send ids as numbers or numeric strings, so both are accepted.
//! Absent and `null` optional arguments are treated the same.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("Missing required argument: {0}")]
    Missing(String),
    #[error("Invalid argument {key}: expected {expected}")]
    Invalid { key: String, expected: &'static str },
}

fn lookup<'a>(args: &'a Value, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

fn invalid(key: &str, expected: &'static str) -> ArgError {
    ArgError::Invalid {
        key: key.to_string(),
        expected,
    }
}

/// Optional positive integer id.
pub fn optional_id(args: &Value, key: &str) -> Result<Option<u64>, ArgError> {
    let Some(value) = lookup(args, key) else {
        return Ok(None);
    };
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id > 0 => Ok(Some(id)),
        _ => Err(invalid(key, "a positive integer")),
    }
}

/// Required positive integer id.
pub fn require_id(args: &Value, key: &str) -> Result<u64, ArgError> {
    optional_id(args, key)?.ok_or_else(|| ArgError::Missing(key.to_string()))
}

/// Optional non-negative integer (page sizes, row offsets).
pub fn optional_u64(args: &Value, key: &str) -> Result<Option<u64>, ArgError> {
    let Some(value) = lookup(args, key) else {
        return Ok(None);
    };
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .map(Some)
    .ok_or_else(|| invalid(key, "a non-negative integer"))
}

pub fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, ArgError> {
    match lookup(args, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(invalid(key, "a string")),
    }
}

pub fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ArgError> {
    optional_str(args, key)?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ArgError::Missing(key.to_string()))
}

pub fn optional_bool(args: &Value, key: &str) -> Result<Option<bool>, ArgError> {
    match lookup(args, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(invalid(key, "a boolean")),
    }
}

pub fn optional_string_list(args: &Value, key: &str) -> Result<Option<Vec<String>>, ArgError> {
    match lookup(args, key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(ToString::to_string)
                    .ok_or_else(|| invalid(key, "an array of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(invalid(key, "an array of strings")),
    }
}

/// Optional `YYYY-MM-DD` date.
pub fn optional_date(args: &Value, key: &str) -> Result<Option<NaiveDate>, ArgError> {
    optional_str(args, key)?
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| invalid(key, "a date in YYYY-MM-DD format"))
        })
        .transpose()
}

/// One of a fixed set of string values, with a default.
pub fn choice<'a>(
    args: &'a Value,
    key: &str,
    allowed: &[&'static str],
    default: &'static str,
) -> Result<&'a str, ArgError> {
    match optional_str(args, key)? {
        None => Ok(default),
        Some(value) if allowed.iter().any(|a| *a == value) => Ok(value),
        Some(_) => Err(invalid(key, "one of the documented values")),
    }
}

/// Default reporting window: the seven days up to and including `today`.
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(7), today)
}

/// Resolve `start_date`/`end_date`, defaulting either end to [`default_range`].
pub fn date_range(
    args: &Value,
    start_key: &str,
    end_key: &str,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ArgError> {
    let (default_start, default_end) = default_range(today);
    let start = optional_date(args, start_key)?.unwrap_or(default_start);
    let end = optional_date(args, end_key)?.unwrap_or(default_end);
    if start > end {
        return Err(invalid(start_key, "a date on or before the end date"));
    }
    Ok((start, end))
}

/// Wall-clock inputs a tool may need, captured once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now {
    /// Local calendar date, for report date defaults.
    pub today: NaiveDate,
    /// Instant used as `start` when starting a timer.
    pub utc: DateTime<Utc>,
}

impl Now {
    pub fn current() -> Self {
        let utc = Utc::now();
        Self {
            today: utc.with_timezone(&Local).date_naive(),
            utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        let args = json!({"a": 12, "b": "34", "c": " 56 "});
        assert_eq!(require_id(&args, "a").unwrap(), 12);
        assert_eq!(require_id(&args, "b").unwrap(), 34);
        assert_eq!(require_id(&args, "c").unwrap(), 56);
    }

    #[test]
    fn ids_reject_zero_negative_and_garbage() {
        let args = json!({"zero": 0, "neg": -1, "text": "abc", "float": 1.5});
        for key in ["zero", "neg", "text", "float"] {
            assert!(
                matches!(require_id(&args, key), Err(ArgError::Invalid { .. })),
                "{key} should be invalid"
            );
        }
    }

    #[test]
    fn missing_and_null_are_equivalent() {
        let args = json!({"present_null": null});
        assert_eq!(
            require_id(&args, "absent"),
            Err(ArgError::Missing("absent".into()))
        );
        assert_eq!(optional_id(&args, "present_null").unwrap(), None);
        assert_eq!(optional_str(&args, "present_null").unwrap(), None);
    }

    #[test]
    fn require_str_rejects_blank() {
        let args = json!({"name": "  "});
        assert!(matches!(require_str(&args, "name"), Err(ArgError::Missing(_))));
    }

    #[test]
    fn string_list_validates_items() {
        let ok = json!({"tags": ["a", "b"]});
        assert_eq!(
            optional_string_list(&ok, "tags").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        let bad = json!({"tags": ["a", 1]});
        assert!(optional_string_list(&bad, "tags").is_err());
    }

    #[test]
    fn choice_enforces_allowed_values() {
        let args = json!({"grouping": "clients", "bad": "planets"});
        let allowed = &["projects", "clients", "users"];
        assert_eq!(choice(&args, "grouping", allowed, "projects").unwrap(), "clients");
        assert_eq!(choice(&args, "missing", allowed, "projects").unwrap(), "projects");
        assert!(choice(&args, "bad", allowed, "projects").is_err());
    }

    #[test]
    fn date_range_defaults_to_last_seven_days() {
        let today = date("2024-03-15");
        let (start, end) = date_range(&json!({}), "start_date", "end_date", today).unwrap();
        assert_eq!(start, date("2024-03-08"));
        assert_eq!(end, today);
    }

    #[test]
    fn date_range_uses_explicit_dates() {
        let args = json!({"start_date": "2024-01-01", "end_date": "2024-01-31"});
        let (start, end) = date_range(&args, "start_date", "end_date", date("2024-03-15")).unwrap();
        assert_eq!(start, date("2024-01-01"));
        assert_eq!(end, date("2024-01-31"));
    }

    #[test]
    fn date_range_rejects_bad_format_and_inverted_range() {
        let today = date("2024-03-15");
        let bad = json!({"start_date": "01/02/2024"});
        assert!(date_range(&bad, "start_date", "end_date", today).is_err());

        let inverted = json!({"start_date": "2024-02-01", "end_date": "2024-01-01"});
        assert!(date_range(&inverted, "start_date", "end_date", today).is_err());
    }
}
