//! Per-route request validation.
//!
//! A [`Validator`] is an ordered list of `(field, predicate, message)` rules.
//! Every rule is evaluated, and all failures are reported together as one
//! [`AppError::InvalidFields`].

use crate::error::{AppError, FieldError};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email regex")
});

static HHMM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("static time regex")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("static url regex")
});

struct Rule<'a> {
    field: String,
    predicate: Box<dyn FnOnce() -> bool + 'a>,
    message: String,
}

#[derive(Default)]
pub struct Validator<'a> {
    rules: Vec<Rule<'a>>,
}

impl<'a> Validator<'a> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule<F>(mut self, field: &str, predicate: F, message: &str) -> Self
    where
        F: FnOnce() -> bool + 'a,
    {
        self.rules.push(Rule {
            field: field.to_string(),
            predicate: Box::new(predicate),
            message: message.to_string(),
        });
        self
    }

    pub fn check(self, field: &str, valid: bool, message: &str) -> Self {
        self.rule(field, move || valid, message)
    }

    /// Like [`Validator::check`], but only when the field was supplied.
    pub fn optional<T>(self, field: &str, value: Option<T>, predicate: impl FnOnce(T) -> bool + 'a, message: &str) -> Self
    where
        T: 'a,
    {
        self.rule(field, move || value.is_none_or(predicate), message)
    }

    pub fn errors(self) -> Vec<FieldError> {
        self.rules
            .into_iter()
            .filter_map(|rule| {
                if (rule.predicate)() {
                    None
                } else {
                    Some(FieldError { field: rule.field, message: rule.message })
                }
            })
            .collect()
    }

    pub fn validate(self) -> Result<(), AppError> {
        let errors = self.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(errors))
        }
    }
}

pub fn is_uuid(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

pub fn is_hhmm(value: &str) -> bool {
    HHMM_RE.is_match(value)
}

pub fn is_timezone(value: &str) -> bool {
    value.parse::<Tz>().is_ok()
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// At least 8 characters with a digit, a lowercase letter, an uppercase
/// letter and one of `!@#$%^&*`.
pub fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= 8
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| "!@#$%^&*".contains(c))
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    if !is_hhmm(value) {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates, the latter read as
/// midnight in `tz`.
pub fn parse_timestamp(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
