//! Core type definitions with validation.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A search window whose lower bound is after its upper bound.
    #[error("search window starts after it ends: {from} > {to}")]
    InvertedWindow {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    /// A window length that runs past the end of the calendar.
    #[error("search window of {days} days is out of range")]
    WindowOutOfRange { days: i64 },

    /// Invalid locale value.
    #[error("unknown locale: {value}")]
    UnknownLocale { value: String },
}

/// Language of the date phrases being resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "en")]
    English,
}

impl Locale {
    /// Short code used in configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Locale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fr" | "french" => Ok(Self::French),
            "en" | "english" => Ok(Self::English),
            _ => Err(ValidationError::UnknownLocale {
                value: s.to_string(),
            }),
        }
    }
}

/// Canonical key of one physical event, derived from its link.
///
/// The query string and fragment are stripped, so two links that differ only
/// in tracking parameters map to the same identifier. Equality is exact
/// string equality on the stripped form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Normalizes a raw link into an identifier.
    pub fn parse(link: &str) -> Result<Self, ValidationError> {
        let trimmed = link.trim();
        let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
        let canonical = &trimmed[..end];
        if canonical.is_empty() {
            return Err(ValidationError::Empty {
                field: "source link",
            });
        }
        Ok(Self(canonical.to_string()))
    }

    /// Returns the canonical link.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SourceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An absolute start/end pair derived from a date phrase.
///
/// `end >= start` always holds; the constructor refuses anything else.
/// Both instants are timezone-naive wall-clock values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl ResolvedInterval {
    /// Builds an interval, or `None` if `end` precedes `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (end >= start).then_some(Self { start, end })
    }

    /// A zero-length interval marking a single instant.
    #[must_use]
    pub const fn instant(at: NaiveDateTime) -> Self {
        Self { start: at, end: at }
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Caller-supplied inclusive date range used to filter results.
///
/// Fields are public so callers can build a window from any source; the
/// aggregator validates it before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl SearchWindow {
    /// Creates a validated window.
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Result<Self, ValidationError> {
        let window = Self { from, to };
        window.validate()?;
        Ok(window)
    }

    /// Window spanning `days` days forward from `from`.
    pub fn days_from(from: NaiveDateTime, days: i64) -> Result<Self, ValidationError> {
        let to = Duration::try_days(days)
            .and_then(|span| from.checked_add_signed(span))
            .ok_or(ValidationError::WindowOutOfRange { days })?;
        Self::new(from, to)
    }

    /// Rejects windows with `from > to`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.from > self.to {
            return Err(ValidationError::InvertedWindow {
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }

    /// Closed-range membership test.
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.from <= at && at <= self.to
    }
}
