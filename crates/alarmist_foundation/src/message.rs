//! Messages consumed by the engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Message severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Debugging chatter.
    #[default]
    Debug,
    /// Informational.
    Info,
    /// Something looks wrong.
    Warning,
    /// Something is wrong.
    Error,
    /// The system itself is in trouble.
    System,
}

impl Severity {
    /// Every severity, least severe first.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::System,
    ];

    /// Upper-case name as it appears in message streams.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::System => "SYSTEM",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::parse("unknown severity", s))
    }
}

/// A structured diagnostic message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// How severe the message is.
    pub severity: Severity,
    /// Free-form category label.
    pub category: String,
    /// Originating host or application.
    pub source: String,
    /// Free-text body.
    pub body: String,
    /// When the message was emitted.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the current time and no category.
    #[must_use]
    pub fn new(severity: Severity, source: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity,
            category: String::new(),
            source: source.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the timestamp from whole seconds since the Unix epoch.
    #[must_use]
    pub fn at_seconds(self, seconds: i64) -> Self {
        let ts = DateTime::from_timestamp(seconds, 0).unwrap_or(self.timestamp);
        self.with_timestamp(ts)
    }

    /// Whole seconds since the Unix epoch.
    #[must_use]
    pub fn seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.severity,
            self.category,
            self.source,
            self.body
        )
    }
}

/// Fields recorded from the most recent message a condition accepted.
///
/// Group 0 is the whole body match; unmatched groups are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchFields {
    /// Severity of the message.
    pub severity: Severity,
    /// Message source.
    pub source: String,
    /// Resolved target (empty unless the condition is per-target).
    pub target: String,
    /// Message category.
    pub category: String,
    /// Message body.
    pub body: String,
    /// Regex capture groups of the body match.
    pub groups: Vec<String>,
}

impl MatchFields {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns capture group `n`, if the body match produced it.
    #[must_use]
    pub fn group(&self, n: usize) -> Option<&str> {
        self.groups.get(n).map(String::as_str)
    }
}
