//! Engine, condition, and rule configuration.
//!
//! Configuration is plain data built with `with_*` methods. It is read
//! once when conditions and rules are created and never changes afterwards.

use std::time::Duration;

use alarmist_foundation::Severity;
use alarmist_language::{BoolAst, DomainAst, TestAst};
use alarmist_storage::Occurrence;

// =============================================================================
// EngineConfig
// =============================================================================

/// Default ceiling on domain vectors and enumerated assignments per rule.
pub const DEFAULT_MAX_DOMAIN_COMBINATIONS: usize = 10_000;

/// Default ceiling on forward-chaining rounds per `force` call.
pub const DEFAULT_MAX_CHAIN_DEPTH: u32 = 64;

/// Engine-wide limits and behavior switches.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Ceiling on domain vectors and enumerated assignments per rule
    /// evaluation. Exceeding it skips the rule with `DomainTooLarge`.
    pub max_domain_combinations: usize,
    /// Ceiling on forward-chaining rounds in one `force` call.
    pub max_chain_depth: u32,
    /// Period of the background timing sweep.
    pub sweep_interval: Duration,
    /// Map `Any` to the global bucket on axes a condition does not
    /// parameterize before alarm deduplication.
    pub canonical_alarm_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_domain_combinations: DEFAULT_MAX_DOMAIN_COMBINATIONS,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            sweep_interval: Duration::from_secs(1),
            canonical_alarm_keys: true,
        }
    }

    /// Tight limits for small, latency-sensitive rule sets.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_domain_combinations: 1_000,
            max_chain_depth: 16,
            ..Self::new()
        }
    }

    /// Generous limits for large deployments with many sources.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            max_domain_combinations: 1_000_000,
            max_chain_depth: 1_024,
            ..Self::new()
        }
    }

    /// Sets the domain ceiling.
    #[must_use]
    pub fn with_max_domain_combinations(mut self, limit: usize) -> Self {
        self.max_domain_combinations = limit;
        self
    }

    /// Sets the chaining ceiling.
    #[must_use]
    pub fn with_max_chain_depth(mut self, limit: u32) -> Self {
        self.max_chain_depth = limit;
        self
    }

    /// Sets the sweep period.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Enables or disables alarm key canonicalization.
    #[must_use]
    pub fn with_canonical_alarm_keys(mut self, enabled: bool) -> Self {
        self.canonical_alarm_keys = enabled;
        self
    }
}

// =============================================================================
// ConditionConfig
// =============================================================================

/// The pattern that accepts anything.
pub const ANY_PATTERN: &str = "*";

/// Configuration of one condition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionConfig {
    /// Unique name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Minimum severity.
    pub severity: Severity,
    /// Source patterns, matched against the whole source. `*` accepts any.
    pub sources: Vec<String>,
    /// Category patterns, matched against the whole category. `*` accepts any.
    pub categories: Vec<String>,
    /// Body pattern, searched within the body. Empty or `*` accepts any.
    pub pattern: String,
    /// Optional post-match test.
    pub test: Option<TestAst>,
    /// Once on, cells stay on until reset.
    pub persistent: bool,
    /// Occurrence threshold.
    pub occurrence: Occurrence,
    /// Window length in seconds.
    pub timespan: i64,
    /// Track each source separately.
    pub per_source: bool,
    /// Track each target separately.
    pub per_target: bool,
    /// Capture group of the body pattern that names the target.
    pub target_group: usize,
}

impl ConditionConfig {
    /// Creates a condition that accepts every message.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            severity: Severity::Debug,
            sources: vec![ANY_PATTERN.to_string()],
            categories: vec![ANY_PATTERN.to_string()],
            pattern: String::new(),
            test: None,
            persistent: false,
            occurrence: Occurrence::AtLeast(1),
            timespan: 0,
            per_source: false,
            per_target: false,
            target_group: 1,
        }
    }

    /// A minimal condition meant to be forced: any filters, triggered by a
    /// single occurrence, persistent, not parameterized.
    #[must_use]
    pub fn fact(name: impl Into<String>) -> Self {
        Self::new(name).with_persistent(true)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the minimum severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the source patterns.
    #[must_use]
    pub fn with_sources<S: Into<String>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the category patterns.
    #[must_use]
    pub fn with_categories<S: Into<String>>(
        mut self,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the body pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Sets the post-match test.
    #[must_use]
    pub fn with_test(mut self, test: TestAst) -> Self {
        self.test = Some(test);
        self
    }

    /// Sets persistence.
    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Sets the occurrence threshold.
    #[must_use]
    pub fn with_occurrence(mut self, occurrence: Occurrence) -> Self {
        self.occurrence = occurrence;
        self
    }

    /// Sets the window length in seconds.
    #[must_use]
    pub fn with_timespan(mut self, seconds: i64) -> Self {
        self.timespan = seconds;
        self
    }

    /// Tracks each source separately.
    #[must_use]
    pub fn with_per_source(mut self, per_source: bool) -> Self {
        self.per_source = per_source;
        self
    }

    /// Tracks each target separately.
    #[must_use]
    pub fn with_per_target(mut self, per_target: bool) -> Self {
        self.per_target = per_target;
        self
    }

    /// Sets the capture group naming the target.
    #[must_use]
    pub fn with_target_group(mut self, group: usize) -> Self {
        self.target_group = group;
        self
    }
}

// =============================================================================
// RuleConfig
// =============================================================================

/// Configuration of one rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleConfig {
    /// Unique name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// The boolean expression.
    pub expr: BoolAst,
    /// Optional domain ("WHERE") clause.
    pub domain: Option<DomainAst>,
    /// Alarm message template.
    pub message: String,
    /// Actions reported when the rule holds.
    pub actions: Vec<String>,
    /// Actions reported when the rule does not hold.
    pub false_actions: Vec<String>,
    /// Fact conditions set to the rule's outcome when forced.
    pub facts: Vec<String>,
    /// Fire again for the same alarm once `holdoff` has elapsed.
    pub repeat_alarm: bool,
    /// Minimum seconds between repeated firings of one alarm.
    pub holdoff: i64,
    /// Disabled rules never fire.
    pub enabled: bool,
}

impl RuleConfig {
    /// Creates an enabled rule with no message, actions, or facts.
    #[must_use]
    pub fn new(name: impl Into<String>, expr: BoolAst) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            expr,
            domain: None,
            message: String::new(),
            actions: Vec::new(),
            false_actions: Vec::new(),
            facts: Vec::new(),
            repeat_alarm: false,
            holdoff: 0,
            enabled: true,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the domain clause.
    #[must_use]
    pub fn with_domain(mut self, domain: DomainAst) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Sets the alarm message template.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the actions reported when the rule holds.
    #[must_use]
    pub fn with_actions<S: Into<String>>(mut self, actions: impl IntoIterator<Item = S>) -> Self {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the actions reported when the rule does not hold.
    #[must_use]
    pub fn with_false_actions<S: Into<String>>(
        mut self,
        actions: impl IntoIterator<Item = S>,
    ) -> Self {
        self.false_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the chained facts.
    #[must_use]
    pub fn with_facts<S: Into<String>>(mut self, facts: impl IntoIterator<Item = S>) -> Self {
        self.facts = facts.into_iter().map(Into::into).collect();
        self
    }

    /// Fires again for the same alarm after `holdoff` seconds.
    #[must_use]
    pub fn with_repeat(mut self, holdoff: i64) -> Self {
        self.repeat_alarm = true;
        self.holdoff = holdoff;
        self
    }

    /// Enables or disables the rule.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
