//! Conditions: filters in front of a hitmap.
//!
//! A condition screens each message by severity, source, category, body
//! pattern and an optional test, cheapest first. Messages that pass are
//! captured into its [`Hitmap`]. The condition also keeps the lists of
//! rules to notify when its status, sources or targets change.

use alarmist_foundation::{
    ConditionId, DomainPair, Error, ErrorContext, MatchFields, Message, Result, RuleId, Severity,
    push_unique,
};
use alarmist_language::{ConditionView, RuleCompiler, TestExpr};
use alarmist_storage::{Capture, ChangeFlags, Hitmap, Occurrence, WindowPolicy};
use regex::Regex;

use crate::config::{ANY_PATTERN, ConditionConfig};

// =============================================================================
// Filters
// =============================================================================

/// Whole-string patterns; `None` accepts anything.
#[derive(Clone, Debug)]
struct NameFilter(Option<Vec<Regex>>);

impl NameFilter {
    fn compile(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() || patterns.iter().any(|p| p == ANY_PATTERN) {
            return Ok(Self(None));
        }
        patterns
            .iter()
            .map(|p| Regex::new(&format!("^(?:{p})$")).map_err(|e| Error::parse(e.to_string(), p)))
            .collect::<Result<Vec<_>>>()
            .map(|list| Self(Some(list)))
    }

    fn accepts(&self, value: &str) -> bool {
        self.0
            .as_ref()
            .is_none_or(|list| list.iter().any(|re| re.is_match(value)))
    }
}

fn compile_body(pattern: &str) -> Result<Option<Regex>> {
    if pattern.is_empty() || pattern == ANY_PATTERN {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|e| Error::parse(e.to_string(), pattern))
}

// =============================================================================
// Condition
// =============================================================================

/// A named filter and trigger unit.
#[derive(Clone, Debug)]
pub struct Condition {
    id: ConditionId,
    name: String,
    description: String,
    severity: Severity,
    sources: NameFilter,
    categories: NameFilter,
    pattern: Option<Regex>,
    test: TestExpr,
    policy: WindowPolicy,
    target_group: usize,
    hitmap: Hitmap,
    fields: MatchFields,
    captured: u64,
    notify_status: Vec<RuleId>,
    notify_source: Vec<RuleId>,
    notify_target: Vec<RuleId>,
}

impl Condition {
    /// Creates a condition from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for an invalid pattern or test, or a per-target
    /// condition whose body pattern lacks the target group, and
    /// `InvalidOperation` for a zero at-least threshold or a negative
    /// timespan.
    pub fn new(id: ConditionId, config: &ConditionConfig) -> Result<Self> {
        Self::build(id, config)
            .map_err(|e| e.with_context(ErrorContext::new().with_condition(&config.name)))
    }

    fn build(id: ConditionId, config: &ConditionConfig) -> Result<Self> {
        if config.occurrence == Occurrence::AtLeast(0) {
            return Err(Error::invalid_operation("at-least threshold must be positive"));
        }
        if config.timespan < 0 {
            return Err(Error::invalid_operation("timespan must not be negative"));
        }

        let pattern = compile_body(&config.pattern)?;
        if config.per_target {
            let Some(re) = &pattern else {
                return Err(Error::parse(
                    "a per-target condition needs a body pattern",
                    &config.pattern,
                ));
            };
            if config.target_group >= re.captures_len() {
                return Err(Error::parse(
                    format!("body pattern has no capture group {}", config.target_group),
                    &config.pattern,
                ));
            }
        }

        let test = config
            .test
            .as_ref()
            .map(RuleCompiler::compile_test)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            id,
            name: config.name.clone(),
            description: config.description.clone(),
            severity: config.severity,
            sources: NameFilter::compile(&config.sources)?,
            categories: NameFilter::compile(&config.categories)?,
            pattern,
            test,
            policy: WindowPolicy::new(config.occurrence, config.timespan)
                .with_persistent(config.persistent),
            target_group: config.target_group,
            hitmap: Hitmap::new(config.per_source, config.per_target),
            fields: MatchFields::new(),
            captured: 0,
            notify_status: Vec::new(),
            notify_source: Vec::new(),
            notify_target: Vec::new(),
        })
    }

    /// The registry handle.
    #[must_use]
    pub fn id(&self) -> ConditionId {
        self.id
    }

    /// The description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The window policy.
    #[must_use]
    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// True if the condition tracks sources or targets separately.
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        self.hitmap.per_source() || self.hitmap.per_target()
    }

    /// Number of messages captured since creation or the last reset.
    #[must_use]
    pub fn captured_count(&self) -> u64 {
        self.captured
    }

    /// Status of the global cell of a non-parameterized condition.
    #[must_use]
    pub fn status(&self) -> bool {
        self.hitmap.status(0, 0)
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// Runs a message through the filters and captures it if it passes.
    ///
    /// Returns `None` if the message was filtered out.
    pub fn match_message(&mut self, message: &Message) -> Option<Capture> {
        if message.severity < self.severity
            || !self.sources.accepts(&message.source)
            || !self.categories.accepts(&message.category)
        {
            return None;
        }

        let groups: Vec<String> = match &self.pattern {
            None => vec![message.body.clone()],
            Some(re) => {
                let captures = re.captures(&message.body)?;
                captures
                    .iter()
                    .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect()
            }
        };

        let target = if self.hitmap.per_target() {
            groups.get(self.target_group).cloned().unwrap_or_default()
        } else {
            String::new()
        };

        let fields = MatchFields {
            severity: message.severity,
            source: message.source.clone(),
            target,
            category: message.category.clone(),
            body: message.body.clone(),
            groups,
        };
        if !self.test.evaluate(&fields) {
            tracing::trace!(condition = %self.name, "message rejected by test");
            return None;
        }

        let capture = self.hitmap.capture(
            message.clone(),
            &fields.source,
            &fields.target,
            fields.groups.clone(),
            &self.policy,
        );
        self.fields = fields;
        self.captured += 1;

        tracing::debug!(
            condition = %self.name,
            source = %self.fields.source,
            target = %self.fields.target,
            flags = ?capture.flags,
            "message captured"
        );
        Some(capture)
    }

    /// Sets the status of a non-parameterized condition directly.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a per-source or per-target condition.
    pub fn force(&mut self, value: bool) -> Result<ChangeFlags> {
        let flags = self
            .hitmap
            .force(value)
            .map_err(|e| e.with_context(ErrorContext::new().with_condition(&self.name)))?;
        tracing::debug!(condition = %self.name, value, flags = ?flags, "condition forced");
        Ok(flags)
    }

    /// Delivers a scheduled check. Returns true if the cell's status flipped.
    pub fn event(&mut self, source: usize, target: usize, due: i64) -> bool {
        let flipped = self.hitmap.event(source, target, due, &self.policy);
        if flipped {
            tracing::debug!(condition = %self.name, source, target, due, "window closed");
        }
        flipped
    }

    /// Clears every cell and counter. Configuration and notify lists stay.
    pub fn reset(&mut self) {
        self.hitmap.reset();
        self.fields = MatchFields::new();
        self.captured = 0;
    }

    /// Whether the condition has been hit or forced.
    ///
    /// With `None`, the condition must have at most one source and one
    /// target bucket and the global cell is consulted. With a pair, any
    /// cell it covers counts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `None` is given and the condition has
    /// more than one source or target bucket.
    pub fn get_defined(&self, pair: Option<DomainPair>) -> Result<bool> {
        match pair {
            Some(pair) => Ok(!pair.is_null() && self.any_defined(pair)),
            None if self.hitmap.source_count() > 1 || self.hitmap.target_count() > 1 => {
                Err(Error::invalid_operation(format!(
                    "condition {} has several cells; a domain is required",
                    self.name
                )))
            }
            None => Ok(self.hitmap.defined(0, 0)),
        }
    }

    // -------------------------------------------------------------------------
    // Notify lists
    // -------------------------------------------------------------------------

    /// Rules to re-evaluate when a cell flips.
    #[must_use]
    pub fn notify_status(&self) -> &[RuleId] {
        &self.notify_status
    }

    /// Rules whose domain depends on this condition's sources.
    #[must_use]
    pub fn notify_source(&self) -> &[RuleId] {
        &self.notify_source
    }

    /// Rules whose domain depends on this condition's targets.
    #[must_use]
    pub fn notify_target(&self) -> &[RuleId] {
        &self.notify_target
    }

    pub(crate) fn push_notify_status(&mut self, rule: RuleId) {
        push_unique(&mut self.notify_status, rule);
    }

    pub(crate) fn push_notify_source(&mut self, rule: RuleId) {
        push_unique(&mut self.notify_source, rule);
    }

    pub(crate) fn push_notify_target(&mut self, rule: RuleId) {
        push_unique(&mut self.notify_target, rule);
    }
}

impl ConditionView for Condition {
    fn name(&self) -> &str {
        &self.name
    }

    fn hitmap(&self) -> &Hitmap {
        &self.hitmap
    }

    fn last_fields(&self) -> &MatchFields {
        &self.fields
    }
}
