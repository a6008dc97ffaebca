//! The notification-driven rule engine.
//!
//! The engine owns the condition and rule registries. A message flows
//! through it in phases:
//!
//! 1. **Matching**: every condition filters and captures the message.
//! 2. **Notifying**: conditions that saw a new source or target name ask
//!    their linked rules to recompute candidate domains.
//! 3. **Evaluating**: conditions whose cells flipped ask their rules to
//!    search for an alarm.
//! 4. **Acting**: fired rules render their message and invoke the alarm
//!    callback.
//!
//! Timing sweeps and forced facts enter the same pipeline at step 2.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use alarmist_foundation::{
    ConditionId, DomainVector, Error, ErrorKind, Message, NameKind, Result, RuleId, SemanticLimit,
    merge_unique,
};
use alarmist_language::{ConditionRefs, ConditionView, EvalContext, Participants};
use alarmist_storage::{ChangeFlags, TimingEvent, TimingQueue};

use crate::clock::{Clock, SystemClock};
use crate::condition::Condition;
use crate::config::{ConditionConfig, EngineConfig, RuleConfig};
use crate::rule::{Evaluation, Rule};

// =============================================================================
// Reports
// =============================================================================

/// What the engine is doing right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    /// Waiting for input.
    #[default]
    Idle,
    /// Running conditions over input.
    Matching,
    /// Recomputing rule domains.
    Notifying,
    /// Evaluating rules.
    Evaluating,
    /// Dispatching a fired alarm.
    Acting,
}

/// A fired alarm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alarm {
    /// The rule that fired.
    pub rule: String,
    /// The rendered alarm message.
    pub message: String,
}

/// Outcome of [`RuleEngine::feed`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedReport {
    /// Conditions that captured the message, in registry order.
    pub matched: Vec<String>,
    /// Alarms fired as a consequence.
    pub alarms: Vec<Alarm>,
}

/// Outcome of [`RuleEngine::force`].
///
/// Entries of a rule evaluated more than once during chaining hold its
/// latest outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecuteReport {
    /// Actions per evaluated rule: its actions if it held, its false
    /// actions otherwise.
    pub actions: BTreeMap<String, Vec<String>>,
    /// Chained facts per evaluated rule and the value each was set to.
    pub facts: BTreeMap<String, BTreeMap<String, bool>>,
    /// Alarms fired during the call.
    pub alarms: Vec<Alarm>,
}

/// Receives `(rule, message)` once per fired alarm.
pub type AlarmCallback = Box<dyn FnMut(&str, &str) + Send>;

/// Receives a condition name once per captured message.
pub type MatchCallback = Box<dyn FnMut(&str) + Send>;

// =============================================================================
// RuleEngine
// =============================================================================

/// Registries of conditions and rules plus the pending timing events.
pub struct RuleEngine {
    config: EngineConfig,
    conditions: Vec<Condition>,
    condition_index: HashMap<String, ConditionId>,
    rules: Vec<Rule>,
    rule_index: HashMap<String, RuleId>,
    participants: Participants,
    timing: TimingQueue,
    clock: Arc<dyn Clock>,
    phase: EnginePhase,
    on_alarm: Option<AlarmCallback>,
    on_match: Option<MatchCallback>,
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("config", &self.config)
            .field("conditions", &self.conditions.len())
            .field("rules", &self.rules.len())
            .field("pending_events", &self.timing.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RuleEngine {
    /// Creates an empty engine on the system clock.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            conditions: Vec::new(),
            condition_index: HashMap::new(),
            rules: Vec::new(),
            rule_index: HashMap::new(),
            participants: Participants::new(),
            timing: TimingQueue::new(),
            clock: Arc::new(SystemClock),
            phase: EnginePhase::Idle,
            on_alarm: None,
            on_match: None,
        }
    }

    /// Creates an engine and registers conditions, then rules.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn build(
        config: EngineConfig,
        conditions: impl IntoIterator<Item = ConditionConfig>,
        rules: impl IntoIterator<Item = RuleConfig>,
    ) -> Result<Self> {
        let mut engine = Self::new(config);
        for condition in conditions {
            engine.add_condition(&condition)?;
        }
        for rule in rules {
            engine.add_rule(&rule)?;
        }
        Ok(engine)
    }

    /// Creates a fact engine: one minimal fact condition per listed fact
    /// and per fact chained by a rule.
    ///
    /// # Errors
    ///
    /// Returns the first rule configuration error.
    pub fn from_facts<S: Into<String>>(
        config: EngineConfig,
        facts: impl IntoIterator<Item = S>,
        rules: impl IntoIterator<Item = RuleConfig>,
    ) -> Result<Self> {
        let rules: Vec<RuleConfig> = rules.into_iter().collect();
        let mut names: Vec<String> = facts.into_iter().map(Into::into).collect();
        for fact in rules.iter().flat_map(|r| &r.facts) {
            if !names.contains(fact) {
                names.push(fact.clone());
            }
        }

        let mut engine = Self::new(config);
        for name in names {
            if !engine.condition_index.contains_key(&name) {
                engine.add_condition(&ConditionConfig::fact(name))?;
            }
        }
        for rule in &rules {
            engine.add_rule(rule)?;
        }
        Ok(engine)
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the participant registry.
    #[must_use]
    pub fn with_participants(mut self, participants: Participants) -> Self {
        self.participants = participants;
        self
    }

    /// Sets the alarm callback.
    pub fn set_alarm_callback(&mut self, callback: impl FnMut(&str, &str) + Send + 'static) {
        self.on_alarm = Some(Box::new(callback));
    }

    /// Sets the condition match callback.
    pub fn set_match_callback(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.on_match = Some(Box::new(callback));
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Registers a condition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the name is taken, or the condition's
    /// configuration error.
    pub fn add_condition(&mut self, config: &ConditionConfig) -> Result<ConditionId> {
        if self.condition_index.contains_key(&config.name) {
            return Err(Error::invalid_operation(format!(
                "condition {} already exists",
                config.name
            )));
        }
        let id = ConditionId::new(self.conditions.len());
        let condition = Condition::new(id, config)?;
        self.conditions.push(condition);
        self.condition_index.insert(config.name.clone(), id);
        tracing::debug!(condition = %config.name, "condition registered");
        Ok(id)
    }

    /// Compiles and registers a rule, then computes its domain.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the name is taken, `UnknownName` if a
    /// chained fact is not a registered condition, or the rule's
    /// compilation error.
    pub fn add_rule(&mut self, config: &RuleConfig) -> Result<RuleId> {
        if self.rule_index.contains_key(&config.name) {
            return Err(Error::invalid_operation(format!(
                "rule {} already exists",
                config.name
            )));
        }
        if let Some(fact) = config
            .facts
            .iter()
            .find(|f| !self.condition_index.contains_key(*f))
        {
            return Err(Error::unknown_name(NameKind::Condition, fact.clone()));
        }

        let id = RuleId::new(self.rules.len());
        let rule = Rule::new(id, config, &self.condition_index)?;

        for &cid in rule.conditions().ids() {
            self.conditions[cid.index()].push_notify_status(id);
        }
        for cid in rule.source_links() {
            self.conditions[cid.index()].push_notify_source(id);
        }
        for cid in rule.target_links() {
            self.conditions[cid.index()].push_notify_target(id);
        }

        self.rules.push(rule);
        self.rule_index.insert(config.name.clone(), id);
        tracing::debug!(rule = %config.name, "rule registered");

        if let Err(error) = self.refresh_domain(id) {
            log_skipped(&config.name, &error);
        }
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Runs one message through the engine.
    ///
    /// Per-rule failures are logged and skip the rule; they never abort
    /// the call.
    pub fn feed(&mut self, message: &Message) -> FeedReport {
        self.phase = EnginePhase::Matching;
        let mut report = FeedReport::default();
        let mut status = Vec::new();
        let mut domain = Vec::new();

        for condition in &mut self.conditions {
            let Some(capture) = condition.match_message(message) else {
                continue;
            };
            if let Some(callback) = &mut self.on_match {
                callback(condition.name());
            }
            report.matched.push(condition.name().to_string());
            if let Some(due) = capture.schedule {
                self.timing.push(TimingEvent::new(
                    due,
                    condition.id(),
                    capture.source,
                    capture.target,
                ));
            }
            collect_notify(condition, capture.flags, &mut status, &mut domain);
        }

        report.alarms = self.propagate(&status, &domain);
        self.phase = EnginePhase::Idle;
        report
    }

    /// Delivers every timing event due at the clock's current time.
    pub fn sweep(&mut self) -> Vec<Alarm> {
        let now = self.clock.now_seconds();
        self.sweep_at(now)
    }

    /// Delivers every timing event due at or before `now`.
    pub fn sweep_at(&mut self, now: i64) -> Vec<Alarm> {
        let due = self.timing.pop_due(now);
        if due.is_empty() {
            return Vec::new();
        }

        self.phase = EnginePhase::Matching;
        let mut status = Vec::new();
        for event in due {
            let Some(condition) = self.conditions.get_mut(event.condition.index()) else {
                continue;
            };
            if condition.event(event.source, event.target, event.due) {
                merge_unique(&mut status, condition.notify_status());
            }
        }

        let alarms = self.propagate(&status, &[]);
        self.phase = EnginePhase::Idle;
        alarms
    }

    /// Forces fact conditions and chains the facts produced by the rules
    /// they notify until the notified rules produce no more facts.
    ///
    /// The rules of every forced fact are evaluated, whether or not its value
    /// changed, so a steady fact keeps reporting its rules' actions. Every
    /// notified rule that is enabled and evaluable reports either its
    /// actions and `true` for its facts, or its false actions and `false`.
    /// A rule whose alarm is in holdoff still holds.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for an unregistered fact, `InvalidOperation`
    /// if a fact is parameterized, or `LimitExceeded` once chaining passes
    /// `max_chain_depth` rounds.
    pub fn force(&mut self, facts: &[(&str, bool)]) -> Result<ExecuteReport> {
        let pending = facts
            .iter()
            .map(|&(name, value)| Ok((self.condition_id(name)?, value)))
            .collect::<Result<Vec<_>>>()?;
        let result = self.chain(pending);
        self.phase = EnginePhase::Idle;
        result
    }

    fn chain(&mut self, mut pending: Vec<(ConditionId, bool)>) -> Result<ExecuteReport> {
        let mut report = ExecuteReport::default();
        let mut depth = 0_u32;
        let mut last_rule: Option<String> = None;

        while !pending.is_empty() {
            if depth >= self.config.max_chain_depth {
                return Err(Error::limit_exceeded(SemanticLimit::MaxChainDepth {
                    limit: self.config.max_chain_depth,
                    rule: last_rule,
                }));
            }
            depth += 1;

            self.phase = EnginePhase::Matching;
            let mut status = Vec::new();
            let mut domain = Vec::new();
            for (id, value) in pending.drain(..) {
                let condition = self.condition_mut(id)?;
                let flags = condition.force(value)?;
                collect_notify(condition, flags, &mut status, &mut domain);
                merge_unique(&mut status, condition.notify_status());
            }

            self.refresh_domains(&domain);

            self.phase = EnginePhase::Evaluating;
            for id in status {
                let Some(rule) = self.rules.get(id.index()) else {
                    continue;
                };
                if !rule.is_enabled() {
                    continue;
                }
                let name = rule.name().to_string();
                match self.evaluable(id) {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::trace!(rule = %name, "rule not evaluable yet");
                        continue;
                    }
                    Err(error) => {
                        log_skipped(&name, &error);
                        continue;
                    }
                }

                let (outcome, alarm) = match self.evaluate_rule(id) {
                    Ok(result) => result,
                    Err(error) => {
                        log_skipped(&name, &error);
                        continue;
                    }
                };
                if let Some(alarm) = alarm {
                    self.raise(&alarm);
                    report.alarms.push(alarm);
                    self.phase = EnginePhase::Evaluating;
                }

                let rule = &self.rules[id.index()];
                let holds = outcome.holds();
                let actions = if holds {
                    rule.actions()
                } else {
                    rule.false_actions()
                };
                report.actions.insert(name.clone(), actions.to_vec());

                let produced = report.facts.entry(name.clone()).or_default();
                if !rule.facts().is_empty() {
                    for fact in rule.facts() {
                        produced.insert(fact.clone(), holds);
                        if let Some(&cid) = self.condition_index.get(fact) {
                            pending.push((cid, holds));
                        }
                    }
                    tracing::debug!(rule = %name, holds, facts = rule.facts().len(), "facts chained");
                    last_rule = Some(name);
                }
            }
        }
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Propagation
    // -------------------------------------------------------------------------

    /// Recomputes domains, then evaluates rules. Returns the fired alarms.
    fn propagate(&mut self, status: &[RuleId], domain: &[RuleId]) -> Vec<Alarm> {
        self.refresh_domains(domain);

        self.phase = EnginePhase::Evaluating;
        let mut alarms = Vec::new();
        for &id in status {
            match self.evaluate_rule(id) {
                Ok((_, Some(alarm))) => {
                    self.raise(&alarm);
                    alarms.push(alarm);
                    self.phase = EnginePhase::Evaluating;
                }
                Ok((_, None)) => {}
                Err(error) => {
                    let name = self.rules.get(id.index()).map_or("?", Rule::name);
                    log_skipped(name, &error);
                }
            }
        }
        alarms
    }

    fn refresh_domains(&mut self, domain: &[RuleId]) {
        if domain.is_empty() {
            return;
        }
        self.phase = EnginePhase::Notifying;
        for &id in domain {
            if let Err(error) = self.refresh_domain(id) {
                let name = self.rules.get(id.index()).map_or("?", Rule::name);
                log_skipped(name, &error);
            }
        }
    }

    fn refresh_domain(&mut self, id: RuleId) -> Result<()> {
        let Self {
            config,
            conditions,
            rules,
            participants,
            ..
        } = self;
        let rule = rule_mut(rules, id)?;
        let views = views(conditions, rule.conditions())?;
        let name = rule.name().to_string();
        let ctx = EvalContext::new(&name, &views, participants)
            .with_max_combinations(config.max_domain_combinations);
        rule.evaluate_domain(&ctx)
    }

    fn evaluate_rule(&mut self, id: RuleId) -> Result<(Evaluation, Option<Alarm>)> {
        let now = self.clock.now_seconds();
        let Self {
            config,
            conditions,
            rules,
            participants,
            ..
        } = self;
        let rule = rule_mut(rules, id)?;
        let views = views(conditions, rule.conditions())?;
        let name = rule.name().to_string();
        let ctx = EvalContext::new(&name, &views, participants)
            .with_max_combinations(config.max_domain_combinations);

        let outcome = rule.evaluate(&ctx, now, config.canonical_alarm_keys)?;
        if !outcome.fired() {
            return Ok((outcome, None));
        }
        let message = rule.alarm_message(&ctx).unwrap_or_else(|error| {
            tracing::warn!(rule = %name, %error, "alarm message rendering failed");
            rule.template().plain().to_string()
        });
        Ok((outcome, Some(Alarm { rule: name, message })))
    }

    fn evaluable(&self, id: RuleId) -> Result<bool> {
        let rule = self
            .rules
            .get(id.index())
            .ok_or_else(|| Error::internal(format!("no rule {id:?}")))?;
        let conditions = rule
            .conditions()
            .ids()
            .iter()
            .map(|cid| self.condition_ref(*cid))
            .collect::<Result<Vec<_>>>()?;
        rule.evaluable(&conditions)
    }

    fn raise(&mut self, alarm: &Alarm) {
        self.phase = EnginePhase::Acting;
        tracing::info!(rule = %alarm.rule, message = %alarm.message, "alarm raised");
        if let Some(callback) = &mut self.on_alarm {
            callback(&alarm.rule, &alarm.message);
        }
    }

    // -------------------------------------------------------------------------
    // Reset
    // -------------------------------------------------------------------------

    /// Returns every condition and rule to its ground state and drops all
    /// pending timing events. Registrations and participants stay.
    pub fn reset(&mut self) {
        for condition in &mut self.conditions {
            condition.reset();
        }
        for rule in &mut self.rules {
            rule.reset();
        }
        self.timing.clear();
        let all: Vec<RuleId> = (0..self.rules.len()).map(RuleId::new).collect();
        self.refresh_domains(&all);
        self.phase = EnginePhase::Idle;
        tracing::debug!("engine reset");
    }

    /// Resets one rule and every condition it references.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist.
    pub fn reset_rule(&mut self, name: &str) -> Result<()> {
        let id = self.rule_id(name)?;
        let rule = &mut self.rules[id.index()];
        rule.reset();
        let referenced = rule.conditions().ids().to_vec();

        let mut dependents = vec![id];
        for cid in referenced {
            self.reset_condition_state(cid, &mut dependents);
        }
        self.refresh_domains(&dependents);
        self.phase = EnginePhase::Idle;
        tracing::debug!(rule = %name, "rule reset");
        Ok(())
    }

    /// Resets one condition.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the condition does not exist.
    pub fn reset_condition(&mut self, name: &str) -> Result<()> {
        let id = self.condition_id(name)?;
        let mut dependents = Vec::new();
        self.reset_condition_state(id, &mut dependents);
        self.refresh_domains(&dependents);
        self.phase = EnginePhase::Idle;
        Ok(())
    }

    fn reset_condition_state(&mut self, id: ConditionId, dependents: &mut Vec<RuleId>) {
        let Some(condition) = self.conditions.get_mut(id.index()) else {
            return;
        };
        condition.reset();
        merge_unique(dependents, condition.notify_source());
        merge_unique(dependents, condition.notify_target());
        self.timing.remove_condition(id);
    }

    // -------------------------------------------------------------------------
    // Management and queries
    // -------------------------------------------------------------------------

    /// Enables a rule.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist.
    pub fn enable_rule(&mut self, name: &str) -> Result<()> {
        let id = self.rule_id(name)?;
        self.rules[id.index()].set_enabled(true);
        Ok(())
    }

    /// Disables a rule. Disabled rules never fire and are skipped by
    /// [`RuleEngine::force`].
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist.
    pub fn disable_rule(&mut self, name: &str) -> Result<()> {
        let id = self.rule_id(name)?;
        self.rules[id.index()].set_enabled(false);
        Ok(())
    }

    /// Rule names in registration order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(Rule::name)
    }

    /// Condition names in registration order.
    pub fn condition_names(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(ConditionView::name)
    }

    /// A rule by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist.
    pub fn rule(&self, name: &str) -> Result<&Rule> {
        Ok(&self.rules[self.rule_id(name)?.index()])
    }

    /// A condition by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the condition does not exist.
    pub fn condition(&self, name: &str) -> Result<&Condition> {
        Ok(&self.conditions[self.condition_id(name)?.index()])
    }

    /// Number of times a rule fired since creation or its last reset.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist.
    pub fn alarm_count(&self, rule: &str) -> Result<u64> {
        Ok(self.rule(rule)?.alarm_count())
    }

    /// The alarm vector of a rule's last firing.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist.
    pub fn last_alarm(&self, rule: &str) -> Result<Option<&DomainVector>> {
        Ok(self.rule(rule)?.last_alarm())
    }

    /// Renders the message of a rule's last firing.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist, or
    /// `InvalidOperation` if it has not fired.
    pub fn alarm_message(&self, rule: &str) -> Result<String> {
        let rule = self.rule(rule)?;
        let views = views(&self.conditions, rule.conditions())?;
        let ctx = EvalContext::new(rule.name(), &views, &self.participants);
        rule.alarm_message(&ctx)
    }

    /// Number of messages a condition captured since creation or its last
    /// reset.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the condition does not exist.
    pub fn captured_count(&self, condition: &str) -> Result<u64> {
        Ok(self.condition(condition)?.captured_count())
    }

    /// Whether every condition of a rule is defined.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the rule does not exist, or
    /// `InvalidOperation` if one of its conditions has several cells.
    pub fn rule_evaluable(&self, rule: &str) -> Result<bool> {
        self.evaluable(self.rule_id(rule)?)
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The participant registry.
    #[must_use]
    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    /// The participant registry, for adding groups after construction.
    pub fn participants_mut(&mut self) -> &mut Participants {
        &mut self.participants
    }

    /// Number of pending timing events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.timing.len()
    }

    /// Due time of the earliest pending timing event.
    #[must_use]
    pub fn next_due(&self) -> Option<i64> {
        self.timing.next_due()
    }

    fn rule_id(&self, name: &str) -> Result<RuleId> {
        self.rule_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::unknown_name(NameKind::Rule, name))
    }

    fn condition_id(&self, name: &str) -> Result<ConditionId> {
        self.condition_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::unknown_name(NameKind::Condition, name))
    }

    fn condition_ref(&self, id: ConditionId) -> Result<&Condition> {
        self.conditions
            .get(id.index())
            .ok_or_else(|| Error::internal(format!("no condition {id:?}")))
    }

    fn condition_mut(&mut self, id: ConditionId) -> Result<&mut Condition> {
        self.conditions
            .get_mut(id.index())
            .ok_or_else(|| Error::internal(format!("no condition {id:?}")))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn rule_mut(rules: &mut [Rule], id: RuleId) -> Result<&mut Rule> {
    rules
        .get_mut(id.index())
        .ok_or_else(|| Error::internal(format!("no rule {id:?}")))
}

/// The rule's conditions as views, in rule-local order.
fn views<'a>(conditions: &'a [Condition], refs: &ConditionRefs) -> Result<Vec<&'a dyn ConditionView>> {
    refs.ids()
        .iter()
        .map(|id| {
            conditions
                .get(id.index())
                .map(|c| c as &dyn ConditionView)
                .ok_or_else(|| Error::internal(format!("no condition {id:?}")))
        })
        .collect()
}

fn collect_notify(
    condition: &Condition,
    flags: ChangeFlags,
    status: &mut Vec<RuleId>,
    domain: &mut Vec<RuleId>,
) {
    if flags.contains(ChangeFlags::SOURCE) {
        merge_unique(domain, condition.notify_source());
    }
    if flags.contains(ChangeFlags::TARGET) {
        merge_unique(domain, condition.notify_target());
    }
    if flags.contains(ChangeFlags::STATUS) {
        merge_unique(status, condition.notify_status());
    }
}

fn log_skipped(rule: &str, error: &Error) {
    if error.is_invariant_violation() {
        tracing::error!(rule, %error, "rule broke an invariant");
        debug_assert!(false, "rule {rule} broke an invariant: {error}");
    } else if matches!(error.kind, ErrorKind::DomainTooLarge { .. }) {
        tracing::warn!(rule, %error, "rule skipped, domain too large");
    } else {
        tracing::warn!(rule, %error, "rule skipped");
    }
}
