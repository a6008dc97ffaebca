//! Rules: alarm units over conditions.
//!
//! A rule searches its candidate domain set for the first concrete
//! assignment of cells under which its boolean expression holds. The alarm
//! vector recorded by that evaluation identifies the alarm; a known alarm
//! only fires again if the rule repeats and its holdoff has elapsed.
//!
//! Enumeration walks the assignments of one domain vector with an odometer:
//! the last condition's cells vary fastest, and within a condition the
//! target varies faster than the source.

use std::collections::HashMap;

use alarmist_foundation::{
    ConditionId, DomainPair, DomainSet, DomainVector, Error, ErrorContext, Result, RuleId,
    Selector,
};
use alarmist_language::{
    AlarmTemplate, BooleanExpr, ConditionRefs, DomainExpr, EvalContext, RuleCompiler,
};

use crate::condition::Condition;
use crate::config::RuleConfig;

/// Outcome of one rule evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    /// A new or repeated alarm fired.
    Fired,
    /// The expression held, but only for alarms still in holdoff.
    Suppressed,
    /// The expression held for no assignment, or the rule is disabled.
    Unsatisfied,
}

impl Evaluation {
    /// True for [`Evaluation::Fired`].
    #[must_use]
    pub fn fired(self) -> bool {
        self == Self::Fired
    }

    /// True if the expression held, whether or not an alarm fired.
    #[must_use]
    pub fn holds(self) -> bool {
        self != Self::Unsatisfied
    }
}

/// A compiled rule with its alarm history.
#[derive(Clone, Debug)]
pub struct Rule {
    id: RuleId,
    name: String,
    description: String,
    conditions: ConditionRefs,
    expr: BooleanExpr,
    domain_expr: Option<DomainExpr>,
    domains: DomainSet,
    template: AlarmTemplate,
    alarm: DomainVector,
    alarms: HashMap<DomainVector, i64>,
    alarm_count: u64,
    actions: Vec<String>,
    false_actions: Vec<String>,
    facts: Vec<String>,
    repeat_alarm: bool,
    holdoff: i64,
    enabled: bool,
    source_links: Vec<usize>,
    target_links: Vec<usize>,
}

impl Rule {
    /// Compiles a rule against the condition registry.
    ///
    /// # Errors
    ///
    /// Propagates compilation errors with the rule name attached.
    pub fn new(
        id: RuleId,
        config: &RuleConfig,
        registry: &HashMap<String, ConditionId>,
    ) -> Result<Self> {
        let compiled = RuleCompiler::compile(
            &config.expr,
            config.domain.as_ref(),
            &config.message,
            registry,
        )
        .map_err(|e| e.with_context(ErrorContext::new().with_rule(&config.name)))?;

        let width = compiled.conditions.len();
        let domains = if compiled.domain.is_none() {
            DomainSet::any(width)
        } else {
            DomainSet::new()
        };

        Ok(Self {
            id,
            name: config.name.clone(),
            description: config.description.clone(),
            conditions: compiled.conditions,
            expr: compiled.expr,
            domain_expr: compiled.domain,
            domains,
            template: compiled.template,
            alarm: DomainVector::nulls(width),
            alarms: HashMap::new(),
            alarm_count: 0,
            actions: config.actions.clone(),
            false_actions: config.false_actions.clone(),
            facts: config.facts.clone(),
            repeat_alarm: config.repeat_alarm,
            holdoff: config.holdoff,
            enabled: config.enabled,
            source_links: compiled.notify_source,
            target_links: compiled.notify_target,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The registry handle.
    #[must_use]
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// The name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The referenced conditions.
    #[must_use]
    pub fn conditions(&self) -> &ConditionRefs {
        &self.conditions
    }

    /// Conditions whose new sources change this rule's domain.
    pub fn source_links(&self) -> impl Iterator<Item = ConditionId> + '_ {
        self.source_links.iter().map(|&i| self.conditions.ids()[i])
    }

    /// Conditions whose new targets change this rule's domain.
    pub fn target_links(&self) -> impl Iterator<Item = ConditionId> + '_ {
        self.target_links.iter().map(|&i| self.conditions.ids()[i])
    }

    /// The current candidate domain set.
    #[must_use]
    pub fn domains(&self) -> &DomainSet {
        &self.domains
    }

    /// The alarm template.
    #[must_use]
    pub fn template(&self) -> &AlarmTemplate {
        &self.template
    }

    /// The alarm vector of the last firing.
    #[must_use]
    pub fn last_alarm(&self) -> Option<&DomainVector> {
        (self.alarm_count > 0).then_some(&self.alarm)
    }

    /// Number of firings since creation or the last reset.
    #[must_use]
    pub fn alarm_count(&self) -> u64 {
        self.alarm_count
    }

    /// Actions reported when the rule holds.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Actions reported when the rule does not hold.
    #[must_use]
    pub fn false_actions(&self) -> &[String] {
        &self.false_actions
    }

    /// Chained fact names.
    #[must_use]
    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    /// Whether the rule may fire.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the rule.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    /// True if every referenced condition is defined, asked without a domain.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if a condition has several cells.
    pub fn evaluable(&self, conditions: &[&Condition]) -> Result<bool> {
        for condition in conditions {
            if !condition.get_defined(None)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Recomputes the candidate domain set.
    ///
    /// Rules without a domain clause keep the all-`Any` vector.
    ///
    /// # Errors
    ///
    /// Returns `DomainTooLarge` if the set exceeds the context's ceiling;
    /// the set is left empty so the rule cannot fire on a partial domain.
    pub fn evaluate_domain(&mut self, ctx: &EvalContext<'_>) -> Result<()> {
        let Some(expr) = &self.domain_expr else {
            return Ok(());
        };
        self.domains.clear();
        self.domains = expr.evaluate(ctx)?;
        tracing::debug!(rule = %self.name, size = self.domains.len(), "domain recomputed");
        Ok(())
    }

    /// Searches for an assignment that satisfies the expression and fires
    /// its alarm unless the alarm is in holdoff.
    ///
    /// `now` is in seconds since the Unix epoch. With `canonical`, `Any`
    /// becomes the global bucket on axes a condition does not parameterize
    /// before the alarm is looked up.
    ///
    /// # Errors
    ///
    /// Returns `DomainTooLarge` if the enumeration would exceed the
    /// context's ceiling.
    pub fn evaluate(
        &mut self,
        ctx: &EvalContext<'_>,
        now: i64,
        canonical: bool,
    ) -> Result<Evaluation> {
        if !self.enabled {
            return Ok(Evaluation::Unsatisfied);
        }

        let Self {
            conditions,
            expr,
            domains,
            alarm: last_alarm,
            alarms,
            alarm_count,
            repeat_alarm,
            holdoff,
            ..
        } = self;

        let mut outcome = Evaluation::Unsatisfied;
        let mut budget = ctx.max_combinations;

        for domain in domains.iter() {
            let candidates = candidates(conditions, domain, ctx)?;
            let total = candidates
                .iter()
                .try_fold(1_usize, |acc, c| acc.checked_mul(c.len()))
                .filter(|&n| n <= budget)
                .ok_or_else(|| Error::domain_too_large(ctx.max_combinations, ctx.rule))?;
            if total == 0 {
                continue;
            }
            budget -= total;

            let mut odometer = vec![0_usize; candidates.len()];
            loop {
                let value: DomainVector = odometer
                    .iter()
                    .zip(&candidates)
                    .map(|(&k, column)| column[k])
                    .collect();

                if all_defined(conditions, &value, domain, ctx)? {
                    let mut alarm = DomainVector::nulls(value.len());
                    if expr.evaluate(&value, &mut alarm, domain, ctx) {
                        if canonical {
                            canonicalize(&mut alarm, ctx)?;
                        }
                        let due = match alarms.get(&alarm) {
                            None => true,
                            Some(&last) => *repeat_alarm && now - last >= *holdoff,
                        };
                        if due {
                            alarms.insert(alarm.clone(), now);
                            *last_alarm = alarm;
                            *alarm_count += 1;
                            return Ok(Evaluation::Fired);
                        }
                        tracing::trace!(rule = ctx.rule, ?alarm, "alarm in holdoff");
                        outcome = Evaluation::Suppressed;
                    }
                }

                if !advance(&mut odometer, &candidates) {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// Renders the alarm message of the last firing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the rule has not fired, or the
    /// rendering error of a placeholder that cannot be resolved.
    pub fn alarm_message(&self, ctx: &EvalContext<'_>) -> Result<String> {
        if self.alarm_count == 0 {
            return Err(Error::invalid_operation(format!(
                "rule {} has not raised an alarm",
                self.name
            )));
        }
        self.template.render(ctx, &self.alarm)
    }

    /// Clears function state, alarm history and the domain set.
    ///
    /// Resetting the referenced conditions is the engine's job.
    pub fn reset(&mut self) {
        self.expr.reset();
        self.alarms.clear();
        self.alarm = DomainVector::nulls(self.conditions.len());
        self.alarm_count = 0;
        if self.domain_expr.is_some() {
            self.domains.clear();
        }
    }
}

/// The cells to try for each condition of one domain vector.
///
/// Conditions reached only through functions contribute their domain pair
/// unchanged.
fn candidates(
    conditions: &ConditionRefs,
    domain: &DomainVector,
    ctx: &EvalContext<'_>,
) -> Result<Vec<Vec<DomainPair>>> {
    domain
        .iter()
        .enumerate()
        .map(|(i, &pair)| {
            if !conditions.is_primitive(i) {
                return Ok(vec![pair]);
            }
            let (sources, targets) = ctx.condition(i)?.hitmap().range(pair)?;
            Ok(sources
                .flat_map(|s| targets.clone().map(move |t| DomainPair::at(s, t)))
                .collect())
        })
        .collect()
}

fn all_defined(
    conditions: &ConditionRefs,
    value: &DomainVector,
    domain: &DomainVector,
    ctx: &EvalContext<'_>,
) -> Result<bool> {
    for (i, (pair, scope)) in value.iter().zip(domain).enumerate() {
        let condition = ctx.condition(i)?;
        let defined = match (conditions.is_primitive(i), pair.source, pair.target) {
            (true, Selector::At(s), Selector::At(t)) => condition.hitmap().defined(s, t),
            _ => condition.any_defined(*scope),
        };
        if !defined {
            return Ok(false);
        }
    }
    Ok(true)
}

fn canonicalize(alarm: &mut DomainVector, ctx: &EvalContext<'_>) -> Result<()> {
    for (i, pair) in alarm.iter_mut().enumerate() {
        let map = ctx.condition(i)?.hitmap();
        if !map.per_source() && pair.source.is_any() {
            pair.source = Selector::At(0);
        }
        if !map.per_target() && pair.target.is_any() {
            pair.target = Selector::At(0);
        }
    }
    Ok(())
}

fn advance(odometer: &mut [usize], candidates: &[Vec<DomainPair>]) -> bool {
    for (digit, column) in odometer.iter_mut().zip(candidates).rev() {
        *digit += 1;
        if *digit < column.len() {
            return true;
        }
        *digit = 0;
    }
    false
}
