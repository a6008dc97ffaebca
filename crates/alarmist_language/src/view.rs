//! Read access to conditions during rule evaluation.

use alarmist_foundation::{Axis, DomainPair, Error, MatchFields, Result, Selector};
use alarmist_storage::Hitmap;

use crate::participants::Participants;

/// What rule evaluation needs to see of a condition.
///
/// Conditions are owned by the engine's registry; rules borrow them through
/// this trait for the duration of one evaluation.
pub trait ConditionView {
    /// The condition's name.
    fn name(&self) -> &str;

    /// The condition's hitmap.
    fn hitmap(&self) -> &Hitmap;

    /// Fields of the most recent message the condition accepted.
    fn last_fields(&self) -> &MatchFields;

    /// Index of a source or target name, or `Nil` if the condition never saw it.
    fn find_arg(&self, name: &str, axis: Axis) -> Selector {
        match axis {
            Axis::Source => self.hitmap().find_source(name),
            Axis::Target => self.hitmap().find_target(name),
        }
    }

    /// Known source or target names in index order.
    fn arg_names(&self, axis: Axis) -> Vec<&str> {
        match axis {
            Axis::Source => self.hitmap().source_names().collect(),
            Axis::Target => self.hitmap().target_names().collect(),
        }
    }

    /// Cell address of the most recent accepted message.
    ///
    /// Axes the condition does not parameterize resolve to the global bucket.
    fn last_location(&self) -> DomainPair {
        let map = self.hitmap();
        let fields = self.last_fields();
        let source = if map.per_source() {
            map.find_source(&fields.source)
        } else if map.source_count() > 0 {
            Selector::At(0)
        } else {
            Selector::Nil
        };
        let target = if map.per_target() {
            map.find_target(&fields.target)
        } else if map.target_count() > 0 {
            Selector::At(0)
        } else {
            Selector::Nil
        };
        DomainPair::new(source, target)
    }

    /// True if any cell covered by `pair` has been hit or forced.
    fn any_defined(&self, pair: DomainPair) -> bool {
        let Ok((sources, targets)) = self.hitmap().range(pair) else {
            return false;
        };
        sources
            .flat_map(|s| targets.clone().map(move |t| (s, t)))
            .any(|(s, t)| self.hitmap().defined(s, t))
    }
}

/// Everything one rule evaluation reads.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    /// Name of the rule being evaluated, for diagnostics.
    pub rule: &'a str,
    /// The rule's conditions in rule-local index order.
    pub conditions: &'a [&'a dyn ConditionView],
    /// Participant groups for ratio functions.
    pub participants: &'a Participants,
    /// Ceiling on domain vectors and enumerated combinations.
    pub max_combinations: usize,
}

impl<'a> EvalContext<'a> {
    /// Creates a context with no combination ceiling.
    #[must_use]
    pub fn new(
        rule: &'a str,
        conditions: &'a [&'a dyn ConditionView],
        participants: &'a Participants,
    ) -> Self {
        Self {
            rule,
            conditions,
            participants,
            max_combinations: usize::MAX,
        }
    }

    /// Sets the combination ceiling.
    #[must_use]
    pub fn with_max_combinations(mut self, limit: usize) -> Self {
        self.max_combinations = limit;
        self
    }

    /// Number of conditions the rule references.
    #[must_use]
    pub fn width(&self) -> usize {
        self.conditions.len()
    }

    /// The condition at a rule-local index.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the index is out of range.
    pub fn condition(&self, index: usize) -> Result<&'a dyn ConditionView> {
        self.conditions.get(index).copied().ok_or_else(|| {
            Error::internal(format!("rule {} has no condition #{index}", self.rule))
        })
    }
}
