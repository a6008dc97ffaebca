//! Custom rule functions and condition test functions.
//!
//! Both are closed sets selected by name when an expression is compiled.
//! Literal arguments are validated at compile time so evaluation only fails
//! on data it reads from a condition.

use std::collections::HashMap;
use std::fmt;

use alarmist_foundation::{
    DomainPair, Error, ErrorKind, MatchFields, NameKind, Result, Value, ValueKind,
};
use alarmist_storage::CountKind;

use crate::participants::Participants;
use crate::view::ConditionView;

// =============================================================================
// Rule functions
// =============================================================================

/// A function usable in a rule's boolean expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Function {
    /// `count(cond [, 'SOURCE'|'TARGET'|'MESSAGE'])`
    Count(CountKind),
    /// `count_percent(cond, 'SOURCE'|'TARGET', group)`
    CountPercent {
        /// What to count.
        kind: CountKind,
        /// Participant group to divide by.
        group: String,
    },
    /// `is_syncd(cond)`
    IsSyncd(SyncState),
}

/// Running state of `is_syncd`: the latest timestamp reported per source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncState {
    seen: HashMap<String, u64>,
    min: u64,
    max: u64,
}

impl SyncState {
    /// Maximum spread, in timestamp units, still considered in sync.
    pub const TOLERANCE: u64 = 5;

    /// Records a report. Returns true if the sources have drifted apart.
    ///
    /// A source reporting twice starts a new round.
    pub fn record(&mut self, source: &str, time: u64) -> bool {
        if self.seen.is_empty() || self.seen.contains_key(source) {
            self.seen.clear();
            self.min = time;
            self.max = time;
            self.seen.insert(source.to_string(), time);
            return false;
        }
        self.seen.insert(source.to_string(), time);
        self.min = self.min.min(time);
        self.max = self.max.max(time);
        self.max - self.min > Self::TOLERANCE
    }

    /// Forgets every report.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.min = 0;
        self.max = 0;
    }
}

fn count_kind(arg: &Value, allow_messages: bool, input: &str) -> Result<CountKind> {
    let Some(text) = arg.as_text() else {
        return Err(Error::type_mismatch(ValueKind::Text, arg.kind()));
    };
    match text.to_ascii_uppercase().as_str() {
        "SOURCE" => Ok(CountKind::Sources),
        "TARGET" => Ok(CountKind::Targets),
        "MESSAGE" if allow_messages => Ok(CountKind::Messages),
        _ => Err(Error::parse(format!("unsupported count type '{text}'"), input)),
    }
}

impl Function {
    /// Builds a function from its name and literal arguments.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for an unknown function and `ParseError` or
    /// `TypeMismatch` for rejected arguments.
    pub fn from_call(name: &str, args: &[Value]) -> Result<Self> {
        match name {
            "count" => match args {
                [] => Ok(Self::Count(CountKind::Messages)),
                [kind] => Ok(Self::Count(count_kind(kind, true, name)?)),
                _ => Err(Error::parse("count takes at most one argument", name)),
            },
            "count_percent" => match args {
                [kind, group] => {
                    let kind = count_kind(kind, false, name)?;
                    let group = group
                        .as_text()
                        .ok_or_else(|| Error::type_mismatch(ValueKind::Text, group.kind()))?;
                    Ok(Self::CountPercent {
                        kind,
                        group: group.to_string(),
                    })
                }
                _ => Err(Error::parse("count_percent takes a type and a group", name)),
            },
            "is_syncd" => {
                if args.is_empty() {
                    Ok(Self::IsSyncd(SyncState::default()))
                } else {
                    Err(Error::parse("is_syncd takes no arguments", name))
                }
            }
            _ => Err(Error::unknown_name(NameKind::Function, name)),
        }
    }

    /// The function's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::CountPercent { .. } => "count_percent",
            Self::IsSyncd(_) => "is_syncd",
        }
    }

    /// The kind of value the function returns.
    #[must_use]
    pub fn result_kind(&self) -> ValueKind {
        match self {
            Self::Count(_) | Self::CountPercent { .. } => ValueKind::Number,
            Self::IsSyncd(_) => ValueKind::Bool,
        }
    }

    /// Whether an alarm raised through this function covers the whole
    /// evaluated domain rather than the latest message's cell.
    #[must_use]
    pub fn grouped_alarm(&self) -> bool {
        !matches!(self, Self::IsSyncd(_))
    }

    /// Evaluates the function over `domain` of `condition`.
    ///
    /// # Errors
    ///
    /// Fails if the condition lacks the data the function reads, or if a
    /// participant group is unknown or empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(
        &mut self,
        condition: &dyn ConditionView,
        domain: DomainPair,
        participants: &Participants,
    ) -> Result<Value> {
        match self {
            Self::Count(kind) => {
                let count = condition.hitmap().alarm_count(domain, *kind)?;
                Ok(Value::Number(count as f64))
            }
            Self::CountPercent { kind, group } => {
                let count = condition.hitmap().alarm_count(domain, *kind)?;
                let total = participants.group_count(group)?;
                if total == 0 {
                    return Err(Error::new(ErrorKind::DivisionByZero));
                }
                Ok(Value::Number(count as f64 / total as f64))
            }
            Self::IsSyncd(state) => {
                let fields = condition.last_fields();
                let Some(text) = fields.group(1) else {
                    return Err(Error::invalid_operation(format!(
                        "is_syncd: condition {} captured no group 1",
                        condition.name()
                    )));
                };
                // Unparsable timestamps count as out of sync.
                let Ok(time) = text.trim().parse::<u64>() else {
                    return Ok(Value::Bool(true));
                };
                Ok(Value::Bool(state.record(&fields.source, time)))
            }
        }
    }

    /// Clears any running state.
    pub fn reset(&mut self) {
        if let Self::IsSyncd(state) = self {
            state.clear();
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Test functions
// =============================================================================

/// A function usable in a condition's post-match test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestFunction {
    /// `grp_to_number(n)`: capture group `n` as a decimal or `0x` hex number.
    GrpToNumber(usize),
    /// `grp(n)`: capture group `n` as text.
    Grp(usize),
}

fn group_arg(name: &str, args: &[Value]) -> Result<usize> {
    let [arg] = args else {
        return Err(Error::parse("expected exactly one group number", name));
    };
    let n = arg
        .as_number()
        .ok_or_else(|| Error::type_mismatch(ValueKind::Number, arg.kind()))?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(Error::parse(format!("invalid group number {n}"), name));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let group = n as usize;
    Ok(group)
}

impl TestFunction {
    /// Builds a test function from its name and literal arguments.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for an unknown function and `ParseError` or
    /// `TypeMismatch` for rejected arguments.
    pub fn from_call(name: &str, args: &[Value]) -> Result<Self> {
        match name {
            "grp_to_number" => Ok(Self::GrpToNumber(group_arg(name, args)?)),
            "grp" => Ok(Self::Grp(group_arg(name, args)?)),
            _ => Err(Error::unknown_name(NameKind::TestFunction, name)),
        }
    }

    /// The kind of value the function returns.
    #[must_use]
    pub fn result_kind(self) -> ValueKind {
        match self {
            Self::GrpToNumber(_) => ValueKind::Number,
            Self::Grp(_) => ValueKind::Text,
        }
    }

    /// Evaluates against the fields of the message being matched.
    ///
    /// # Errors
    ///
    /// Fails if the group is missing or is not a number.
    pub fn evaluate(self, fields: &MatchFields) -> Result<Value> {
        let (Self::GrpToNumber(n) | Self::Grp(n)) = self;
        let text = fields
            .group(n)
            .ok_or_else(|| Error::invalid_operation(format!("group {n} does not exist")))?;
        match self {
            Self::Grp(_) => Ok(Value::from(text)),
            Self::GrpToNumber(_) => parse_number(text).map(Value::Number),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn parse_number(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .map_err(|e| Error::parse(e.to_string(), text));
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| Error::parse(e.to_string(), text))
}
