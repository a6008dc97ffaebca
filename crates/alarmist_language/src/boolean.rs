//! Compiled boolean expressions.
//!
//! Evaluation is left to right with short-circuit AND/OR. Evaluating a
//! primary also records, in the caller's alarm vector, which cell of the
//! referenced condition was looked at. That vector becomes the alarm's
//! identity and supplies the arguments of the alarm message.

use alarmist_foundation::{CompareOp, DomainPair, DomainVector, Error, Result, Value, ValueKind};

use crate::ast::Expr;
use crate::function::Function;
use crate::view::EvalContext;

/// A compiled primary of a boolean expression.
#[derive(Clone, Debug, PartialEq)]
pub enum BoolPrimary {
    /// The status of the condition at rule-local `index`.
    Cond {
        /// Rule-local condition index.
        index: usize,
        /// Whether the status is inverted.
        negated: bool,
    },
    /// A nested expression.
    Group {
        /// The nested expression.
        expr: BooleanExpr,
        /// Whether the result is inverted.
        negated: bool,
    },
    /// A function over the condition at rule-local `index`.
    Call {
        /// Rule-local condition index.
        index: usize,
        /// The function, with its running state.
        function: Function,
        /// Optional comparison against a literal.
        compare: Option<(CompareOp, Value)>,
    },
}

impl BoolPrimary {
    fn evaluate(
        &mut self,
        value: &DomainVector,
        alarm: &mut DomainVector,
        domain: &DomainVector,
        ctx: &EvalContext<'_>,
    ) -> Result<bool> {
        match self {
            Self::Group { expr, negated } => {
                Ok(expr.evaluate(value, alarm, domain, ctx) != *negated)
            }
            Self::Cond { index, negated } => {
                let index = *index;
                let pair = value
                    .get(index)
                    .ok_or_else(|| Error::size_mismatch(value.len(), index + 1))?;
                let entry = slot(alarm, index)?;
                if entry.is_null() {
                    *entry = pair;
                }
                let condition = ctx.condition(index)?;
                let on = match (pair.source.index(), pair.target.index()) {
                    (Some(s), Some(t)) => condition.hitmap().status(s, t),
                    _ => false,
                };
                Ok(on != *negated)
            }
            Self::Call {
                index,
                function,
                compare,
            } => {
                let index = *index;
                let condition = ctx.condition(index)?;
                let scope = domain
                    .get(index)
                    .ok_or_else(|| Error::size_mismatch(domain.len(), index + 1))?;
                *slot(alarm, index)? = if function.grouped_alarm() {
                    scope
                } else {
                    condition.last_location()
                };

                let result = function.evaluate(condition, scope, ctx.participants)?;
                match compare {
                    Some((op, rhs)) => op.apply(&result, rhs),
                    None => result
                        .as_bool()
                        .ok_or_else(|| Error::type_mismatch(ValueKind::Bool, result.kind())),
                }
            }
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Cond { .. } => {}
            Self::Group { expr, .. } => expr.reset(),
            Self::Call { function, .. } => function.reset(),
        }
    }
}

fn slot(alarm: &mut DomainVector, index: usize) -> Result<&mut DomainPair> {
    let len = alarm.len();
    alarm
        .get_mut(index)
        .ok_or_else(|| Error::size_mismatch(len, index + 1))
}

/// A compiled `OR[ AND[ BoolPrimary ] ]` expression.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct BooleanExpr {
    expr: Expr<BoolPrimary>,
}

impl BooleanExpr {
    /// Wraps a compiled tree.
    #[must_use]
    pub fn new(expr: Expr<BoolPrimary>) -> Self {
        Self { expr }
    }

    /// The compiled tree.
    #[must_use]
    pub fn tree(&self) -> &Expr<BoolPrimary> {
        &self.expr
    }

    /// Evaluates at the concrete assignment `value`.
    ///
    /// `domain` is the candidate domain vector `value` was drawn from;
    /// grouped functions evaluate over it. A primary that fails is logged
    /// and counts as false.
    pub fn evaluate(
        &mut self,
        value: &DomainVector,
        alarm: &mut DomainVector,
        domain: &DomainVector,
        ctx: &EvalContext<'_>,
    ) -> bool {
        for conjunction in &mut self.expr.any_of {
            let mut all = true;
            for primary in conjunction.iter_mut() {
                let ok = primary
                    .evaluate(value, alarm, domain, ctx)
                    .unwrap_or_else(|error| {
                        if error.is_invariant_violation() {
                            tracing::error!(rule = ctx.rule, %error, "boolean primary broke an invariant");
                            debug_assert!(false, "boolean primary broke an invariant: {error}");
                        } else {
                            tracing::warn!(rule = ctx.rule, %error, "boolean primary failed, treating as false");
                        }
                        false
                    });
                if !ok {
                    all = false;
                    break;
                }
            }
            if all {
                return true;
            }
        }
        false
    }

    /// Clears the running state of every function in the tree.
    pub fn reset(&mut self) {
        for primary in self.expr.any_of.iter_mut().flatten() {
            primary.reset();
        }
    }
}
