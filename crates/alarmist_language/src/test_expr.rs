//! Compiled condition tests.
//!
//! A test runs after a condition's patterns matched and decides whether the
//! message counts. An empty test always passes.

use alarmist_foundation::{CompareOp, Error, MatchFields, Result, Value, ValueKind};

use crate::ast::Expr;
use crate::function::TestFunction;

/// A compiled primary of a condition test.
#[derive(Clone, Debug, PartialEq)]
pub enum TestPrimary {
    /// A nested test.
    Group(TestExpr),
    /// A test function, optionally compared against a literal.
    Call {
        /// The function.
        function: TestFunction,
        /// Optional comparison against a literal.
        compare: Option<(CompareOp, Value)>,
    },
}

impl TestPrimary {
    fn evaluate(&self, fields: &MatchFields) -> Result<bool> {
        match self {
            Self::Group(expr) => Ok(expr.evaluate(fields)),
            Self::Call { function, compare } => {
                let result = function.evaluate(fields)?;
                match compare {
                    Some((op, rhs)) => op.apply(&result, rhs),
                    None => result
                        .as_bool()
                        .ok_or_else(|| Error::type_mismatch(ValueKind::Bool, result.kind())),
                }
            }
        }
    }
}

/// A compiled `OR[ AND[ TestPrimary ] ]` test.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TestExpr {
    expr: Expr<TestPrimary>,
}

impl TestExpr {
    /// Wraps a compiled tree.
    #[must_use]
    pub fn new(expr: Expr<TestPrimary>) -> Self {
        Self { expr }
    }

    /// True if the test has no alternatives and so always passes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    /// Evaluates against the fields of the message being matched.
    ///
    /// A primary that fails, e.g. on a group that is not a number, is
    /// logged and counts as false.
    #[must_use]
    pub fn evaluate(&self, fields: &MatchFields) -> bool {
        if self.expr.is_empty() {
            return true;
        }
        self.expr.any_of.iter().any(|conjunction| {
            conjunction.iter().all(|primary| {
                primary.evaluate(fields).unwrap_or_else(|error| {
                    tracing::debug!(%error, source = %fields.source, "condition test failed");
                    false
                })
            })
        })
    }
}
