//! Name-based expression trees.
//!
//! An external parser turns rule and condition text into these trees. They
//! refer to conditions, functions and test functions by name; the
//! [`compiler`](crate::compiler) resolves the names and produces the
//! evaluable forms.
//!
//! Every expression has the same disjunctive normal shape: an OR of ANDs of
//! primaries, captured by [`Expr`].

use alarmist_foundation::{Axis, CompareOp, Value};

// =============================================================================
// Expr
// =============================================================================

/// `OR[ AND[ P ] ]` over some primary type `P`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr<P> {
    /// Alternatives; each is a conjunction of primaries.
    pub any_of: Vec<Vec<P>>,
}

impl<P> Expr<P> {
    /// The empty expression.
    #[must_use]
    pub fn new() -> Self {
        Self { any_of: Vec::new() }
    }

    /// An expression of a single primary.
    #[must_use]
    pub fn single(primary: P) -> Self {
        Self {
            any_of: vec![vec![primary]],
        }
    }

    /// A single conjunction.
    #[must_use]
    pub fn all(primaries: Vec<P>) -> Self {
        Self {
            any_of: vec![primaries],
        }
    }

    /// Adds a conjunction as a further alternative.
    #[must_use]
    pub fn or_all(mut self, primaries: Vec<P>) -> Self {
        self.any_of.push(primaries);
        self
    }

    /// True if there are no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty()
    }

    /// Iterates over every primary in every alternative.
    pub fn primaries(&self) -> impl Iterator<Item = &P> {
        self.any_of.iter().flatten()
    }
}

impl<P> Default for Expr<P> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Boolean expressions
// =============================================================================

/// A rule's boolean expression.
pub type BoolAst = Expr<BoolPrimaryAst>;

/// A primary of a rule's boolean expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoolPrimaryAst {
    /// The on/off state of a condition: `c1` or `!c1`.
    Cond {
        /// Condition name.
        name: String,
        /// Whether the state is inverted.
        negated: bool,
    },
    /// A parenthesized sub-expression: `(..)` or `!(..)`.
    Group {
        /// The nested expression.
        expr: BoolAst,
        /// Whether the result is inverted.
        negated: bool,
    },
    /// A function over a condition: `count(c1, 'SOURCE') > 3`.
    Call {
        /// Function name.
        function: String,
        /// The condition the function reads.
        condition: String,
        /// Literal arguments after the condition.
        args: Vec<Value>,
        /// Optional comparison against a literal.
        compare: Option<(CompareOp, Value)>,
    },
}

impl BoolPrimaryAst {
    /// A plain condition reference.
    #[must_use]
    pub fn cond(name: impl Into<String>) -> Self {
        Self::Cond {
            name: name.into(),
            negated: false,
        }
    }

    /// A negated condition reference.
    #[must_use]
    pub fn not_cond(name: impl Into<String>) -> Self {
        Self::Cond {
            name: name.into(),
            negated: true,
        }
    }

    /// A parenthesized sub-expression.
    #[must_use]
    pub fn group(expr: BoolAst) -> Self {
        Self::Group {
            expr,
            negated: false,
        }
    }

    /// A negated sub-expression.
    #[must_use]
    pub fn not_group(expr: BoolAst) -> Self {
        Self::Group {
            expr,
            negated: true,
        }
    }

    /// A function call with no comparison.
    #[must_use]
    pub fn call(function: impl Into<String>, condition: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Call {
            function: function.into(),
            condition: condition.into(),
            args,
            compare: None,
        }
    }

    /// Adds a comparison to a function call. Other primaries are unchanged.
    #[must_use]
    pub fn compared(self, op: CompareOp, rhs: impl Into<Value>) -> Self {
        match self {
            Self::Call {
                function,
                condition,
                args,
                ..
            } => Self::Call {
                function,
                condition,
                args,
                compare: Some((op, rhs.into())),
            },
            other => other,
        }
    }
}

impl BoolAst {
    /// Shorthand for an expression that is a single condition reference.
    #[must_use]
    pub fn cond(name: impl Into<String>) -> Self {
        Self::single(BoolPrimaryAst::cond(name))
    }
}

// =============================================================================
// Domain expressions
// =============================================================================

/// A rule's domain ("WHERE") clause.
pub type DomainAst = Expr<DomainPrimaryAst>;

/// A primary of a domain clause.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DomainPrimaryAst {
    /// `c1.$s = c2.$t (= 'literal')?`
    Link {
        /// Linked condition axes, in written order.
        refs: Vec<(String, Axis)>,
        /// Optional literal every linked axis must equal.
        literal: Option<String>,
    },
    /// A parenthesized sub-clause.
    Group(DomainAst),
}

impl DomainPrimaryAst {
    /// Links condition axes to each other.
    #[must_use]
    pub fn link<S: Into<String>>(refs: impl IntoIterator<Item = (S, Axis)>) -> Self {
        Self::Link {
            refs: refs.into_iter().map(|(n, a)| (n.into(), a)).collect(),
            literal: None,
        }
    }

    /// Pins condition axes to a literal name.
    #[must_use]
    pub fn pinned<S: Into<String>>(
        refs: impl IntoIterator<Item = (S, Axis)>,
        literal: impl Into<String>,
    ) -> Self {
        Self::Link {
            refs: refs.into_iter().map(|(n, a)| (n.into(), a)).collect(),
            literal: Some(literal.into()),
        }
    }
}

// =============================================================================
// Condition test expressions
// =============================================================================

/// A condition's post-match test.
pub type TestAst = Expr<TestPrimaryAst>;

/// A primary of a condition test.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestPrimaryAst {
    /// A parenthesized sub-test.
    Group(TestAst),
    /// A test function call: `grp_to_number(1) > 100`.
    Call {
        /// Test function name.
        function: String,
        /// Literal arguments.
        args: Vec<Value>,
        /// Optional comparison against a literal.
        compare: Option<(CompareOp, Value)>,
    },
}

impl TestPrimaryAst {
    /// A test function call compared against a literal.
    #[must_use]
    pub fn compare(
        function: impl Into<String>,
        args: Vec<Value>,
        op: CompareOp,
        rhs: impl Into<Value>,
    ) -> Self {
        Self::Call {
            function: function.into(),
            args,
            compare: Some((op, rhs.into())),
        }
    }
}
