//! Compilation of name-based trees into evaluable expressions.
//!
//! A rule refers to conditions by name. Compiling assigns each referenced
//! condition a rule-local index in order of first reference in the boolean
//! expression; the domain clause and the alarm template may only name
//! conditions the boolean expression already references.

use std::collections::HashMap;

use alarmist_foundation::{
    Axis, CompareOp, ConditionId, Error, NameKind, Result, Value, ValueKind, push_unique,
};

use crate::ast::{
    BoolAst, BoolPrimaryAst, DomainAst, DomainPrimaryAst, Expr, TestAst, TestPrimaryAst,
};
use crate::boolean::{BoolPrimary, BooleanExpr};
use crate::domain_expr::{DomainExpr, DomainPrimary};
use crate::function::{Function, TestFunction};
use crate::template::AlarmTemplate;
use crate::test_expr::{TestExpr, TestPrimary};

// =============================================================================
// Condition references
// =============================================================================

/// The conditions a rule references, in first-reference order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionRefs {
    ids: Vec<ConditionId>,
    names: Vec<String>,
    primitive: Vec<bool>,
}

impl ConditionRefs {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of referenced conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if no condition is referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Registry handles in rule-local order.
    #[must_use]
    pub fn ids(&self) -> &[ConditionId] {
        &self.ids
    }

    /// Names in rule-local order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Rule-local index of a condition name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// True if the condition at `index` is referenced directly, not only
    /// through a function. Enumeration iterates cells of primitive
    /// conditions only.
    #[must_use]
    pub fn is_primitive(&self, index: usize) -> bool {
        self.primitive.get(index).copied().unwrap_or(false)
    }

    fn insert(
        &mut self,
        name: &str,
        primitive: bool,
        registry: &HashMap<String, ConditionId>,
    ) -> Result<usize> {
        if let Some(index) = self.index_of(name) {
            self.primitive[index] |= primitive;
            return Ok(index);
        }
        let id = *registry
            .get(name)
            .ok_or_else(|| Error::unknown_name(NameKind::Condition, name))?;
        self.ids.push(id);
        self.names.push(name.to_string());
        self.primitive.push(primitive);
        Ok(self.ids.len() - 1)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| Error::unknown_name(NameKind::Condition, name))
    }
}

// =============================================================================
// Compiled rule
// =============================================================================

/// Everything a rule needs at runtime, with names resolved.
#[derive(Clone, Debug)]
pub struct CompiledRule {
    /// Referenced conditions.
    pub conditions: ConditionRefs,
    /// The boolean expression over rule-local indices.
    pub expr: BooleanExpr,
    /// The domain clause, if the rule has one.
    pub domain: Option<DomainExpr>,
    /// The alarm message template.
    pub template: AlarmTemplate,
    /// Conditions whose new sources require recomputing the domain.
    pub notify_source: Vec<usize>,
    /// Conditions whose new targets require recomputing the domain.
    pub notify_target: Vec<usize>,
}

// =============================================================================
// Compiler
// =============================================================================

/// Resolves names and validates rule and condition-test trees.
pub struct RuleCompiler;

impl RuleCompiler {
    /// Compiles a rule.
    ///
    /// `registry` maps every known condition name to its handle.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for unknown conditions or functions, or for
    /// domain and template references to conditions the boolean expression
    /// does not use; `ParseError` for empty expressions and malformed
    /// templates; `TypeMismatch` when a comparison literal does not match
    /// its function's result.
    pub fn compile(
        expr: &BoolAst,
        domain: Option<&DomainAst>,
        template: &str,
        registry: &HashMap<String, ConditionId>,
    ) -> Result<CompiledRule> {
        let mut conditions = ConditionRefs::new();
        let expr = Self::compile_bool(expr, &mut conditions, registry)?;

        let mut notify_source = Vec::new();
        let mut notify_target = Vec::new();
        let domain = match domain {
            Some(ast) if !ast.is_empty() => Some(Self::compile_domain(
                ast,
                &conditions,
                &mut notify_source,
                &mut notify_target,
            )?),
            _ => None,
        };

        let template = AlarmTemplate::parse(template, |name| conditions.index_of(name))?;

        Ok(CompiledRule {
            conditions,
            expr,
            domain,
            template,
            notify_source,
            notify_target,
        })
    }

    /// Compiles a condition's post-match test.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for unknown test functions, `ParseError` for
    /// rejected arguments or an uncompared non-boolean call, and
    /// `TypeMismatch` when a comparison literal does not match.
    pub fn compile_test(test: &TestAst) -> Result<TestExpr> {
        Self::compile_dnf(test, "condition test", |primary| match primary {
            TestPrimaryAst::Group(inner) => Ok(TestPrimary::Group(Self::compile_test(inner)?)),
            TestPrimaryAst::Call {
                function,
                args,
                compare,
            } => {
                let compiled = TestFunction::from_call(function, args)?;
                Self::check_compare(function, compiled.result_kind(), compare.as_ref())?;
                Ok(TestPrimary::Call {
                    function: compiled,
                    compare: compare.clone(),
                })
            }
        })
        .map(TestExpr::new)
    }

    fn compile_bool(
        expr: &BoolAst,
        conditions: &mut ConditionRefs,
        registry: &HashMap<String, ConditionId>,
    ) -> Result<BooleanExpr> {
        Self::compile_dnf(expr, "boolean expression", |primary| match primary {
            BoolPrimaryAst::Cond { name, negated } => Ok(BoolPrimary::Cond {
                index: conditions.insert(name, true, registry)?,
                negated: *negated,
            }),
            BoolPrimaryAst::Group { expr, negated } => Ok(BoolPrimary::Group {
                expr: Self::compile_bool(expr, conditions, registry)?,
                negated: *negated,
            }),
            BoolPrimaryAst::Call {
                function,
                condition,
                args,
                compare,
            } => {
                let compiled = Function::from_call(function, args)?;
                Self::check_compare(function, compiled.result_kind(), compare.as_ref())?;
                Ok(BoolPrimary::Call {
                    index: conditions.insert(condition, false, registry)?,
                    function: compiled,
                    compare: compare.clone(),
                })
            }
        })
        .map(BooleanExpr::new)
    }

    fn compile_domain(
        expr: &DomainAst,
        conditions: &ConditionRefs,
        notify_source: &mut Vec<usize>,
        notify_target: &mut Vec<usize>,
    ) -> Result<DomainExpr> {
        Self::compile_dnf(expr, "domain clause", |primary| match primary {
            DomainPrimaryAst::Group(inner) => Ok(DomainPrimary::Group(Self::compile_domain(
                inner,
                conditions,
                notify_source,
                notify_target,
            )?)),
            DomainPrimaryAst::Link { refs, literal } => {
                if refs.is_empty() {
                    return Err(Error::parse("domain link names no condition", "WHERE"));
                }
                let mut resolved = Vec::with_capacity(refs.len());
                for (name, axis) in refs {
                    let index = conditions.require(name)?;
                    match axis {
                        Axis::Source => push_unique(notify_source, index),
                        Axis::Target => push_unique(notify_target, index),
                    }
                    resolved.push((index, *axis));
                }
                Ok(DomainPrimary::Link {
                    refs: resolved,
                    literal: literal.clone(),
                })
            }
        })
        .map(DomainExpr::new)
    }

    /// Maps every primary of a DNF tree, rejecting empty alternatives.
    fn compile_dnf<A, P>(
        expr: &Expr<A>,
        what: &str,
        mut compile: impl FnMut(&A) -> Result<P>,
    ) -> Result<Expr<P>> {
        if expr.is_empty() {
            return Err(Error::parse(format!("empty {what}"), what));
        }
        let mut any_of = Vec::with_capacity(expr.any_of.len());
        for conjunction in &expr.any_of {
            if conjunction.is_empty() {
                return Err(Error::parse(format!("empty conjunction in {what}"), what));
            }
            any_of.push(
                conjunction
                    .iter()
                    .map(&mut compile)
                    .collect::<Result<Vec<_>>>()?,
            );
        }
        Ok(Expr { any_of })
    }

    fn check_compare(
        function: &str,
        result: ValueKind,
        compare: Option<&(CompareOp, Value)>,
    ) -> Result<()> {
        match compare {
            None if result == ValueKind::Bool => Ok(()),
            None => Err(Error::parse(
                format!("{function} returns a {result} and must be compared"),
                function,
            )),
            Some((_, rhs)) if rhs.kind() != result => {
                Err(Error::type_mismatch(result, rhs.kind()))
            }
            Some((op, _)) if result == ValueKind::Bool && !matches!(op, CompareOp::Eq | CompareOp::Ne) => {
                Err(Error::invalid_operation(format!(
                    "{function} returns a bool, which only supports == and !="
                )))
            }
            Some(_) => Ok(()),
        }
    }
}
