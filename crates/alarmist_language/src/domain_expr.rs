//! Compiled domain ("WHERE") clauses.
//!
//! Evaluating a clause turns the names each condition has seen into a
//! [`DomainSet`] of candidate assignments for the rule. Alternatives of the
//! OR append their sets; primaries of an AND are merged by Cartesian
//! intersection, and an empty intermediate result empties the whole AND.

use alarmist_foundation::{Axis, DomainPair, DomainSet, DomainVector, Error, Result, Selector};

use crate::ast::Expr;
use crate::view::EvalContext;

/// A compiled primary of a domain clause.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainPrimary {
    /// Linked axes of conditions, optionally pinned to a literal name.
    Link {
        /// Rule-local condition index and axis, in written order.
        refs: Vec<(usize, Axis)>,
        /// Literal every linked axis must equal.
        literal: Option<String>,
    },
    /// A nested clause.
    Group(DomainExpr),
}

fn on_axis(axis: Axis, selector: Selector) -> DomainPair {
    let mut pair = DomainPair::any();
    pair.set(axis, selector);
    pair
}

/// Narrows `domain[index]` to `selector` on `axis`. False if it became null.
fn narrow(domain: &mut DomainVector, index: usize, axis: Axis, selector: Selector) -> Result<bool> {
    let len = domain.len();
    let pair = domain
        .get_mut(index)
        .ok_or_else(|| Error::size_mismatch(len, index + 1))?;
    *pair = pair.intersect(on_axis(axis, selector));
    Ok(!pair.is_null())
}

impl DomainPrimary {
    fn worksheet(&self, ctx: &EvalContext<'_>) -> Result<DomainSet> {
        match self {
            Self::Group(expr) => expr.evaluate(ctx),
            Self::Link {
                refs,
                literal: Some(literal),
            } => {
                let mut domain = DomainVector::any(ctx.width());
                for &(index, axis) in refs {
                    let found = ctx.condition(index)?.find_arg(literal, axis);
                    if found.is_nil() || !narrow(&mut domain, index, axis, found)? {
                        return Ok(DomainSet::new());
                    }
                }
                Ok(DomainSet::from(vec![domain]))
            }
            Self::Link {
                refs,
                literal: None,
            } => {
                let Some((&(first, first_axis), rest)) = refs.split_first() else {
                    return Err(Error::internal("domain link without conditions"));
                };
                let mut sheet = DomainSet::new();
                let names = ctx.condition(first)?.arg_names(first_axis);
                'names: for (i, name) in names.into_iter().enumerate() {
                    let mut domain = DomainVector::any(ctx.width());
                    narrow(&mut domain, first, first_axis, Selector::At(i))?;
                    for &(index, axis) in rest {
                        let found = ctx.condition(index)?.find_arg(name, axis);
                        if found.is_nil() || !narrow(&mut domain, index, axis, found)? {
                            continue 'names;
                        }
                    }
                    sheet.push(domain);
                    check_size(&sheet, ctx)?;
                }
                Ok(sheet)
            }
        }
    }
}

fn check_size(set: &DomainSet, ctx: &EvalContext<'_>) -> Result<()> {
    if set.len() > ctx.max_combinations {
        return Err(Error::domain_too_large(ctx.max_combinations, ctx.rule));
    }
    Ok(())
}

/// A compiled `OR[ AND[ DomainPrimary ] ]` clause.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DomainExpr {
    expr: Expr<DomainPrimary>,
}

impl DomainExpr {
    /// Wraps a compiled tree.
    #[must_use]
    pub fn new(expr: Expr<DomainPrimary>) -> Self {
        Self { expr }
    }

    /// The compiled tree.
    #[must_use]
    pub fn tree(&self) -> &Expr<DomainPrimary> {
        &self.expr
    }

    /// Computes the candidate domain set.
    ///
    /// # Errors
    ///
    /// Returns `DomainTooLarge` if any intermediate set exceeds the
    /// context's ceiling, and `SizeMismatch` if the clause references
    /// indices outside the rule.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<DomainSet> {
        let mut domains = DomainSet::new();
        for conjunction in &self.expr.any_of {
            domains.extend(Self::evaluate_and(conjunction, ctx)?);
            check_size(&domains, ctx)?;
        }
        Ok(domains)
    }

    fn evaluate_and(primaries: &[DomainPrimary], ctx: &EvalContext<'_>) -> Result<DomainSet> {
        let mut acc: Option<DomainSet> = None;
        for primary in primaries {
            let sheet = primary.worksheet(ctx)?;
            let merged = match acc {
                None => sheet,
                Some(_) if sheet.is_empty() => DomainSet::new(),
                Some(prev) => prev.cross_intersect(&sheet)?,
            };
            if merged.is_empty() {
                return Ok(merged);
            }
            check_size(&merged, ctx)?;
            acc = Some(merged);
        }
        Ok(acc.unwrap_or_default())
    }
}
