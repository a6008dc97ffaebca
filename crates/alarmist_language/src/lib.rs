//! Expression trees, compiler, and evaluators for Alarmist rules.
//!
//! This crate provides:
//! - [`ast`] - Name-based trees as produced by an external parser
//! - [`RuleCompiler`] - Name resolution and validation into evaluable forms
//! - [`BooleanExpr`], [`DomainExpr`], [`TestExpr`] - The evaluators
//! - [`Function`] and [`TestFunction`] - Built-in functions
//! - [`Participants`] - Participant groups for ratio functions
//! - [`AlarmTemplate`] - Alarm message rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod boolean;
pub mod compiler;
pub mod domain_expr;
pub mod function;
pub mod participants;
pub mod template;
pub mod test_expr;
pub mod view;

#[cfg(test)]
mod testing;

pub use ast::{
    BoolAst, BoolPrimaryAst, DomainAst, DomainPrimaryAst, Expr, TestAst, TestPrimaryAst,
};
pub use boolean::{BoolPrimary, BooleanExpr};
pub use compiler::{CompiledRule, ConditionRefs, RuleCompiler};
pub use domain_expr::{DomainExpr, DomainPrimary};
pub use function::{Function, SyncState, TestFunction};
pub use participants::Participants;
pub use template::{AlarmTemplate, Placeholder};
pub use test_expr::{TestExpr, TestPrimary};
pub use view::{ConditionView, EvalContext};
