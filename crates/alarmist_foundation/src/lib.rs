//! Core types for Alarmist: the domain algebra, messages, values and errors.
//!
//! This crate provides:
//! - [`Selector`], [`DomainPair`], [`DomainVector`], [`DomainSet`] - The
//!   (source, target) domain algebra shared by hitmaps and rules
//! - [`Message`] and [`Severity`] - The input stream's record type
//! - [`Value`] and [`CompareOp`] - Scalars produced by functions and tests
//! - [`ConditionId`] and [`RuleId`] - Stable registry handles
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod domain;
pub mod error;
pub mod ids;
pub mod message;
pub mod value;

pub use domain::{Axis, DomainPair, DomainSet, DomainVector, Selector, union_pair};
pub use error::{Error, ErrorContext, ErrorKind, NameKind, Result, SemanticLimit};
pub use ids::{ConditionId, RuleId, merge_unique, push_unique};
pub use message::{MatchFields, Message, Severity};
pub use value::{CompareOp, Value, ValueKind};
