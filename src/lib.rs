//! Alarmist - Rule-based alarm and correlation engine
//!
//! This crate re-exports all layers of the Alarmist system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: alarmist_engine    : Conditions, rules, rule engine, shared engine
//! Layer 2: alarmist_language  : Expression trees, compiler, functions, templates
//! Layer 1: alarmist_storage   : Window cells, hitmaps, timing queue
//! Layer 0: alarmist_foundation: Domain algebra, messages, values, errors
//! ```

pub use alarmist_engine as engine;
pub use alarmist_foundation as foundation;
pub use alarmist_language as language;
pub use alarmist_storage as storage;
