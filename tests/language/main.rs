//! Integration tests for Layer 2: Language
//!
//! Tests for the rule compiler, boolean and domain evaluation, functions,
//! participants, and alarm templates.


mod boolean;
mod compiler;
mod domains;
