//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use alarmist_foundation::{
    Error, ErrorContext, ErrorKind, NameKind, SemanticLimit, ValueKind,
};

#[test]
fn parse_error_names_the_input() {
    let err = Error::parse("unterminated placeholder", "${c1.$s");
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("unterminated placeholder"));
    assert!(msg.contains("${c1.$s"));
}

#[test]
fn unknown_name_display() {
    let err = Error::unknown_name(NameKind::ParticipantGroup, "dcm");
    assert_eq!(format!("{err}"), "unknown participant group: dcm");
}

#[test]
fn domain_too_large_is_recoverable() {
    let err = Error::domain_too_large(100, "r1");
    assert!(matches!(err.kind, ErrorKind::DomainTooLarge { limit: 100, .. }));
    assert!(!err.is_invariant_violation());
    assert!(format!("{err}").contains("r1"));
}

#[test]
fn internal_errors_are_invariant_violations() {
    assert!(Error::internal("lost a condition").is_invariant_violation());
    assert!(!Error::type_mismatch(ValueKind::Bool, ValueKind::Number).is_invariant_violation());
}

#[test]
fn chain_depth_limit() {
    let err = Error::limit_exceeded(SemanticLimit::MaxChainDepth {
        limit: 4,
        rule: None,
    });
    assert_eq!(format!("{err}"), "limit exceeded: max chain depth (4) exceeded");
}

#[test]
fn context_travels_with_the_error() {
    let err = Error::invalid_operation("force on a per-source hitmap")
        .with_context(ErrorContext::new().with_condition("c2"));
    let ctx = err.context.as_ref().unwrap();
    assert_eq!(ctx.condition.as_deref(), Some("c2"));
    assert!(ctx.rule.is_none());
    assert_eq!(format!("{ctx}"), "in condition c2");
}
