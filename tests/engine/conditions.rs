//! Integration tests for condition filtering and capture

use alarmist_engine::{Condition, ConditionConfig};
use alarmist_foundation::{
    Axis, CompareOp, ConditionId, DomainPair, ErrorKind, Message, Selector, Severity, Value,
};
use alarmist_language::{ConditionView, TestAst, TestPrimaryAst};
use alarmist_storage::{ChangeFlags, Occurrence};

fn condition(config: ConditionConfig) -> Condition {
    Condition::new(ConditionId::new(0), &config).unwrap()
}

fn msg(severity: Severity, source: &str, body: &str) -> Message {
    Message::new(severity, source, body).at_seconds(10)
}

#[test]
fn filters_screen_severity_source_and_category() {
    let mut c = condition(
        ConditionConfig::new("dcm")
            .with_severity(Severity::Warning)
            .with_sources(["dcm-[0-9]+", "ros"])
            .with_categories(["RUNCONTROL"]),
    );

    let ok = msg(Severity::Error, "dcm-12", "x").with_category("RUNCONTROL");
    assert!(c.match_message(&ok).is_some());

    assert!(c.match_message(&msg(Severity::Info, "dcm-12", "x").with_category("RUNCONTROL")).is_none());
    // Source patterns match the whole name.
    assert!(c.match_message(&msg(Severity::Error, "xdcm-1", "x").with_category("RUNCONTROL")).is_none());
    assert!(c.match_message(&msg(Severity::Error, "ros", "x").with_category("DAQ")).is_none());
    assert_eq!(c.captured_count(), 1);
}

#[test]
fn body_pattern_names_the_target() {
    let mut c = condition(
        ConditionConfig::new("disk")
            .with_pattern(r"disk (\S+) at (\d+)%")
            .with_per_source(true)
            .with_per_target(true),
    );

    let capture = c
        .match_message(&msg(Severity::Error, "host-1", "disk /var at 97%"))
        .unwrap();
    assert!(capture.flags.contains(ChangeFlags::SOURCE | ChangeFlags::TARGET | ChangeFlags::STATUS));
    assert_eq!(c.last_fields().target, "/var");
    assert_eq!(c.last_fields().group(2), Some("97"));
    assert_eq!(c.arg_names(Axis::Target), vec!["/var"]);

    assert!(c.match_message(&msg(Severity::Error, "host-1", "cpu at 97%")).is_none());
    assert_eq!(c.last_location(), DomainPair::at(0, 0));
}

#[test]
fn tests_run_after_the_pattern() {
    let test = TestAst::single(TestPrimaryAst::compare(
        "grp_to_number",
        vec![Value::from(1.0)],
        CompareOp::Ge,
        90.0,
    ));
    let mut c = condition(
        ConditionConfig::new("full")
            .with_pattern(r"at (\d+)%")
            .with_test(test),
    );

    assert!(c.match_message(&msg(Severity::Error, "h", "at 42%")).is_none());
    assert!(c.match_message(&msg(Severity::Error, "h", "at 95%")).is_some());
    assert_eq!(c.captured_count(), 1);
}

#[test]
fn configuration_errors() {
    let build = |config: ConditionConfig| Condition::new(ConditionId::new(0), &config).unwrap_err();

    let err = build(ConditionConfig::new("c").with_occurrence(Occurrence::AtLeast(0)));
    assert!(matches!(err.kind, ErrorKind::InvalidOperation(_)));
    let context = err.context.as_ref().and_then(|c| c.condition.as_deref());
    assert_eq!(context, Some("c"));

    let err = build(ConditionConfig::new("c").with_timespan(-1));
    assert!(matches!(err.kind, ErrorKind::InvalidOperation(_)));

    let err = build(ConditionConfig::new("c").with_per_target(true));
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));

    let err = build(
        ConditionConfig::new("c")
            .with_pattern("(a)")
            .with_per_target(true)
            .with_target_group(2),
    );
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));

    let err = build(ConditionConfig::new("c").with_pattern("(unclosed"));
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));
}

#[test]
fn defined_needs_a_domain_once_several_cells_exist() {
    let mut c = condition(ConditionConfig::new("c").with_per_source(true));
    assert!(!c.get_defined(None).unwrap());

    c.match_message(&msg(Severity::Error, "a", "x"));
    assert!(c.get_defined(None).unwrap());
    c.match_message(&msg(Severity::Error, "b", "x"));
    assert!(c.get_defined(None).is_err());

    assert!(c.get_defined(Some(DomainPair::new(Selector::At(1), Selector::Any))).unwrap());
    assert!(!c.get_defined(Some(DomainPair::null())).unwrap());
}

#[test]
fn facts_force_and_reset() {
    let mut fact = condition(ConditionConfig::fact("power"));
    assert!(!fact.is_parameterized());

    let flags = fact.force(true).unwrap();
    assert!(flags.contains(ChangeFlags::STATUS));
    assert!(fact.status());
    assert!(fact.force(true).unwrap().is_empty());

    fact.reset();
    assert!(!fact.status());
    assert!(!fact.get_defined(None).unwrap());

    let mut hosts = condition(ConditionConfig::new("hosts").with_per_source(true));
    assert!(matches!(
        hosts.force(true).unwrap_err().kind,
        ErrorKind::InvalidOperation(_)
    ));
}
