//! Integration tests for the rule compiler

use alarmist_foundation::{Axis, CompareOp, ErrorKind, MatchFields, NameKind, Value};
use alarmist_language::{
    BoolAst, BoolPrimaryAst, DomainAst, DomainPrimaryAst, RuleCompiler, TestAst, TestPrimaryAst,
};

use crate::support::registry;

#[test]
fn conditions_are_indexed_by_first_reference() {
    let expr = BoolAst::all(vec![BoolPrimaryAst::cond("c2"), BoolPrimaryAst::not_cond("c1")])
        .or_all(vec![
            BoolPrimaryAst::call("count", "c3", vec![]).compared(CompareOp::Gt, 2.0),
            BoolPrimaryAst::cond("c2"),
        ]);
    let compiled =
        RuleCompiler::compile(&expr, None, "", &registry(&["c1", "c2", "c3"])).unwrap();

    assert_eq!(compiled.conditions.names(), ["c2", "c1", "c3"]);
    assert_eq!(compiled.conditions.ids()[0].index(), 1);
    assert!(compiled.conditions.is_primitive(0));
    assert!(!compiled.conditions.is_primitive(2));
    assert!(compiled.domain.is_none());
}

#[test]
fn domain_links_feed_the_notify_lists() {
    let expr = BoolAst::all(vec![BoolPrimaryAst::cond("c1"), BoolPrimaryAst::cond("c2")]);
    let domain = DomainAst::single(DomainPrimaryAst::link([
        ("c1", Axis::Source),
        ("c2", Axis::Target),
    ]));
    let compiled =
        RuleCompiler::compile(&expr, Some(&domain), "", &registry(&["c1", "c2"])).unwrap();

    assert!(compiled.domain.is_some());
    assert_eq!(compiled.notify_source, vec![0]);
    assert_eq!(compiled.notify_target, vec![1]);
}

#[test]
fn names_outside_the_expression_are_rejected() {
    let reg = registry(&["c1", "c2"]);
    let expr = BoolAst::cond("c1");

    let err = RuleCompiler::compile(&BoolAst::cond("c9"), None, "", &reg).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownName { kind: NameKind::Condition, .. }));

    let domain = DomainAst::single(DomainPrimaryAst::link([("c2", Axis::Source)]));
    let err = RuleCompiler::compile(&expr, Some(&domain), "", &reg).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownName { .. }));

    let err = RuleCompiler::compile(&expr, None, "${c2.$s} down", &reg).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownName { .. }));
}

#[test]
fn function_calls_are_checked() {
    let reg = registry(&["c1"]);
    let compile = |primary| RuleCompiler::compile(&BoolAst::single(primary), None, "", &reg);

    let err = compile(BoolPrimaryAst::call("count", "c1", vec![])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));

    let err = compile(BoolPrimaryAst::call("count", "c1", vec![]).compared(CompareOp::Eq, "x"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));

    let err = compile(BoolPrimaryAst::call("nope", "c1", vec![])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownName { kind: NameKind::Function, .. }));

    let err = compile(BoolPrimaryAst::call("is_syncd", "c1", vec![]).compared(CompareOp::Lt, true))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidOperation(_)));

    assert!(compile(BoolPrimaryAst::call("is_syncd", "c1", vec![])).is_ok());
    assert!(
        compile(
            BoolPrimaryAst::call("count", "c1", vec![Value::from("SOURCE")])
                .compared(CompareOp::Ge, 3.0)
        )
        .is_ok()
    );
}

#[test]
fn empty_expressions_are_parse_errors() {
    let err = RuleCompiler::compile(&BoolAst::new(), None, "", &registry(&[])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));
}

#[test]
fn condition_tests_compile_and_evaluate() {
    let test = TestAst::single(TestPrimaryAst::compare(
        "grp_to_number",
        vec![Value::from(1.0)],
        CompareOp::Gt,
        100.0,
    ))
    .or_all(vec![TestPrimaryAst::compare(
        "grp",
        vec![Value::from(2.0)],
        CompareOp::Eq,
        "forced",
    )]);
    let compiled = RuleCompiler::compile_test(&test).unwrap();

    let fields = |groups: &[&str]| MatchFields {
        groups: groups.iter().map(|g| (*g).to_string()).collect(),
        ..MatchFields::new()
    };
    assert!(compiled.evaluate(&fields(&["t=0x80", "0x80", ""])));
    assert!(!compiled.evaluate(&fields(&["t=12", "12", ""])));
    assert!(compiled.evaluate(&fields(&["t=12", "12", "forced"])));
    // Missing groups fail the primary, not the whole test.
    assert!(!compiled.evaluate(&fields(&[])));

    let err = RuleCompiler::compile_test(&TestAst::single(TestPrimaryAst::Call {
        function: "grp".into(),
        args: vec![Value::from(1.0)],
        compare: None,
    }))
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));
}
