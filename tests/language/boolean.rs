//! Integration tests for boolean expression evaluation

use alarmist_foundation::{CompareOp, DomainPair, DomainVector, Selector};
use alarmist_language::{BoolAst, BoolPrimaryAst, EvalContext, Participants, RuleCompiler};

use crate::support::{Stub, registry, views};

fn at(pairs: &[(usize, usize)]) -> DomainVector {
    pairs.iter().map(|&(s, t)| DomainPair::at(s, t)).collect()
}

#[test]
fn conditions_record_the_visited_cell() {
    let stubs = [
        Stub::new("disk", true, false).hit("a", "", &[]).hit("b", "", &[]),
        Stub::new("link", false, false),
    ];
    let expr = BoolAst::all(vec![BoolPrimaryAst::cond("disk"), BoolPrimaryAst::not_cond("link")]);
    let mut compiled = RuleCompiler::compile(&expr, None, "", &registry(&["disk", "link"])).unwrap();
    let views = views(&stubs);
    let participants = Participants::new();
    let ctx = EvalContext::new("r", &views, &participants);

    let mut alarm = DomainVector::nulls(2);
    let fired = compiled
        .expr
        .evaluate(&at(&[(1, 0), (0, 0)]), &mut alarm, &DomainVector::any(2), &ctx);

    assert!(fired);
    assert_eq!(alarm, at(&[(1, 0), (0, 0)]));
}

#[test]
fn or_short_circuits_left_to_right() {
    let stubs = [
        Stub::new("c1", false, false).hit("a", "", &[]),
        Stub::new("c2", false, false).hit("a", "", &[]),
    ];
    let expr = BoolAst::cond("c1").or_all(vec![BoolPrimaryAst::cond("c2")]);
    let mut compiled = RuleCompiler::compile(&expr, None, "", &registry(&["c1", "c2"])).unwrap();
    let views = views(&stubs);
    let participants = Participants::new();
    let ctx = EvalContext::new("r", &views, &participants);

    let mut alarm = DomainVector::nulls(2);
    assert!(compiled.expr.evaluate(&at(&[(0, 0), (0, 0)]), &mut alarm, &DomainVector::any(2), &ctx));
    // The second alternative was never looked at.
    assert!(alarm[1].is_null());
    assert_eq!(alarm[0], DomainPair::at(0, 0));
}

#[test]
fn negated_groups_invert_their_result() {
    let stubs = [
        Stub::new("c1", false, false).hit("a", "", &[]),
        Stub::new("c2", false, false),
    ];
    let inner = BoolAst::all(vec![BoolPrimaryAst::cond("c1"), BoolPrimaryAst::cond("c2")]);
    let expr = BoolAst::single(BoolPrimaryAst::not_group(inner));
    let mut compiled = RuleCompiler::compile(&expr, None, "", &registry(&["c1", "c2"])).unwrap();
    let views = views(&stubs);
    let participants = Participants::new();
    let ctx = EvalContext::new("r", &views, &participants);

    let mut alarm = DomainVector::nulls(2);
    assert!(compiled.expr.evaluate(&at(&[(0, 0), (0, 0)]), &mut alarm, &DomainVector::any(2), &ctx));
}

#[test]
fn grouped_functions_alarm_on_their_scope() {
    let stubs = [Stub::new("c1", true, false)
        .hit("a", "", &[])
        .hit("b", "", &[])
        .hit("c", "", &[])];
    let expr = BoolAst::single(
        BoolPrimaryAst::call("count", "c1", vec!["SOURCE".into()]).compared(CompareOp::Ge, 3.0),
    );
    let mut compiled = RuleCompiler::compile(&expr, None, "", &registry(&["c1"])).unwrap();
    let views = views(&stubs);
    let participants = Participants::new();
    let ctx = EvalContext::new("r", &views, &participants);

    let scope = DomainVector::any(1);
    let mut alarm = DomainVector::nulls(1);
    assert!(compiled.expr.evaluate(&scope, &mut alarm, &scope, &ctx));
    assert_eq!(alarm, scope);

    let narrow: DomainVector = vec![DomainPair::new(Selector::At(0), Selector::Any)].into();
    let mut alarm = DomainVector::nulls(1);
    assert!(!compiled.expr.evaluate(&narrow, &mut alarm, &narrow, &ctx));
}

#[test]
fn sync_checks_alarm_on_the_latest_message() {
    let stubs = [Stub::new("clock", true, false)
        .hit("a", "", &["ts", "100"])
        .hit("b", "", &["ts", "200"])];
    let expr = BoolAst::single(BoolPrimaryAst::call("is_syncd", "clock", vec![]));
    let mut compiled = RuleCompiler::compile(&expr, None, "", &registry(&["clock"])).unwrap();
    let views = views(&stubs);
    let participants = Participants::new();
    let ctx = EvalContext::new("r", &views, &participants);

    let scope = DomainVector::any(1);
    let mut alarm = DomainVector::nulls(1);
    // A single report starts a round and is never out of sync.
    assert!(!compiled.expr.evaluate(&scope, &mut alarm, &scope, &ctx));
    assert_eq!(alarm, at(&[(1, 0)]));
}

#[test]
fn failing_functions_count_as_false() {
    let stubs = [Stub::new("c1", true, false).hit("a", "", &[])];
    let expr = BoolAst::single(
        BoolPrimaryAst::call("count_percent", "c1", vec!["SOURCE".into(), "nodes".into()])
            .compared(CompareOp::Gt, 0.0),
    );
    let mut compiled = RuleCompiler::compile(&expr, None, "", &registry(&["c1"])).unwrap();
    let views = views(&stubs);
    let participants = Participants::new();
    let ctx = EvalContext::new("r", &views, &participants);

    let scope = DomainVector::any(1);
    let mut alarm = DomainVector::nulls(1);
    assert!(!compiled.expr.evaluate(&scope, &mut alarm, &scope, &ctx));
}
