//! Integration tests for domain clauses

use alarmist_foundation::{Axis, DomainPair, DomainSet, ErrorKind, Result, Selector};
use alarmist_language::{
    BoolAst, BoolPrimaryAst, ConditionView, DomainAst, DomainPrimaryAst, EvalContext, Participants,
    RuleCompiler,
};

use crate::support::{Stub, registry, views};

fn source(s: usize) -> DomainPair {
    DomainPair::new(Selector::At(s), Selector::Any)
}

fn evaluate(stubs: &[Stub], domain: &DomainAst, ceiling: usize) -> Result<DomainSet> {
    let names: Vec<&str> = stubs.iter().map(ConditionView::name).collect();
    let expr = BoolAst::all(names.iter().map(|n| BoolPrimaryAst::cond(*n)).collect());
    let compiled = RuleCompiler::compile(&expr, Some(domain), "", &registry(&names))?;
    let views = views(stubs);
    let participants = Participants::new();
    let ctx = EvalContext::new("r", &views, &participants).with_max_combinations(ceiling);
    compiled.domain.expect("domain clause").evaluate(&ctx)
}

fn hosts(name: &str, sources: &[&str]) -> Stub {
    sources
        .iter()
        .fold(Stub::new(name, true, false), |p, s| p.hit(s, "", &[]))
}

#[test]
fn links_keep_only_shared_names() {
    let stubs = [hosts("disk", &["a", "b"]), hosts("link", &["b", "c"])];
    let domain = DomainAst::single(DomainPrimaryAst::link([
        ("disk", Axis::Source),
        ("link", Axis::Source),
    ]));

    let set = evaluate(&stubs, &domain, 100).unwrap();

    assert_eq!(set.len(), 1);
    let vector = set.iter().next().unwrap();
    assert_eq!(vector[0], source(1));
    assert_eq!(vector[1], source(0));
}

#[test]
fn literals_pin_every_linked_axis() {
    let stubs = [hosts("disk", &["a", "b"]), hosts("link", &["b", "c"])];

    let pinned = DomainAst::single(DomainPrimaryAst::pinned([("disk", Axis::Source)], "b"));
    let set = evaluate(&stubs, &pinned, 100).unwrap();
    assert_eq!(set.len(), 1);
    let vector = set.iter().next().unwrap();
    assert_eq!(vector[0], source(1));
    assert_eq!(vector[1], DomainPair::any());

    let unseen = DomainAst::single(DomainPrimaryAst::pinned([("disk", Axis::Source)], "zzz"));
    assert!(evaluate(&stubs, &unseen, 100).unwrap().is_empty());
}

#[test]
fn alternatives_append_and_conjunctions_intersect() {
    let stubs = [hosts("disk", &["a", "b"]), hosts("link", &["b", "c"])];
    let pin = |name| DomainPrimaryAst::pinned([("disk", Axis::Source)], name);

    let either = DomainAst::single(pin("a")).or_all(vec![pin("b")]);
    assert_eq!(evaluate(&stubs, &either, 100).unwrap().len(), 2);

    let linked_and_pinned = DomainAst::all(vec![
        DomainPrimaryAst::link([("disk", Axis::Source), ("link", Axis::Source)]),
        pin("b"),
    ]);
    assert_eq!(evaluate(&stubs, &linked_and_pinned, 100).unwrap().len(), 1);

    let contradiction = DomainAst::all(vec![pin("a"), pin("b")]);
    assert!(evaluate(&stubs, &contradiction, 100).unwrap().is_empty());
}

#[test]
fn nested_groups_evaluate_as_one_primary() {
    let stubs = [hosts("disk", &["a", "b"]), hosts("link", &["b", "c"])];
    let inner = DomainAst::single(DomainPrimaryAst::pinned([("disk", Axis::Source)], "a"))
        .or_all(vec![DomainPrimaryAst::pinned([("disk", Axis::Source)], "b")]);
    let domain = DomainAst::all(vec![
        DomainPrimaryAst::Group(inner),
        DomainPrimaryAst::pinned([("link", Axis::Source)], "c"),
    ]);

    let set = evaluate(&stubs, &domain, 100).unwrap();

    assert_eq!(set.len(), 2);
    assert!(set.iter().all(|v| v[1] == source(1)));
}

#[test]
fn the_combination_ceiling_is_enforced() {
    let names = ["n0", "n1", "n2", "n3", "n4"];
    let stubs = [hosts("disk", &names), hosts("link", &names)];
    let domain = DomainAst::single(DomainPrimaryAst::link([
        ("disk", Axis::Source),
        ("link", Axis::Source),
    ]));

    assert_eq!(evaluate(&stubs, &domain, 5).unwrap().len(), 5);
    let err = evaluate(&stubs, &domain, 3).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DomainTooLarge { limit: 3, .. }));
}
