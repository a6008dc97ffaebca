//! End-to-end scenarios from message to alarm

use alarmist::engine::{ConditionConfig, EngineConfig, RuleConfig, RuleEngine};
use alarmist::foundation::{Axis, DomainPair, Message, Selector, Severity};
use alarmist::language::{BoolAst, BoolPrimaryAst, ConditionView, DomainAst, DomainPrimaryAst};
use alarmist::storage::Occurrence;

fn msg(source: &str, body: &str, at: i64) -> Message {
    Message::new(Severity::Error, source, body).at_seconds(at)
}

// =============================================================================
// Single condition, single rule
// =============================================================================

#[test]
fn one_matching_message_raises_one_alarm() {
    let mut engine = RuleEngine::build(
        EngineConfig::default(),
        [ConditionConfig::new("c1").with_pattern("ERROR.*disk")],
        [RuleConfig::new("r1", BoolAst::cond("c1")).with_message("disk alarm")],
    )
    .unwrap();

    assert!(engine.feed(&msg("host", "WARNING: disk slow", 0)).matched.is_empty());

    let report = engine.feed(&msg("host", "ERROR: disk full", 1));
    assert_eq!(report.matched, vec!["c1"]);
    assert_eq!(report.alarms.len(), 1);
    assert_eq!(report.alarms[0].rule, "r1");
    assert_eq!(report.alarms[0].message, "disk alarm");
    assert!(engine.condition("c1").unwrap().status());
}

// =============================================================================
// Per-source windows
// =============================================================================

#[test]
fn per_source_cells_trigger_independently() {
    let mut engine = RuleEngine::build(
        EngineConfig::default(),
        [ConditionConfig::new("c2")
            .with_per_source(true)
            .with_occurrence(Occurrence::AtLeast(2))
            .with_timespan(5)],
        [RuleConfig::new("r2", BoolAst::cond("c2")).with_message("${c2.$s} is flapping")],
    )
    .unwrap();

    assert!(engine.feed(&msg("dcm-1", "lost", 0)).alarms.is_empty());
    assert!(engine.feed(&msg("dcm-2", "lost", 1)).alarms.is_empty());
    let alarms = engine.feed(&msg("dcm-1", "lost", 3)).alarms;
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].message, "dcm-1 is flapping");

    let c2 = engine.condition("c2").unwrap();
    assert!(c2.hitmap().status(0, 0));
    assert!(!c2.hitmap().status(1, 0));
    assert!(c2.hitmap().defined(1, 0));
    assert!(
        !c2.get_defined(Some(DomainPair::new(Selector::At(2), Selector::Any)))
            .unwrap()
    );
}

#[test]
fn unseen_sources_stay_undefined() {
    let mut engine = RuleEngine::build(
        EngineConfig::default(),
        [ConditionConfig::new("c2")
            .with_per_source(true)
            .with_occurrence(Occurrence::AtLeast(2))
            .with_timespan(5)],
        Vec::<RuleConfig>::new(),
    )
    .unwrap();
    engine.feed(&msg("dcm-1", "lost", 0));
    engine.feed(&msg("dcm-1", "lost", 2));

    let c2 = engine.condition("c2").unwrap();
    assert!(c2.hitmap().status(0, 0));
    assert_eq!(c2.hitmap().find_source("dcm-2"), Selector::Nil);
    assert!(!c2.hitmap().defined(1, 0));
}

// =============================================================================
// Linked domains
// =============================================================================

#[test]
fn linked_sources_must_be_reported_by_both_conditions() {
    let mut engine = RuleEngine::build(
        EngineConfig::default(),
        [
            ConditionConfig::new("c2").with_pattern("overheat").with_per_source(true),
            ConditionConfig::new("c3").with_pattern("fan stopped").with_per_source(true),
        ],
        [RuleConfig::new(
            "cooling",
            BoolAst::all(vec![BoolPrimaryAst::cond("c2"), BoolPrimaryAst::cond("c3")]),
        )
        .with_domain(DomainAst::single(DomainPrimaryAst::link([
            ("c2", Axis::Source),
            ("c3", Axis::Source),
        ])))
        .with_message("cooling failure on ${c2.$s}")],
    )
    .unwrap();

    assert!(engine.feed(&msg("rack-1", "overheat", 0)).alarms.is_empty());
    assert!(engine.feed(&msg("rack-2", "overheat", 1)).alarms.is_empty());
    assert!(engine.feed(&msg("rack-3", "fan stopped", 2)).alarms.is_empty());
    assert!(engine.rule("cooling").unwrap().domains().is_empty());

    let alarms = engine.feed(&msg("rack-2", "fan stopped", 3)).alarms;
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].message, "cooling failure on rack-2");

    let domains = engine.rule("cooling").unwrap().domains();
    assert_eq!(domains.len(), 1);
    let only = domains.iter().next().unwrap();
    assert_eq!(only[0].source, Selector::At(1));
    assert_eq!(only[1].source, Selector::At(1));
}

#[test]
fn pinned_domains_watch_one_name() {
    let mut engine = RuleEngine::build(
        EngineConfig::default(),
        [ConditionConfig::new("crash").with_pattern("crash").with_per_source(true)],
        [RuleConfig::new("master", BoolAst::cond("crash"))
            .with_domain(DomainAst::single(DomainPrimaryAst::pinned(
                [("crash", Axis::Source)],
                "master",
            )))
            .with_message("run control master crashed")],
    )
    .unwrap();

    assert!(engine.feed(&msg("worker-1", "crash", 0)).alarms.is_empty());
    let alarms = engine.feed(&msg("master", "crash", 1)).alarms;
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].message, "run control master crashed");
}
