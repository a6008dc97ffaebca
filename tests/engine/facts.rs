//! Integration tests for forced facts and forward chaining

use alarmist_engine::{EngineConfig, RuleConfig, RuleEngine};
use alarmist_foundation::{ErrorKind, SemanticLimit};
use alarmist_language::{BoolAst, BoolPrimaryAst};

fn rule(name: &str, when: &str) -> RuleConfig {
    RuleConfig::new(name, BoolAst::cond(when))
}

#[test]
fn facts_chain_through_several_rules() {
    let mut engine = RuleEngine::from_facts(
        EngineConfig::default(),
        ["fuel"],
        [
            rule("ignite", "fuel").with_facts(["fire"]),
            rule("heat", "fire").with_facts(["steam"]),
            rule("turn", "steam")
                .with_actions(["spin turbine"])
                .with_false_actions(["brake turbine"]),
        ],
    )
    .unwrap();
    assert_eq!(
        engine.condition_names().collect::<Vec<_>>(),
        vec!["fuel", "fire", "steam"]
    );

    let report = engine.force(&[("fuel", true)]).unwrap();
    assert!(report.facts["ignite"]["fire"]);
    assert!(report.facts["heat"]["steam"]);
    assert_eq!(report.actions["turn"], vec!["spin turbine"]);
    assert_eq!(report.actions.len(), 3);

    let report = engine.force(&[("fuel", false)]).unwrap();
    assert!(!report.facts["heat"]["steam"]);
    assert_eq!(report.actions["turn"], vec!["brake turbine"]);
}

#[test]
fn rules_wait_for_every_fact_to_be_known() {
    let mut engine = RuleEngine::from_facts(
        EngineConfig::default(),
        ["a", "b"],
        [RuleConfig::new(
            "both",
            BoolAst::all(vec![BoolPrimaryAst::cond("a"), BoolPrimaryAst::not_cond("b")]),
        )
        .with_actions(["go"])],
    )
    .unwrap();

    assert!(engine.force(&[("a", true)]).unwrap().actions.is_empty());
    assert!(!engine.rule_evaluable("both").unwrap());

    let report = engine.force(&[("b", false)]).unwrap();
    assert_eq!(report.actions["both"], vec!["go"]);
    assert_eq!(report.alarms.len(), 1);
    assert!(engine.rule_evaluable("both").unwrap());
}

#[test]
fn alarms_in_holdoff_still_hold() {
    let mut engine = RuleEngine::from_facts(
        EngineConfig::default(),
        ["door"],
        [rule("open", "door")
            .with_message("door open")
            .with_actions(["light on"])
            .with_false_actions(["light off"])],
    )
    .unwrap();

    let report = engine.force(&[("door", true)]).unwrap();
    assert_eq!(report.alarms.len(), 1);
    assert_eq!(report.alarms[0].message, "door open");

    let report = engine.force(&[("door", false)]).unwrap();
    assert_eq!(report.actions["open"], vec!["light off"]);

    let report = engine.force(&[("door", true)]).unwrap();
    assert!(report.alarms.is_empty());
    assert_eq!(report.actions["open"], vec!["light on"]);
    assert_eq!(engine.alarm_count("open").unwrap(), 1);
}

#[test]
fn steady_facts_repeat_their_actions() {
    let mut engine = RuleEngine::from_facts(
        EngineConfig::default(),
        ["f1"],
        [rule("r1", "f1").with_actions(["a1", "a2"])],
    )
    .unwrap();

    let first = engine.force(&[("f1", true)]).unwrap();
    assert_eq!(first.actions["r1"], vec!["a1", "a2"]);
    assert_eq!(first.alarms.len(), 1);

    let second = engine.force(&[("f1", true)]).unwrap();
    assert_eq!(second.actions, first.actions);
    assert!(second.alarms.is_empty());
}

#[test]
fn every_evaluated_rule_reports_its_facts() {
    let mut engine = RuleEngine::from_facts(
        EngineConfig::default(),
        ["f1"],
        [
            rule("r1", "f1").with_actions(["a1"]),
            rule("r2", "f1").with_facts(["g"]),
        ],
    )
    .unwrap();

    let report = engine.force(&[("f1", true)]).unwrap();
    assert_eq!(report.facts.len(), 2);
    assert!(report.facts["r1"].is_empty());
    assert!(report.facts["r2"]["g"]);
}

#[test]
fn disabled_rules_break_the_chain() {
    let mut engine = RuleEngine::from_facts(
        EngineConfig::default(),
        ["a"],
        [
            rule("first", "a").with_facts(["b"]),
            rule("second", "b").with_actions(["done"]),
        ],
    )
    .unwrap();
    engine.disable_rule("first").unwrap();

    let report = engine.force(&[("a", true)]).unwrap();
    assert!(report.actions.is_empty());
    assert!(report.facts.is_empty());

    engine.enable_rule("first").unwrap();
    let report = engine.force(&[("a", false)]).unwrap();
    assert_eq!(report.actions["first"], Vec::<String>::new());
    assert!(!report.facts["first"]["b"]);
    assert_eq!(report.actions["second"], Vec::<String>::new());
}

#[test]
fn runaway_chains_name_the_last_rule() {
    let mut engine = RuleEngine::from_facts(
        EngineConfig::default().with_max_chain_depth(5),
        ["ping"],
        [
            rule("pong", "ping").with_facts(["pang"]),
            RuleConfig::new("pung", BoolAst::single(BoolPrimaryAst::not_cond("pang")))
                .with_facts(["ping"]),
        ],
    )
    .unwrap();

    let err = engine.force(&[("ping", true)]).unwrap_err();
    let ErrorKind::LimitExceeded(SemanticLimit::MaxChainDepth { limit, rule }) = &err.kind else {
        panic!("expected a chain depth error, got {err}");
    };
    assert_eq!(*limit, 5);
    assert!(matches!(rule.as_deref(), Some("pong" | "pung")));
}
