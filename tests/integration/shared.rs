//! Integration tests for an engine shared between threads

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use alarmist::engine::{
    ConditionConfig, EngineConfig, ManualClock, RuleConfig, RuleEngine, SharedEngine,
};
use alarmist::foundation::{Message, Severity};
use alarmist::language::{BoolAst, BoolPrimaryAst};
use alarmist::storage::Occurrence;

#[test]
fn producers_on_many_threads_see_one_engine() {
    let engine = RuleEngine::build(
        EngineConfig::default(),
        [ConditionConfig::new("error")
            .with_pattern("error")
            .with_per_source(true)
            .with_occurrence(Occurrence::AtLeast(3))
            .with_timespan(100)],
        [RuleConfig::new("noisy", BoolAst::cond("error")).with_message("${error.$s} is noisy")],
    )
    .unwrap();
    let shared = SharedEngine::from(engine);

    let producers: Vec<_> = (0..8)
        .map(|i| {
            let shared = shared.clone();
            thread::spawn(move || {
                let source = format!("node-{i}");
                (0..5)
                    .flat_map(|t| {
                        let message =
                            Message::new(Severity::Error, source.as_str(), "error").at_seconds(t);
                        shared.feed(&message).alarms
                    })
                    .map(|alarm| alarm.message)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut messages: Vec<String> = producers
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    messages.sort();

    let expected: Vec<String> = (0..8).map(|i| format!("node-{i} is noisy")).collect();
    assert_eq!(messages, expected);
    assert_eq!(shared.lock().alarm_count("noisy").unwrap(), 8);
    assert_eq!(shared.lock().captured_count("error").unwrap(), 40);
}

#[test]
fn the_sweeper_raises_silence_alarms() {
    let clock = ManualClock::new(0);
    let mut engine = RuleEngine::build(
        EngineConfig::default().with_sweep_interval(Duration::from_millis(2)),
        [ConditionConfig::new("beat")
            .with_per_source(true)
            .with_occurrence(Occurrence::AtMost(0))
            .with_timespan(10)],
        [RuleConfig::new("dead", BoolAst::cond("beat")).with_message("${beat.$s} went quiet")],
    )
    .unwrap()
    .with_clock(clock.clone());
    let raised = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&raised);
    engine.set_alarm_callback(move |_, message| sink.lock().unwrap().push(message.to_string()));

    let shared = SharedEngine::new(engine);
    let stop = Arc::new(AtomicBool::new(false));
    let sweeper = shared.spawn_sweeper(Arc::clone(&stop));

    shared.feed(&Message::new(Severity::Info, "pump", "beat").at_seconds(0));
    shared.feed(&Message::new(Severity::Info, "valve", "beat").at_seconds(5));

    clock.set(11);
    wait_for(|| raised.lock().unwrap().len() == 1);
    clock.set(16);
    wait_for(|| raised.lock().unwrap().len() == 2);

    stop.store(true, Ordering::SeqCst);
    sweeper.join().unwrap();

    assert_eq!(*raised.lock().unwrap(), vec!["pump went quiet", "valve went quiet"]);
    assert_eq!(shared.lock().pending_events(), 0);
}

#[test]
fn facts_can_be_forced_through_a_shared_handle() {
    let engine = RuleEngine::from_facts(
        EngineConfig::default(),
        ["mains"],
        [
            RuleConfig::new("blackout", BoolAst::single(BoolPrimaryAst::not_cond("mains")))
                .with_actions(["start generator"]),
        ],
    )
    .unwrap();
    let shared = SharedEngine::new(engine);

    let report = thread::spawn({
        let shared = shared.clone();
        move || shared.force(&[("mains", false)])
    })
    .join()
    .unwrap()
    .unwrap();

    assert_eq!(report.actions["blackout"], vec!["start generator"]);
    assert!(shared.sweep().is_empty());
}

fn wait_for(done: impl Fn() -> bool) {
    for _ in 0..500 {
        if done() {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("condition not reached in time");
}
