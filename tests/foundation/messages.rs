//! Integration tests for messages and severities

use alarmist_foundation::{MatchFields, Message, Severity};
use chrono::{TimeZone, Utc};

#[test]
fn severities_parse_and_order() {
    assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
    assert_eq!("SYSTEM".parse::<Severity>().unwrap(), Severity::System);
    assert!("fatal".parse::<Severity>().is_err());
    assert!(Severity::Error > Severity::Warning);
    assert_eq!(Severity::default(), Severity::Debug);
}

#[test]
fn message_timestamps() {
    let msg = Message::new(Severity::Info, "dcm-1", "run started").at_seconds(1_700_000_000);
    assert_eq!(msg.seconds(), 1_700_000_000);

    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let msg = msg.with_timestamp(at).with_category("RUNCONTROL");
    assert_eq!(msg.timestamp, at);
    assert_eq!(
        msg.to_string(),
        "2024-01-02 03:04:05 INFO [RUNCONTROL] dcm-1: run started"
    );
}

#[test]
fn match_fields_groups() {
    let fields = MatchFields {
        groups: vec!["disk sda full".into(), "sda".into()],
        ..MatchFields::new()
    };
    assert_eq!(fields.group(1), Some("sda"));
    assert_eq!(fields.group(2), None);
}
