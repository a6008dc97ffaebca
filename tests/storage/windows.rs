//! Integration tests for window cells
//!
//! At-least and at-most windows, persistence, and scheduled checks.

use alarmist_foundation::{Message, Severity};
use alarmist_storage::{Cell, Occurrence, WindowPolicy};

fn msg(at: i64) -> Message {
    Message::new(Severity::Error, "dcm-1", "ERROR: link down").at_seconds(at)
}

fn hit(cell: &mut Cell, at: i64, policy: &WindowPolicy) -> bool {
    cell.hit(msg(at), Vec::new(), policy).flipped
}

// =============================================================================
// At least
// =============================================================================

#[test]
fn three_within_ten_seconds_flip_on_once() {
    let policy = WindowPolicy::new(Occurrence::AtLeast(3), 10);
    let mut cell = Cell::new();

    assert!(hit(&mut cell, 0, &policy)); // first hit defines the cell
    assert!(!cell.is_on());
    assert!(!hit(&mut cell, 2, &policy));
    assert!(hit(&mut cell, 4, &policy));
    assert!(cell.is_on());
    assert_eq!(cell.pending_event(), Some(11));

    // A fourth message keeps the cell on and slides the window.
    assert!(!hit(&mut cell, 6, &policy));
    assert!(cell.is_on());
    assert_eq!(cell.message_count(), 3);
    assert_eq!(cell.pending_event(), Some(13));
}

#[test]
fn quiet_window_turns_the_cell_off() {
    let policy = WindowPolicy::new(Occurrence::AtLeast(3), 10);
    let mut cell = Cell::new();
    for t in [0, 2, 4] {
        hit(&mut cell, t, &policy);
    }
    assert!(cell.event(11, &policy));
    assert!(!cell.is_on());
    assert!(cell.is_defined());
}

#[test]
fn persistent_cells_stay_on() {
    let policy = WindowPolicy::new(Occurrence::AtLeast(3), 10).with_persistent(true);
    let mut cell = Cell::new();
    for t in [0, 2, 4] {
        hit(&mut cell, t, &policy);
    }
    assert!(!cell.event(11, &policy));
    assert!(cell.is_on());

    // Once on, further hits are ignored entirely.
    assert!(!hit(&mut cell, 100, &policy));
    assert_eq!(cell.latest_message().map(Message::seconds), Some(4));
}

#[test]
fn spread_out_messages_never_trigger() {
    let policy = WindowPolicy::new(Occurrence::AtLeast(2), 5);
    let mut cell = Cell::new();
    hit(&mut cell, 0, &policy);
    hit(&mut cell, 10, &policy);
    hit(&mut cell, 20, &policy);
    assert!(!cell.is_on());
    assert_eq!(cell.message_count(), 1);
}

// =============================================================================
// At most
// =============================================================================

#[test]
fn silence_turns_an_at_most_cell_on() {
    let policy = WindowPolicy::new(Occurrence::AtMost(1), 5);
    let mut cell = Cell::new();

    hit(&mut cell, 0, &policy);
    assert!(!cell.is_on());
    assert_eq!(cell.pending_event(), Some(6));

    assert!(cell.event(6, &policy));
    assert!(cell.is_on());

    // The next arrival re-arms the window and turns the cell off.
    assert!(hit(&mut cell, 7, &policy));
    assert!(!cell.is_on());
    assert_eq!(cell.pending_event(), Some(13));
}

#[test]
fn at_most_cells_wait_for_a_first_hit() {
    let policy = WindowPolicy::new(Occurrence::AtMost(0), 5);
    let mut cell = Cell::new();

    assert_eq!(cell.pending_event(), None);
    assert!(!cell.event(6, &policy));
    assert!(!cell.is_on());
    assert!(!cell.is_defined());

    hit(&mut cell, 0, &policy);
    assert_eq!(cell.pending_event(), Some(6));
    assert!(cell.event(6, &policy));
    assert!(cell.is_on());
}

#[test]
fn rearming_makes_old_events_stale() {
    let policy = WindowPolicy::new(Occurrence::AtMost(1), 5);
    let mut cell = Cell::new();
    hit(&mut cell, 0, &policy);
    hit(&mut cell, 8, &policy);
    assert_eq!(cell.pending_event(), Some(14));
    assert!(!cell.event(6, &policy));
    assert!(!cell.is_on());
    assert!(cell.event(14, &policy));
}

#[test]
fn groups_follow_the_latest_hit() {
    let policy = WindowPolicy::default();
    let mut cell = Cell::new();
    cell.hit(msg(0), vec!["disk sda".into(), "sda".into()], &policy);
    cell.hit(msg(1), vec!["disk sdb".into(), "sdb".into()], &policy);
    assert_eq!(cell.group(1), Some("sdb"));
    cell.reset();
    assert!(!cell.is_defined());
    assert_eq!(cell.group(1), None);
}
