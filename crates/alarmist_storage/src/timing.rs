//! Scheduled cell checks.
//!
//! Window policies cannot observe elapsed time on their own. When a cell
//! hit returns a due time, the owning engine records a [`TimingEvent`] here
//! and a periodic sweep pops every event whose due time has passed.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use alarmist_foundation::ConditionId;

/// A check due on one cell of one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimingEvent {
    /// Due time in seconds since the Unix epoch.
    pub due: i64,
    /// The condition owning the cell.
    pub condition: ConditionId,
    /// Source index of the cell.
    pub source: usize,
    /// Target index of the cell.
    pub target: usize,
}

impl TimingEvent {
    /// Creates an event.
    #[must_use]
    pub const fn new(due: i64, condition: ConditionId, source: usize, target: usize) -> Self {
        Self {
            due,
            condition,
            source,
            target,
        }
    }
}

/// Min-heap of pending events ordered by due time.
#[derive(Debug, Clone, Default)]
pub struct TimingQueue {
    heap: BinaryHeap<Reverse<TimingEvent>>,
}

impl TimingQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules an event.
    pub fn push(&mut self, event: TimingEvent) {
        self.heap.push(Reverse(event));
    }

    /// Due time of the earliest event.
    #[must_use]
    pub fn next_due(&self) -> Option<i64> {
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    /// Removes and returns every event due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: i64) -> Vec<TimingEvent> {
        let mut due = Vec::new();
        while self.next_due().is_some_and(|t| t <= now) {
            if let Some(Reverse(event)) = self.heap.pop() {
                due.push(event);
            }
        }
        due
    }

    /// Drops every event belonging to `condition`.
    pub fn remove_condition(&mut self, condition: ConditionId) {
        self.heap.retain(|Reverse(e)| e.condition != condition);
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every pending event.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
