//! Sliding-window cells.
//!
//! A [`Cell`] tracks one (source, target) combination of one condition. It
//! retains the most recent matching messages and turns on or off according
//! to the owning condition's [`WindowPolicy`].
//!
//! Two policies exist:
//! - `AtLeast(n)`: the cell is on while `n` messages fall within `timespan`
//!   seconds of each other
//! - `AtMost(n)`: the cell turns on when a scheduled check finds that no
//!   further message arrived, and turns off again on the next arrival
//!
//! Neither policy can observe the passage of time by itself, so a hit may
//! return a due time at which the caller must invoke [`Cell::event`].

use std::collections::VecDeque;
use std::fmt;

use alarmist_foundation::Message;

// =============================================================================
// Policy
// =============================================================================

/// How many occurrences a window is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occurrence {
    /// On once at least this many messages fall inside the window.
    AtLeast(usize),
    /// On once the window holds at most this many messages.
    AtMost(usize),
}

impl Occurrence {
    /// Returns true for [`Occurrence::AtLeast`].
    #[must_use]
    pub const fn is_at_least(self) -> bool {
        matches!(self, Self::AtLeast(_))
    }

    /// Number of messages a cell retains: `n` for at-least, `n + 1` for at-most.
    #[must_use]
    pub const fn capacity(self) -> usize {
        match self {
            Self::AtLeast(n) => n,
            Self::AtMost(n) => n + 1,
        }
    }
}

impl Default for Occurrence {
    fn default() -> Self {
        Self::AtLeast(1)
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::AtMost(n) => write!(f, "at most {n}"),
        }
    }
}

/// Accumulation policy shared by every cell of one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowPolicy {
    /// Occurrence threshold.
    pub occurrence: Occurrence,
    /// Window length in seconds.
    pub timespan: i64,
    /// Once on, never turns off until reset.
    pub persistent: bool,
}

impl WindowPolicy {
    /// Creates a non-persistent policy.
    #[must_use]
    pub const fn new(occurrence: Occurrence, timespan: i64) -> Self {
        Self {
            occurrence,
            timespan,
            persistent: false,
        }
    }

    /// Sets persistence.
    #[must_use]
    pub const fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Number of messages a cell retains.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.occurrence.capacity()
    }

    /// Returns true for an at-least threshold.
    #[must_use]
    pub const fn at_least(&self) -> bool {
        self.occurrence.is_at_least()
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::new(Occurrence::default(), 0)
    }
}

// =============================================================================
// Cell
// =============================================================================

/// Outcome of [`Cell::hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellHit {
    /// The cell's on/off status or defined flag changed.
    pub flipped: bool,
    /// Time (seconds) at which the caller must deliver [`Cell::event`].
    pub schedule: Option<i64>,
}

/// One (source, target) slot of a hitmap.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    on: bool,
    defined: bool,
    messages: VecDeque<Message>,
    groups: Vec<String>,
    pending: Option<i64>,
}

impl Cell {
    /// Creates an undefined, off cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a matching message.
    ///
    /// `groups` are the body-match capture groups of the message.
    ///
    /// An at-most window is armed by its first hit. A cell that was never
    /// hit schedules nothing, so it cannot report silence from a source that
    /// never reported at all.
    pub fn hit(&mut self, message: Message, groups: Vec<String>, policy: &WindowPolicy) -> CellHit {
        if self.on && policy.persistent {
            return CellHit::default();
        }

        let first_hit = !self.defined;
        self.defined = true;
        self.groups = groups;

        let latest = message.seconds();
        self.messages.push_back(message);

        while self
            .messages
            .front()
            .is_some_and(|m| latest - m.seconds() > policy.timespan)
        {
            self.messages.pop_front();
        }
        while self.messages.len() > policy.capacity() {
            self.messages.pop_front();
        }

        let oldest = self.messages.front().map_or(latest, Message::seconds);
        let due = oldest + policy.timespan + 1;

        let mut schedule = None;
        let new_state = if self.messages.len() == policy.capacity() {
            schedule = Some(due);
            policy.at_least()
        } else {
            if !policy.at_least() {
                schedule = Some(due);
            }
            false
        };
        if schedule.is_some() {
            self.pending = schedule;
        }

        let flipped = first_hit || new_state != self.on;
        self.on = new_state;
        CellHit { flipped, schedule }
    }

    /// Sets the status directly. An undefined cell always counts as flipped.
    pub fn force(&mut self, value: bool) -> bool {
        if !self.defined {
            self.defined = true;
            self.on = value;
            return true;
        }
        if self.on == value {
            return false;
        }
        self.on = value;
        true
    }

    /// Delivers a scheduled check. Returns true if the status flipped.
    ///
    /// Only the most recently scheduled due time is honoured. A cell with
    /// nothing pending, including one that was never hit, ignores every
    /// event.
    pub fn event(&mut self, due: i64, policy: &WindowPolicy) -> bool {
        if self.pending != Some(due) {
            return false;
        }
        self.pending = None;

        let new_status = !policy.at_least() || policy.persistent;
        if new_status == self.on {
            return false;
        }
        self.on = new_status;
        true
    }

    /// Returns the cell to its ground state.
    pub fn reset(&mut self) {
        self.on = false;
        self.defined = false;
        self.messages.clear();
        self.groups.clear();
        self.pending = None;
    }

    /// Whether the cell is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Whether the cell has ever been hit or forced.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Number of retained messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Retained messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// The most recently retained message.
    #[must_use]
    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Capture group `n` of the latest hit.
    #[must_use]
    pub fn group(&self, n: usize) -> Option<&str> {
        self.groups.get(n).map(String::as_str)
    }

    /// Due time of the pending scheduled check.
    #[must_use]
    pub fn pending_event(&self) -> Option<i64> {
        self.pending
    }
}
