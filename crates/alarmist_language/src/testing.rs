//! In-memory condition stand-in for unit tests.

use alarmist_foundation::{MatchFields, Message, Severity};
use alarmist_storage::{Hitmap, Occurrence, WindowPolicy};

use crate::view::ConditionView;

pub(crate) struct FakeCondition {
    name: String,
    hitmap: Hitmap,
    fields: MatchFields,
    clock: i64,
}

impl FakeCondition {
    fn new(name: &str, per_source: bool, per_target: bool) -> Self {
        Self {
            name: name.to_string(),
            hitmap: Hitmap::new(per_source, per_target),
            fields: MatchFields::new(),
            clock: 0,
        }
    }

    pub(crate) fn flat(name: &str) -> Self {
        Self::new(name, false, false)
    }

    pub(crate) fn per_source(name: &str) -> Self {
        Self::new(name, true, false)
    }

    pub(crate) fn per_target(name: &str) -> Self {
        Self::new(name, false, true)
    }

    pub(crate) fn forced(mut self, value: bool) -> Self {
        self.hitmap.force(value).expect("flat condition");
        self
    }

    pub(crate) fn hit(self, source: &str, target: &str) -> Self {
        self.hit_with(source, target, &[])
    }

    pub(crate) fn hit_with(mut self, source: &str, target: &str, groups: &[&str]) -> Self {
        self.clock += 1;
        let body = groups.first().copied().unwrap_or("hit");
        let msg = Message::new(Severity::Error, source, body).at_seconds(self.clock);
        let groups: Vec<String> = groups.iter().map(|g| (*g).to_string()).collect();
        self.fields = MatchFields {
            severity: Severity::Error,
            source: source.to_string(),
            target: target.to_string(),
            category: String::new(),
            body: body.to_string(),
            groups: groups.clone(),
        };
        let policy = WindowPolicy::new(Occurrence::AtLeast(1), 3600);
        self.hitmap.capture(msg, source, target, groups, &policy);
        self
    }
}

impl ConditionView for FakeCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn hitmap(&self) -> &Hitmap {
        &self.hitmap
    }

    fn last_fields(&self) -> &MatchFields {
        &self.fields
    }
}
