//! Registry of expected participants, grouped by name.
//!
//! Ratio functions such as `count_percent` divide an observed count by the
//! number of participants registered in a group.

use std::collections::{BTreeSet, HashMap};

use alarmist_foundation::{Error, NameKind, Result};

/// Named groups of participant names.
#[derive(Debug, Clone, Default)]
pub struct Participants {
    groups: HashMap<String, BTreeSet<String>>,
    ungrouped: BTreeSet<String>,
    all: BTreeSet<String>,
}

impl Participants {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the group already exists.
    pub fn add_group(&mut self, group: impl Into<String>) -> Result<()> {
        let group = group.into();
        if self.groups.contains_key(&group) {
            return Err(Error::invalid_operation(format!("group {group} already exists")));
        }
        self.groups.insert(group, BTreeSet::new());
        Ok(())
    }

    /// Adds a group pre-filled with `group-0` … `group-(size-1)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the group already exists.
    pub fn add_group_with_size(&mut self, group: impl Into<String>, size: usize) -> Result<()> {
        let group = group.into();
        self.add_group(group.clone())?;
        for i in 0..size {
            self.add_participant(&group, format!("{group}-{i}"))?;
        }
        Ok(())
    }

    /// Adds a participant to an existing group.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the group does not exist.
    pub fn add_participant(&mut self, group: &str, name: impl Into<String>) -> Result<()> {
        let members = self
            .groups
            .get_mut(group)
            .ok_or_else(|| Error::unknown_name(NameKind::ParticipantGroup, group))?;
        let name = name.into();
        members.insert(name.clone());
        self.all.insert(name);
        Ok(())
    }

    /// Adds a participant that belongs to no group.
    pub fn add_ungrouped(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.ungrouped.insert(name.clone());
        self.all.insert(name);
    }

    /// Number of participants in `group`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the group does not exist.
    pub fn group_count(&self, group: &str) -> Result<usize> {
        self.groups
            .get(group)
            .map(BTreeSet::len)
            .ok_or_else(|| Error::unknown_name(NameKind::ParticipantGroup, group))
    }

    /// Number of distinct participants across all groups and ungrouped.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.all.len()
    }

    /// Removes every group and participant.
    pub fn reset(&mut self) {
        self.groups.clear();
        self.ungrouped.clear();
        self.all.clear();
    }
}
