//! Per-condition two-dimensional cell tables.
//!
//! A [`Hitmap`] translates message-derived source and target names into
//! indices and owns one [`Cell`] per (source, target) index pair. Cells are
//! created lazily: the backing table grows in steps of
//! [`Hitmap::CAPACITY_STEP`] on either axis when a new name needs a slot.
//!
//! A condition that is not parameterized on an axis uses the sentinel
//! bucket 0 on that axis, labelled [`GLOBAL_SOURCE`] or [`GLOBAL_TARGET`].

use std::collections::HashMap;
use std::ops::Range;

use bitflags::bitflags;

use alarmist_foundation::{DomainPair, Error, Message, Result, Selector};

use crate::cell::{Cell, WindowPolicy};

/// Label of the source bucket of a condition that is not per-source.
pub const GLOBAL_SOURCE: &str = "__S_GLOBAL__";

/// Label of the target bucket of a condition that is not per-target.
pub const GLOBAL_TARGET: &str = "__T_GLOBAL__";

bitflags! {
    /// What changed in a hitmap as a result of one capture or force.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangeFlags: u8 {
        /// A source name was seen for the first time.
        const SOURCE = 0b001;
        /// A target name was seen for the first time.
        const TARGET = 0b010;
        /// A cell flipped on/off or became defined.
        const STATUS = 0b100;
    }
}

impl ChangeFlags {
    /// True if the set of known sources or targets grew.
    #[must_use]
    pub fn domain_changed(self) -> bool {
        self.intersects(Self::SOURCE | Self::TARGET)
    }
}

/// Result of [`Hitmap::capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    /// What changed.
    pub flags: ChangeFlags,
    /// Source index of the hit cell.
    pub source: usize,
    /// Target index of the hit cell.
    pub target: usize,
    /// Due time of a check the caller must schedule for this cell.
    pub schedule: Option<i64>,
}

/// How [`Hitmap::alarm_count`] counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CountKind {
    /// Sum of retained messages over the range.
    Messages,
    /// Sources with at least one on cell in the range.
    Sources,
    /// Targets with at least one on cell in the range.
    Targets,
}

// =============================================================================
// Name index
// =============================================================================

#[derive(Debug, Clone, Default)]
struct NameIndex {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl NameIndex {
    fn find(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the index of `name`, inserting it if new.
    fn resolve(&mut self, name: &str) -> (usize, bool) {
        if let Some(i) = self.find(name) {
            return (i, false);
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        (i, true)
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn clear(&mut self) {
        self.names.clear();
        self.index.clear();
    }
}

// =============================================================================
// Hitmap
// =============================================================================

/// The cell table of one condition.
#[derive(Debug, Clone)]
pub struct Hitmap {
    per_source: bool,
    per_target: bool,
    sources: NameIndex,
    targets: NameIndex,
    source_capacity: usize,
    target_capacity: usize,
    cells: Vec<Cell>,
    // Hit order per slot; 0 means never hit since the last reset.
    stamps: Vec<u64>,
    hits: u64,
}

impl Hitmap {
    /// Initial capacity and growth step of each axis.
    pub const CAPACITY_STEP: usize = 20;

    /// Creates an empty hitmap.
    #[must_use]
    pub fn new(per_source: bool, per_target: bool) -> Self {
        let cap = Self::CAPACITY_STEP;
        Self {
            per_source,
            per_target,
            sources: NameIndex::default(),
            targets: NameIndex::default(),
            source_capacity: cap,
            target_capacity: cap,
            cells: vec![Cell::new(); cap * cap],
            stamps: vec![0; cap * cap],
            hits: 0,
        }
    }

    /// Whether sources get their own buckets.
    #[must_use]
    pub fn per_source(&self) -> bool {
        self.per_source
    }

    /// Whether targets get their own buckets.
    #[must_use]
    pub fn per_target(&self) -> bool {
        self.per_target
    }

    /// Number of known sources (the sentinel counts as one).
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of known targets (the sentinel counts as one).
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Current table capacity as (sources, targets).
    #[must_use]
    pub fn capacity(&self) -> (usize, usize) {
        (self.source_capacity, self.target_capacity)
    }

    fn slot(&self, source: usize, target: usize) -> usize {
        source * self.target_capacity + target
    }

    fn grow_to_fit(&mut self, source: usize, target: usize) {
        let mut source_capacity = self.source_capacity;
        let mut target_capacity = self.target_capacity;
        while source >= source_capacity {
            source_capacity += Self::CAPACITY_STEP;
        }
        while target >= target_capacity {
            target_capacity += Self::CAPACITY_STEP;
        }
        if source_capacity == self.source_capacity && target_capacity == self.target_capacity {
            return;
        }

        tracing::trace!(source_capacity, target_capacity, "growing hitmap");
        let mut cells = vec![Cell::new(); source_capacity * target_capacity];
        let mut stamps = vec![0; source_capacity * target_capacity];
        let old = std::mem::take(&mut self.cells);
        for (i, (cell, stamp)) in old.into_iter().zip(&self.stamps).enumerate() {
            let s = i / self.target_capacity;
            let t = i % self.target_capacity;
            cells[s * target_capacity + t] = cell;
            stamps[s * target_capacity + t] = *stamp;
        }
        self.cells = cells;
        self.stamps = stamps;
        self.source_capacity = source_capacity;
        self.target_capacity = target_capacity;
    }

    fn resolve_axes(&mut self, source: &str, target: &str) -> (usize, usize, ChangeFlags) {
        let mut flags = ChangeFlags::empty();

        let source_name = if self.per_source { source } else { GLOBAL_SOURCE };
        let (s, new_source) = self.sources.resolve(source_name);
        if new_source {
            flags |= ChangeFlags::SOURCE;
        }

        let target_name = if self.per_target { target } else { GLOBAL_TARGET };
        let (t, new_target) = self.targets.resolve(target_name);
        if new_target {
            flags |= ChangeFlags::TARGET;
        }

        self.grow_to_fit(s, t);
        (s, t, flags)
    }

    /// Records a message that passed the owning condition's filters.
    ///
    /// `source` and `target` are ignored on axes the condition does not
    /// parameterize.
    pub fn capture(
        &mut self,
        message: Message,
        source: &str,
        target: &str,
        groups: Vec<String>,
        policy: &WindowPolicy,
    ) -> Capture {
        let (s, t, mut flags) = self.resolve_axes(source, target);
        let slot = self.slot(s, t);
        self.hits += 1;
        self.stamps[slot] = self.hits;
        let hit = self.cells[slot].hit(message, groups, policy);
        if hit.flipped {
            flags |= ChangeFlags::STATUS;
        }
        Capture {
            flags,
            source: s,
            target: t,
            schedule: hit.schedule,
        }
    }

    /// Sets the sentinel cell directly.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the hitmap is parameterized on either axis.
    pub fn force(&mut self, value: bool) -> Result<ChangeFlags> {
        if self.per_source || self.per_target {
            return Err(Error::invalid_operation(
                "force on a per-source or per-target hitmap",
            ));
        }
        let (s, t, mut flags) = self.resolve_axes(GLOBAL_SOURCE, GLOBAL_TARGET);
        let slot = self.slot(s, t);
        if self.cells[slot].force(value) {
            flags |= ChangeFlags::STATUS;
        }
        Ok(flags)
    }

    /// Delivers a scheduled check to one cell. Returns true if it flipped.
    pub fn event(&mut self, source: usize, target: usize, due: i64, policy: &WindowPolicy) -> bool {
        if source >= self.source_capacity || target >= self.target_capacity {
            return false;
        }
        let slot = self.slot(source, target);
        self.cells[slot].event(due, policy)
    }

    /// Forgets every name and resets every cell.
    pub fn reset(&mut self) {
        self.sources.clear();
        self.targets.clear();
        for cell in &mut self.cells {
            cell.reset();
        }
        self.stamps.fill(0);
        self.hits = 0;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Index of a source name, or `Nil` if unknown.
    #[must_use]
    pub fn find_source(&self, name: &str) -> Selector {
        self.sources.find(name).map_or(Selector::Nil, Selector::At)
    }

    /// Index of a target name, or `Nil` if unknown.
    #[must_use]
    pub fn find_target(&self, name: &str) -> Selector {
        self.targets.find(name).map_or(Selector::Nil, Selector::At)
    }

    /// Known source names in index order.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.names.iter().map(String::as_str)
    }

    /// Known target names in index order.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.names.iter().map(String::as_str)
    }

    /// Name of a source. `Any` resolves to the first known source.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for `Nil` or an index that is not known.
    pub fn source_name(&self, selector: Selector) -> Result<&str> {
        Self::name_at(&self.sources, selector, "source")
    }

    /// Name of a target. `Any` resolves to the first known target.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for `Nil` or an index that is not known.
    pub fn target_name(&self, selector: Selector) -> Result<&str> {
        Self::name_at(&self.targets, selector, "target")
    }

    fn name_at<'a>(names: &'a NameIndex, selector: Selector, axis: &str) -> Result<&'a str> {
        let index = match selector {
            Selector::Nil => {
                return Err(Error::invalid_operation(format!("{axis} name of a nil selector")));
            }
            Selector::Any => 0,
            Selector::At(i) => i,
        };
        names
            .names
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| Error::invalid_operation(format!("{axis} index {index} is not known")))
    }

    /// Returns the cell at a concrete index pair, if it lies within the table.
    #[must_use]
    pub fn cell(&self, source: usize, target: usize) -> Option<&Cell> {
        if source >= self.source_capacity || target >= self.target_capacity {
            return None;
        }
        self.cells.get(self.slot(source, target))
    }

    fn stamp(&self, source: usize, target: usize) -> u64 {
        if source >= self.source_capacity || target >= self.target_capacity {
            return 0;
        }
        self.stamps[self.slot(source, target)]
    }

    /// The most recently hit cell covered by `pair`, as a concrete pair.
    ///
    /// Returns `None` if nothing in range was hit since the last reset.
    #[must_use]
    pub fn latest_hit(&self, pair: DomainPair) -> Option<DomainPair> {
        let (sources, targets) = self.range(pair).ok()?;
        sources
            .flat_map(|s| targets.clone().map(move |t| (s, t)))
            .map(|(s, t)| (self.stamp(s, t), s, t))
            .filter(|&(stamp, ..)| stamp > 0)
            .max_by_key(|&(stamp, ..)| stamp)
            .map(|(_, s, t)| DomainPair::at(s, t))
    }

    /// Replaces a pair with `Any` on either axis by its most recently hit
    /// cell. Concrete pairs, and pairs with no hit cell in range, are
    /// returned unchanged.
    #[must_use]
    pub fn resolve_any(&self, pair: DomainPair) -> DomainPair {
        if !pair.source.is_any() && !pair.target.is_any() {
            return pair;
        }
        self.latest_hit(pair).unwrap_or(pair)
    }

    fn concrete_cell(&self, pair: DomainPair) -> Result<&Cell> {
        if pair.is_null() {
            return Err(Error::invalid_operation("cell lookup with a nil selector"));
        }
        let pair = self.resolve_any(pair);
        let s = pair.source.index().unwrap_or(0);
        let t = pair.target.index().unwrap_or(0);
        self.cell(s, t)
            .ok_or_else(|| Error::invalid_operation(format!("cell ({s},{t}) is out of range")))
    }

    /// Whether the cell at (`source`, `target`) is on.
    #[must_use]
    pub fn status(&self, source: usize, target: usize) -> bool {
        self.cell(source, target).is_some_and(Cell::is_on)
    }

    /// Whether the cell at (`source`, `target`) has been hit or forced.
    #[must_use]
    pub fn defined(&self, source: usize, target: usize) -> bool {
        self.cell(source, target).is_some_and(Cell::is_defined)
    }

    /// Latest message of a cell. `Any` on an axis picks the most recently
    /// hit cell in range, or index 0 if none was hit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a nil or out-of-range pair.
    pub fn latest_message(&self, pair: DomainPair) -> Result<Option<&Message>> {
        Ok(self.concrete_cell(pair)?.latest_message())
    }

    /// Capture group `n` of a cell's latest hit. `Any` is resolved as in
    /// [`Hitmap::latest_message`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a nil or out-of-range pair.
    pub fn message_group(&self, pair: DomainPair, n: usize) -> Result<Option<&str>> {
        Ok(self.concrete_cell(pair)?.group(n))
    }

    /// Index ranges covered by `pair`; `Any` spans every known name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if either axis is nil.
    pub fn range(&self, pair: DomainPair) -> Result<(Range<usize>, Range<usize>)> {
        if pair.is_null() {
            return Err(Error::invalid_operation("range of a nil domain"));
        }
        let axis = |sel: Selector, known: usize| match sel {
            Selector::At(i) => i..i + 1,
            _ => 0..known,
        };
        Ok((
            axis(pair.source, self.source_count()),
            axis(pair.target, self.target_count()),
        ))
    }

    /// Counts messages, sources or targets over the range of `pair`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if either axis is nil.
    pub fn alarm_count(&self, pair: DomainPair, kind: CountKind) -> Result<usize> {
        let (sources, targets) = self.range(pair)?;
        let on = |s: usize, t: usize| self.status(s, t);
        let count = match kind {
            CountKind::Messages => sources
                .flat_map(|s| targets.clone().map(move |t| (s, t)))
                .filter_map(|(s, t)| self.cell(s, t))
                .map(Cell::message_count)
                .sum(),
            CountKind::Sources => sources
                .filter(|&s| targets.clone().any(|t| on(s, t)))
                .count(),
            CountKind::Targets => targets
                .filter(|&t| sources.clone().any(|s| on(s, t)))
                .count(),
        };
        Ok(count)
    }
}

impl Default for Hitmap {
    fn default() -> Self {
        Self::new(false, false)
    }
}
