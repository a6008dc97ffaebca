//! Domain algebra over (source, target) selectors.
//!
//! A [`Selector`] addresses one axis of a condition's hitmap: a concrete
//! index, the wildcard [`Selector::Any`], or the unsatisfiable
//! [`Selector::Nil`]. Pairs of selectors address cells, vectors of pairs
//! assign one cell range per condition of a rule, and sets of vectors are a
//! rule's disjunctive candidate universe.
//!
//! Every operation here is pure. Intersection laws:
//! - `Nil` absorbs: `Nil ∧ x = Nil`
//! - `Any` is the identity: `Any ∧ x = x`
//! - concrete selectors intersect to themselves when equal, else `Nil`

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

// =============================================================================
// Axis
// =============================================================================

/// One of the two hitmap axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// The message source axis (`$s`).
    Source,
    /// The message target axis (`$t`).
    Target,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("$s"),
            Self::Target => f.write_str("$t"),
        }
    }
}

// =============================================================================
// Selector
// =============================================================================

/// A selector on one axis: a specific index, any index, or none.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selector {
    /// Unsatisfiable; absorbs under intersection.
    Nil,
    /// Wildcard; identity under intersection.
    Any,
    /// A concrete index on the axis.
    At(usize),
}

impl Selector {
    /// Intersects two selectors.
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        match (self, other) {
            (Self::Nil, _) | (_, Self::Nil) => Self::Nil,
            (Self::Any, x) | (x, Self::Any) => x,
            (Self::At(a), Self::At(b)) => {
                if a == b {
                    Self::At(a)
                } else {
                    Self::Nil
                }
            }
        }
    }

    /// Returns true if `self` covers every index `other` covers.
    ///
    /// `Any` contains every selector and equal selectors contain each other.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self == other || self == Self::Any
    }

    /// Returns true for [`Selector::Nil`].
    #[must_use]
    pub const fn is_nil(self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true for [`Selector::Any`].
    #[must_use]
    pub const fn is_any(self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns the concrete index, if any.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::At(i) => Some(i),
            _ => None,
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Any => f.write_str("*"),
            Self::At(i) => write!(f, "{i}"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Self::At(index)
    }
}

// =============================================================================
// DomainPair
// =============================================================================

/// A (source, target) cell address for one condition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainPair {
    /// Selector on the source axis.
    pub source: Selector,
    /// Selector on the target axis.
    pub target: Selector,
}

impl DomainPair {
    /// Creates a pair from two selectors.
    #[must_use]
    pub const fn new(source: Selector, target: Selector) -> Self {
        Self { source, target }
    }

    /// Creates a pair addressing one concrete cell.
    #[must_use]
    pub const fn at(source: usize, target: usize) -> Self {
        Self::new(Selector::At(source), Selector::At(target))
    }

    /// The wildcard pair `(*, *)`.
    #[must_use]
    pub const fn any() -> Self {
        Self::new(Selector::Any, Selector::Any)
    }

    /// The null pair `(nil, nil)`.
    #[must_use]
    pub const fn null() -> Self {
        Self::new(Selector::Nil, Selector::Nil)
    }

    /// Returns the selector on the given axis.
    #[must_use]
    pub const fn get(self, axis: Axis) -> Selector {
        match axis {
            Axis::Source => self.source,
            Axis::Target => self.target,
        }
    }

    /// Replaces the selector on the given axis.
    pub fn set(&mut self, axis: Axis, selector: Selector) {
        match axis {
            Axis::Source => self.source = selector,
            Axis::Target => self.target = selector,
        }
    }

    /// Elementwise intersection.
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self::new(
            self.source.intersect(other.source),
            self.target.intersect(other.target),
        )
    }

    /// Returns true if both axes of `self` contain the axes of `other`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.source.contains(other.source) && self.target.contains(other.target)
    }

    /// True iff either axis is nil.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.source.is_nil() || self.target.is_nil()
    }
}

impl Default for DomainPair {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Debug for DomainPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.source, self.target)
    }
}

/// Inserts `pair` into `pairs` under domain containment.
///
/// Nothing happens if an existing entry already contains `pair`. Entries
/// that `pair` contains are removed before it is appended. Returns true if
/// the collection changed.
pub fn union_pair(pairs: &mut Vec<DomainPair>, pair: DomainPair) -> bool {
    if pair.is_null() || pairs.iter().any(|p| p.contains(pair)) {
        return false;
    }
    pairs.retain(|p| !pair.contains(*p));
    pairs.push(pair);
    true
}

// =============================================================================
// DomainVector
// =============================================================================

/// One assignment of a cell range to every condition a rule references.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainVector(Vec<DomainPair>);

impl DomainVector {
    /// Creates a vector from explicit pairs.
    #[must_use]
    pub fn new(pairs: Vec<DomainPair>) -> Self {
        Self(pairs)
    }

    /// The all-wildcard vector of length `n`.
    #[must_use]
    pub fn any(n: usize) -> Self {
        Self(vec![DomainPair::any(); n])
    }

    /// The canonical null vector: a single null pair.
    #[must_use]
    pub fn null() -> Self {
        Self(vec![DomainPair::null()])
    }

    /// A vector of `n` null pairs, used as an empty accumulator.
    #[must_use]
    pub fn nulls(n: usize) -> Self {
        Self(vec![DomainPair::null(); n])
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the vector holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff the vector is empty or any pair is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(|p| p.is_null())
    }

    /// Returns the pair at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<DomainPair> {
        self.0.get(index).copied()
    }

    /// Returns a mutable reference to the pair at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut DomainPair> {
        self.0.get_mut(index)
    }

    /// Iterates over the pairs.
    pub fn iter(&self) -> std::slice::Iter<'_, DomainPair> {
        self.0.iter()
    }

    /// Iterates mutably over the pairs.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DomainPair> {
        self.0.iter_mut()
    }

    /// Returns the pairs as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[DomainPair] {
        &self.0
    }

    /// Elementwise intersection.
    ///
    /// Collapses to [`DomainVector::null`] when any component is null.
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if the vectors differ in length.
    pub fn intersect(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(Error::size_mismatch(self.len(), other.len()));
        }
        let mut pairs = Vec::with_capacity(self.len());
        for (a, b) in self.0.iter().zip(&other.0) {
            let pair = a.intersect(*b);
            if pair.is_null() {
                return Ok(Self::null());
            }
            pairs.push(pair);
        }
        Ok(Self(pairs))
    }

    /// Left fold of [`DomainVector::intersect`] over `vectors`.
    ///
    /// An empty input yields the canonical null vector.
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if any two vectors differ in length.
    pub fn intersect_all<'a, I>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut iter = vectors.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Self::null());
        };
        let mut acc = first.clone();
        for v in iter {
            if acc.is_null() {
                break;
            }
            acc = acc.intersect(v)?;
        }
        Ok(acc)
    }

    /// True if every pair of `self` contains the matching pair of `other`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| a.contains(*b))
    }
}

impl Index<usize> for DomainVector {
    type Output = DomainPair;

    fn index(&self, index: usize) -> &DomainPair {
        &self.0[index]
    }
}

impl IndexMut<usize> for DomainVector {
    fn index_mut(&mut self, index: usize) -> &mut DomainPair {
        &mut self.0[index]
    }
}

impl From<Vec<DomainPair>> for DomainVector {
    fn from(pairs: Vec<DomainPair>) -> Self {
        Self(pairs)
    }
}

impl FromIterator<DomainPair> for DomainVector {
    fn from_iter<I: IntoIterator<Item = DomainPair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DomainVector {
    type Item = &'a DomainPair;
    type IntoIter = std::slice::Iter<'a, DomainPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Debug for DomainVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{p:?}")?;
        }
        f.write_str("]")
    }
}

// =============================================================================
// DomainSet
// =============================================================================

/// A disjunctive collection of domain vectors.
#[derive(Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainSet(Vec<DomainVector>);

impl DomainSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A set holding only the all-wildcard vector of length `n`.
    #[must_use]
    pub fn any(n: usize) -> Self {
        Self(vec![DomainVector::any(n)])
    }

    /// Number of vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the set holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the vectors.
    pub fn iter(&self) -> std::slice::Iter<'_, DomainVector> {
        self.0.iter()
    }

    /// Removes every vector.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Appends a vector without containment checks. Null vectors are dropped.
    pub fn push(&mut self, vector: DomainVector) {
        if !vector.is_null() {
            self.0.push(vector);
        }
    }

    /// Appends every vector of `other`.
    pub fn extend(&mut self, other: Self) {
        for v in other.0 {
            self.push(v);
        }
    }

    /// Inserts `vector` under containment, like [`union_pair`] for vectors.
    ///
    /// Returns true if the set changed.
    pub fn insert(&mut self, vector: DomainVector) -> bool {
        if vector.is_null() || self.0.iter().any(|v| v.contains(&vector)) {
            return false;
        }
        self.0.retain(|v| !vector.contains(v));
        self.0.push(vector);
        true
    }

    /// Cartesian intersection of two sets, discarding null results.
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if vectors of different lengths meet.
    pub fn cross_intersect(&self, other: &Self) -> Result<Self> {
        let mut out = Self::new();
        for a in &self.0 {
            for b in &other.0 {
                out.push(a.intersect(b)?);
            }
        }
        Ok(out)
    }

    /// Distinct non-null pairs seen in column `index`, under containment.
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<DomainPair> {
        let mut pairs = Vec::new();
        for v in &self.0 {
            if let Some(p) = v.get(index) {
                union_pair(&mut pairs, p);
            }
        }
        pairs
    }
}

impl From<Vec<DomainVector>> for DomainSet {
    fn from(vectors: Vec<DomainVector>) -> Self {
        let mut set = Self::new();
        for v in vectors {
            set.push(v);
        }
        set
    }
}

impl<'a> IntoIterator for &'a DomainSet {
    type Item = &'a DomainVector;
    type IntoIter = std::slice::Iter<'a, DomainVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Debug for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}
