// Cut set - Ordered collection of user-declared "remove" ranges

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::domain::model::{RangeId, TimeRange};

/// Source of unique cut-range identifiers
pub trait IdGenerator: Send + Sync {
    /// Return an identifier never returned before by this generator
    fn next_id(&self) -> u64;
}

/// Monotonic counter, the default identifier source
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting at `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Mutation applied to a cut set
#[derive(Debug, Clone, PartialEq)]
pub enum CutSetChange {
    Added(TimeRange),
    Removed(TimeRange),
    Cleared,
}

/// Observer notified after every mutation of a cut set
pub trait CutSetObserver: Send + Sync {
    fn on_cut_set_changed(&self, change: &CutSetChange, ranges: &[TimeRange]);
}

/// Insertion-ordered collection of cut ranges.
///
/// Ranges are neither sorted nor merged here; the keep-range planner
/// normalizes them when a job is planned.
pub struct CutSet {
    ranges: Vec<TimeRange>,
    ids: Arc<dyn IdGenerator>,
    observers: Vec<Arc<dyn CutSetObserver>>,
}

impl CutSet {
    /// Create an empty cut set with a sequential id generator
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(SequentialIdGenerator::new()))
    }

    /// Create an empty cut set drawing ids from `ids`
    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            ranges: Vec::new(),
            ids,
            observers: Vec::new(),
        }
    }

    /// Register a change observer
    pub fn subscribe(&mut self, observer: Arc<dyn CutSetObserver>) {
        self.observers.push(observer);
    }

    /// Append a cut range.
    ///
    /// Never fails: a negative start is clamped to zero and an end before the
    /// start collapses the range to zero length.
    pub fn add_cut_range(&mut self, start: f64, end: f64) -> RangeId {
        let id = RangeId::Cut(self.ids.next_id());
        let range = TimeRange::new(id, start, end);
        if range.start() != start || range.end() != end {
            debug!(
                requested_start = start,
                requested_end = end,
                start = range.start(),
                end = range.end(),
                "Normalized cut range"
            );
        }

        self.ranges.push(range.clone());
        self.notify(&CutSetChange::Added(range));
        id
    }

    /// Remove the range with `id`; absent ids are ignored
    pub fn remove_cut_range(&mut self, id: RangeId) {
        if let Some(index) = self.ranges.iter().position(|r| r.id() == id) {
            let removed = self.ranges.remove(index);
            self.notify(&CutSetChange::Removed(removed));
        }
    }

    /// Remove every range
    pub fn clear_cut_ranges(&mut self) {
        self.ranges.clear();
        self.notify(&CutSetChange::Cleared);
    }

    /// Ranges in insertion order
    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    pub fn get(&self, id: RangeId) -> Option<&TimeRange> {
        self.ranges.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn notify(&self, change: &CutSetChange) {
        for observer in &self.observers {
            observer.on_cut_set_changed(change, &self.ranges);
        }
    }
}

impl Default for CutSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CutSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CutSet")
            .field("ranges", &self.ranges)
            .field("observers", &self.observers.len())
            .finish()
    }
}
