use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use xref_graph::{NodeIdentity, SourcePosition};

use crate::error::IndexError;

/// One textual occurrence of a reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Innermost declaration containing the occurrence (not the referenced node).
    pub referencing_node: NodeIdentity,
    /// Top-level class whose indexing pass produced this record.
    pub unit: NodeIdentity,
    pub line_text: String,
    /// 1-based.
    pub line_number: u32,
    pub raw_offset: usize,
}

/// Records filed under one referenced node.
///
/// `owner` is the top-level class declaring the referenced node; the whole
/// bucket goes away when that class is invalidated.
#[derive(Debug)]
pub struct UsageBucket {
    owner: NodeIdentity,
    records: Mutex<Vec<UsageRecord>>,
}

impl UsageBucket {
    pub(crate) fn new(owner: NodeIdentity) -> Self {
        Self {
            owner,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn owner(&self) -> &NodeIdentity {
        &self.owner
    }

    pub fn snapshot(&self) -> Vec<UsageRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn append(&self, record: UsageRecord) {
        self.records.lock().push(record);
    }

    pub(crate) fn extend(&self, records: impl IntoIterator<Item = UsageRecord>) {
        self.records.lock().extend(records);
    }

    /// Drop every record contributed by `unit`; returns how many went.
    pub(crate) fn remove_unit(&self, unit: &NodeIdentity) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| &r.unit != unit);
        before - records.len()
    }
}

// ── Per-class results ──────────────────────────────────────────────

/// An occurrence left out of the index because its line does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOccurrence {
    pub position: SourcePosition,
    pub reason: IndexError,
}

/// What one class's indexing pass achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Every occurrence was processed.
    Indexed { records: usize },
    /// Some occurrences were skipped; the rest are indexed.
    Partial {
        records: usize,
        skipped: Vec<SkippedOccurrence>,
    },
    /// The pass was aborted. `published` records reached the index before
    /// the failure (always 0 in buffered mode).
    Failed { published: usize, error: IndexError },
}

impl IndexOutcome {
    /// Records that reached the index.
    pub fn records(&self) -> usize {
        match self {
            Self::Indexed { records } | Self::Partial { records, .. } => *records,
            Self::Failed { published, .. } => *published,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of one invalidation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationStats {
    pub removed_buckets: usize,
    pub removed_records: usize,
}
