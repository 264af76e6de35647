// Usage index: referenced node → every generated-text occurrence of it.
//
// Built one top-level class at a time, possibly from many threads at once,
// and invalidated one class at a time. The map is sharded (`DashMap`) and
// each bucket carries its own lock, so indexing one class never blocks
// reads of unrelated nodes.
//
// Lock order is always map shard, then bucket. Appends happen while the
// shard entry is held so an invalidation sweep cannot retire a bucket
// between lookup and append.

mod record;

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tracing::{debug, warn};
use xref_graph::{
    ClassOutput, ClassUsageMap, GraphError, NodeId, NodeIdentity, PositionTranslator,
    ProgramGraph,
};

pub use record::{IndexOutcome, InvalidationStats, SkippedOccurrence, UsageBucket, UsageRecord};

use crate::config::{PublishMode, UsageSection};
use crate::error::{FailedClass, IndexError};

/// A record on its way into the index.
#[derive(Debug)]
struct PendingUsage {
    target: NodeIdentity,
    /// Top-level class declaring `target`.
    owner: NodeIdentity,
    record: UsageRecord,
}

#[derive(Debug, Default)]
pub struct UsageIndex {
    buckets: DashMap<NodeIdentity, Arc<UsageBucket>>,
    units: DashSet<NodeIdentity>,
    settings: UsageSection,
}

impl UsageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: UsageSection) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &UsageSection {
        &self.settings
    }

    // ── Building ───────────────────────────────────────────────────

    /// Index every reference occurrence of one top-level class.
    ///
    /// Occurrences on missing lines are skipped and reported; any other
    /// failure aborts the pass and is logged with the class identity.
    /// Other classes' records are never touched.
    pub fn index_class<T: PositionTranslator + ?Sized>(
        &self,
        graph: &ProgramGraph,
        class: NodeId,
        usage: &ClassUsageMap,
        lines: &[String],
        translator: &T,
    ) -> IndexOutcome {
        let unit = match top_level_identity(graph, class) {
            Ok(unit) => unit,
            Err(source) => {
                let error = IndexError::IndexingFailure {
                    class: FailedClass::Unresolved(class),
                    source,
                };
                warn!(class = %class, error = %error, "Usage indexing failed");
                return IndexOutcome::Failed {
                    published: 0,
                    error,
                };
            }
        };

        let pass = ClassPass {
            graph,
            class,
            unit: &unit,
            usage,
            lines,
            settings: &self.settings,
        };
        let mut skipped = Vec::new();
        let mut published = 0usize;

        let result = match self.settings.publish {
            PublishMode::Buffered => {
                let mut pending = Vec::new();
                let result = pass.run(translator, &mut skipped, &mut |u| pending.push(u));
                if result.is_ok() {
                    published = pending.len();
                    self.publish(pending);
                }
                result
            }
            PublishMode::Streaming => pass.run(translator, &mut skipped, &mut |u| {
                self.file(u);
                published += 1;
            }),
        };

        match result {
            Ok(()) => {
                self.units.insert(unit.clone());
                debug!(
                    class = %unit,
                    records = published,
                    skipped = skipped.len(),
                    "Indexed class usages"
                );
                if skipped.is_empty() {
                    IndexOutcome::Indexed { records: published }
                } else {
                    IndexOutcome::Partial {
                        records: published,
                        skipped,
                    }
                }
            }
            Err(source) => {
                if published > 0 {
                    self.units.insert(unit.clone());
                }
                let error = IndexError::IndexingFailure {
                    class: FailedClass::Identified(unit.clone()),
                    source,
                };
                warn!(class = %unit, published, error = %error, "Usage indexing failed");
                IndexOutcome::Failed { published, error }
            }
        }
    }

    /// Index one decompiled class using its own declaration lines.
    pub fn index_output(&self, graph: &ProgramGraph, output: &ClassOutput) -> IndexOutcome {
        self.index_class(
            graph,
            output.class,
            &output.usage,
            &output.lines,
            &output.declarations,
        )
    }

    /// Drop a class's previous contribution and index it again.
    pub fn reindex_output(
        &self,
        graph: &ProgramGraph,
        output: &ClassOutput,
    ) -> (InvalidationStats, IndexOutcome) {
        let stats = match graph.identity(output.class) {
            Ok(unit) => self.invalidate_class(&unit),
            Err(_) => InvalidationStats::default(),
        };
        (stats, self.index_output(graph, output))
    }

    fn publish(&self, pending: Vec<PendingUsage>) {
        let mut grouped: Vec<(NodeIdentity, NodeIdentity, Vec<UsageRecord>)> = Vec::new();
        let mut slots: HashMap<NodeIdentity, usize> = HashMap::new();
        for PendingUsage {
            target,
            owner,
            record,
        } in pending
        {
            if let Some(&slot) = slots.get(&target) {
                grouped[slot].2.push(record);
            } else {
                slots.insert(target.clone(), grouped.len());
                grouped.push((target, owner, vec![record]));
            }
        }
        for (target, owner, records) in grouped {
            self.buckets
                .entry(target)
                .or_insert_with(|| Arc::new(UsageBucket::new(owner)))
                .extend(records);
        }
    }

    fn file(&self, usage: PendingUsage) {
        let PendingUsage {
            target,
            owner,
            record,
        } = usage;
        self.buckets
            .entry(target)
            .or_insert_with(|| Arc::new(UsageBucket::new(owner)))
            .append(record);
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Every known usage of `node`; empty when none are known.
    pub fn query(&self, node: &NodeIdentity) -> Vec<UsageRecord> {
        let bucket = self.buckets.get(node).map(|entry| Arc::clone(entry.value()));
        bucket.map(|b| b.snapshot()).unwrap_or_default()
    }

    /// [`query`](Self::query) for a node of the current program graph.
    pub fn query_node(
        &self,
        graph: &ProgramGraph,
        node: NodeId,
    ) -> crate::error::Result<Vec<UsageRecord>> {
        Ok(self.query(&graph.identity(node)?))
    }

    pub fn contains(&self, node: &NodeIdentity) -> bool {
        self.buckets.contains_key(node)
    }

    /// Number of referenced nodes with a bucket.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|entry| entry.value().len()).sum()
    }

    /// Classes currently contributing records, sorted.
    pub fn indexed_classes(&self) -> Vec<NodeIdentity> {
        let mut classes: Vec<_> = self.units.iter().map(|c| c.key().clone()).collect();
        classes.sort();
        classes
    }

    // ── Invalidation ───────────────────────────────────────────────

    /// Remove everything `class` contributed and every bucket keyed by a
    /// node it declares, in one sweep. Each bucket is filtered under its own
    /// lock, so a concurrent query sees it either before or after.
    ///
    /// Dropping a bucket also drops the usages other classes recorded for
    /// that node. Re-indexing `class` alone does not bring them back; the
    /// referencing classes have to be re-indexed as well.
    pub fn invalidate_class(&self, class: &NodeIdentity) -> InvalidationStats {
        let mut stats = InvalidationStats::default();
        self.buckets.retain(|_, bucket| {
            if bucket.owner() == class {
                stats.removed_buckets += 1;
                stats.removed_records += bucket.len();
                return false;
            }
            let removed = bucket.remove_unit(class);
            stats.removed_records += removed;
            if removed > 0 && bucket.is_empty() {
                stats.removed_buckets += 1;
                return false;
            }
            true
        });
        self.units.remove(class);
        debug!(
            class = %class,
            removed_buckets = stats.removed_buckets,
            removed_records = stats.removed_records,
            "Invalidated class usages"
        );
        stats
    }

    pub fn clear(&self) {
        self.buckets.clear();
        self.units.clear();
    }
}

fn top_level_identity(graph: &ProgramGraph, class: NodeId) -> Result<NodeIdentity, GraphError> {
    if !graph.get(class)?.is_class() {
        return Err(GraphError::NotAClass(class));
    }
    if graph.owner(class).is_some() {
        return Err(GraphError::NotTopLevelClass(class));
    }
    graph.identity(class)
}

fn line_at(lines: &[String], line: u32) -> Result<&str, IndexError> {
    (line as usize)
        .checked_sub(1)
        .and_then(|idx| lines.get(idx))
        .map(String::as_str)
        .ok_or(IndexError::OutOfRangeLine {
            line,
            available: lines.len(),
        })
}

// ── One class pass ─────────────────────────────────────────────────

struct ClassPass<'a> {
    graph: &'a ProgramGraph,
    class: NodeId,
    unit: &'a NodeIdentity,
    usage: &'a ClassUsageMap,
    lines: &'a [String],
    settings: &'a UsageSection,
}

impl ClassPass<'_> {
    fn run<T: PositionTranslator + ?Sized>(
        &self,
        translator: &T,
        skipped: &mut Vec<SkippedOccurrence>,
        emit: &mut dyn FnMut(PendingUsage),
    ) -> Result<(), GraphError> {
        let graph = self.graph;
        for (position, referenced) in self.usage.iter() {
            let owner_class = graph.top_level_class(referenced)?;
            // The node's own declaration is not a usage.
            if owner_class == self.class
                && graph
                    .declaration(referenced)?
                    .is_some_and(|decl| decl.raw_offset == position.raw_offset)
            {
                continue;
            }
            let target = graph.identity(referenced)?;

            let line_text = match line_at(self.lines, position.line) {
                Ok(text) => text,
                Err(reason) => {
                    debug!(
                        class = %self.unit,
                        position = %position,
                        "Skipping occurrence: {reason}"
                    );
                    skipped.push(SkippedOccurrence { position, reason });
                    continue;
                }
            };
            if line_text.starts_with(&self.settings.import_prefix) {
                continue;
            }

            let referencing = translator
                .node_declaring_line(position.line)
                .unwrap_or(self.class);
            let record = UsageRecord {
                referencing_node: graph.identity(referencing)?,
                unit: self.unit.clone(),
                line_text: line_text.to_string(),
                line_number: position.line,
                raw_offset: position.raw_offset,
            };
            let owner = graph.identity(owner_class)?;

            if self.settings.constructor_class_usage && graph.get(referenced)?.is_constructor() {
                let declaring = graph.identity(graph.declaring_class(referenced)?)?;
                emit(PendingUsage {
                    target,
                    owner: owner.clone(),
                    record: record.clone(),
                });
                emit(PendingUsage {
                    target: declaring,
                    owner,
                    record,
                });
            } else {
                emit(PendingUsage {
                    target,
                    owner,
                    record,
                });
            }
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────
