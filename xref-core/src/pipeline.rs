// Batch indexing: many decompiled classes into one usage index, in parallel,
// with per-class outcome collection.

use rayon::prelude::*;
use tracing::{info, warn};
use xref_graph::{ClassOutput, NodeId, ProgramGraph};

use crate::config::XrefConfig;
use crate::progress::{IndicatifReporter, NoopReporter, ProgressReporter};
use crate::usage::{IndexOutcome, UsageIndex};

/// Outcome of indexing one class within a batch.
#[derive(Debug, Clone)]
pub struct ClassReport {
    pub class: NodeId,
    pub outcome: IndexOutcome,
}

/// Per-class outcomes of one batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub reports: Vec<ClassReport>,
}

impl BatchReport {
    pub fn indexed(&self) -> usize {
        self.count(|o| matches!(o, IndexOutcome::Indexed { .. }))
    }

    pub fn partial(&self) -> usize {
        self.count(|o| matches!(o, IndexOutcome::Partial { .. }))
    }

    pub fn failures(&self) -> Vec<&ClassReport> {
        self.reports.iter().filter(|r| r.outcome.is_failed()).collect()
    }

    /// Records that reached the index across the batch.
    pub fn records(&self) -> usize {
        self.reports.iter().map(|r| r.outcome.records()).sum()
    }

    fn count(&self, pred: impl Fn(&IndexOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Drives a usage index over batches of decompiled classes.
#[derive(Debug, Default)]
pub struct IndexPipeline {
    config: XrefConfig,
}

impl IndexPipeline {
    pub fn new(config: XrefConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &XrefConfig {
        &self.config
    }

    /// An empty index using this pipeline's usage settings.
    pub fn new_index(&self) -> UsageIndex {
        UsageIndex::with_settings(self.config.usage.clone())
    }

    /// A progress bar when `[indexing] show_progress` is set, otherwise silent.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        if self.config.indexing.show_progress {
            Box::new(IndicatifReporter::new())
        } else {
            Box::new(NoopReporter)
        }
    }

    /// Index every class in parallel. A failing class is reported and the
    /// rest of the batch carries on.
    pub fn run(
        &self,
        index: &UsageIndex,
        graph: &ProgramGraph,
        outputs: &[ClassOutput],
        reporter: &dyn ProgressReporter,
    ) -> BatchReport {
        self.batch("Indexing usages", outputs, reporter, |output| {
            index.index_output(graph, output)
        })
    }

    /// Invalidate and re-index each class, e.g. after re-decompilation.
    pub fn reindex(
        &self,
        index: &UsageIndex,
        graph: &ProgramGraph,
        outputs: &[ClassOutput],
        reporter: &dyn ProgressReporter,
    ) -> BatchReport {
        self.batch("Re-indexing usages", outputs, reporter, |output| {
            index.reindex_output(graph, output).1
        })
    }

    fn batch<F>(
        &self,
        task: &str,
        outputs: &[ClassOutput],
        reporter: &dyn ProgressReporter,
        index_one: F,
    ) -> BatchReport
    where
        F: Fn(&ClassOutput) -> IndexOutcome + Sync,
    {
        reporter.batch_started(task, outputs.len());
        let work = || {
            outputs
                .par_iter()
                .map(|output| {
                    let outcome = index_one(output);
                    reporter.class_indexed(output.class, &outcome);
                    ClassReport {
                        class: output.class,
                        outcome,
                    }
                })
                .collect::<Vec<_>>()
        };

        let reports = match self.config.indexing.threads {
            0 => work(),
            threads => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(work),
                Err(e) => {
                    warn!(threads, error = %e, "Cannot build indexing pool, using global pool");
                    work()
                }
            },
        };
        let report = BatchReport { reports };
        let failed = report.failures().len();
        reporter.batch_finished(failed);
        info!(
            classes = outputs.len(),
            indexed = report.indexed(),
            partial = report.partial(),
            failed,
            records = report.records(),
            "{task} complete"
        );
        report
    }
}
