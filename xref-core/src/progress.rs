//! Progress reporting for batch indexing.
//!
//! A batch announces its size, then one event per class as each finishes
//! (in completion order, from worker threads), then a closing summary.

use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use xref_graph::NodeId;

use crate::usage::IndexOutcome;

pub trait ProgressReporter: Send + Sync {
    fn batch_started(&self, task: &str, classes: usize);

    /// Called once per class, possibly concurrently.
    fn class_indexed(&self, class: NodeId, outcome: &IndexOutcome);

    fn batch_finished(&self, failed: usize);
}

#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn batch_started(&self, _task: &str, _classes: usize) {}
    fn class_indexed(&self, _class: NodeId, _outcome: &IndexOutcome) {}
    fn batch_finished(&self, _failed: usize) {}
}

/// Progress bar over the classes of a batch. Failed classes are printed
/// above the bar as they happen.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    failed: AtomicUsize,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    /// Draws to stderr.
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            failed: AtomicUsize::new(0),
        }
    }

    pub fn classes_done(&self) -> u64 {
        self.bar.position()
    }

    /// Failures seen since the last `batch_started`.
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for IndicatifReporter {
    fn batch_started(&self, task: &str, classes: usize) {
        self.failed.store(0, Ordering::Relaxed);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} classes ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        self.bar.set_style(style);
        self.bar.set_length(classes as u64);
        self.bar.set_message(task.to_string());
        self.bar.reset();
    }

    fn class_indexed(&self, class: NodeId, outcome: &IndexOutcome) {
        if let IndexOutcome::Failed { error, .. } = outcome {
            self.failed.fetch_add(1, Ordering::Relaxed);
            self.bar.println(format!("class {class}: {error}"));
        }
        self.bar.inc(1);
    }

    fn batch_finished(&self, failed: usize) {
        self.bar.finish_and_clear();
        if failed > 0 {
            self.bar.println(format!("{failed} classes failed usage indexing"));
        }
    }
}
