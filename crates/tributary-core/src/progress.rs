//! Per-run progress accumulation
//!
//! Every pipeline stage owns a [`ProgressInformation`] and records messages,
//! warnings and errors against a nominal record index. Index 0 is reserved
//! for run-level issues. The routine merges all stages into one
//! [`ProgressReport`] by concatenation, so nothing a stage recorded is ever
//! overwritten, and the result is stable no matter how downloads interleave.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Index-keyed message channels owned by a single pipeline stage
#[derive(Debug, Clone, Default)]
pub struct ProgressInformation {
    messages: BTreeMap<usize, Vec<String>>,
    warnings: BTreeMap<usize, Vec<String>>,
    errors: BTreeMap<usize, Vec<String>>,
    rate_limits: BTreeMap<usize, Vec<String>>,
}

impl ProgressInformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, index: usize, message: impl Into<String>) {
        let message = message.into();
        debug!("Message at index {}: {}", index, message);
        self.messages.entry(index).or_default().push(message);
    }

    pub fn add_warning(&mut self, index: usize, warning: impl Into<String>) {
        let warning = warning.into();
        debug!("Warning at index {}: {}", index, warning);
        self.warnings.entry(index).or_default().push(warning);
    }

    pub fn add_error(&mut self, index: usize, error: impl Into<String>) {
        let error = error.into();
        debug!("Error at index {}: {}", index, error);
        self.errors.entry(index).or_default().push(error);
    }

    pub fn add_rate_limit(&mut self, index: usize, notice: impl Into<String>) {
        self.rate_limits.entry(index).or_default().push(notice.into());
    }

    pub fn messages(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.messages
    }

    pub fn warnings(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.warnings
    }

    pub fn errors(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.errors
    }

    pub fn rate_limits(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.rate_limits
    }
}

/// The combined report returned from one conversion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressReport {
    pub messages: BTreeMap<usize, Vec<String>>,
    pub warnings: BTreeMap<usize, Vec<String>>,
    pub errors: BTreeMap<usize, Vec<String>>,
    pub rate_limits: BTreeMap<usize, Vec<String>>,
}

impl ProgressReport {
    /// Merge stage channels into the report, in stage order, appending to
    /// whatever is already present at each index
    pub fn merge(&mut self, stages: &[&ProgressInformation]) {
        for stage in stages {
            merge_channel(&mut self.messages, stage.messages());
            merge_channel(&mut self.warnings, stage.warnings());
            merge_channel(&mut self.errors, stage.errors());
            merge_channel(&mut self.rate_limits, stage.rate_limits());
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }

    pub fn message_count(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }
}

fn merge_channel(
    target: &mut BTreeMap<usize, Vec<String>>,
    source: &BTreeMap<usize, Vec<String>>,
) {
    for (index, entries) in source {
        target
            .entry(*index)
            .or_default()
            .extend(entries.iter().cloned());
    }
}
