// Upload domain model - Selected file and the submission cycle
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use super::analysis::AnalysisResult;

#[derive(Debug, Clone)]
pub struct FileHandle {
    pub name: String,
    pub bytes: Bytes,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// A started submission: the file to send and the cycle it belongs to
#[derive(Debug, Clone)]
pub struct Submission {
    pub cycle: u64,
    pub file: FileHandle,
}

/// Per-view upload state.
///
/// Invariant: `phase == Submitting` implies `selected_file.is_some()`.
/// `cycle` advances whenever a submission starts; only a settle for the
/// current cycle leaves `Submitting`.
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    selected_file: Option<FileHandle>,
    phase: Phase,
    error: Option<String>,
    result: Option<Arc<AnalysisResult>>,
    cycle: u64,
}

impl UploadState {
    pub fn selected_file(&self) -> Option<&FileHandle> {
        self.selected_file.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&Arc<AnalysisResult>> {
        self.result.as_ref()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn can_submit(&self) -> bool {
        self.selected_file.is_some() && self.phase != Phase::Submitting
    }

    /// Select a file and clear any previous error. A submission in flight
    /// keeps running; the new file goes out with the next submit.
    pub fn select_file(&mut self, file: FileHandle) {
        self.selected_file = Some(file);
        self.error = None;
        if self.phase != Phase::Submitting {
            self.phase = Phase::Idle;
        }
    }

    /// Start a submission, or `None` when submit is currently disabled.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if !self.can_submit() {
            return None;
        }
        let file = self.selected_file.clone()?;

        self.cycle += 1;
        self.phase = Phase::Submitting;
        self.error = None;
        self.result = None;

        Some(Submission {
            cycle: self.cycle,
            file,
        })
    }

    /// Apply the outcome of a submission. Stale cycles and settles outside
    /// `Submitting` are ignored; returns whether the outcome was applied.
    pub fn settle(&mut self, cycle: u64, outcome: Result<Arc<AnalysisResult>, String>) -> bool {
        if cycle != self.cycle || self.phase != Phase::Submitting {
            return false;
        }

        match outcome {
            Ok(result) => {
                self.phase = Phase::Succeeded;
                self.result = Some(result);
            }
            Err(message) => {
                self.phase = Phase::Failed;
                self.error = Some(message);
            }
        }
        true
    }
}
