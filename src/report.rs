use std::path::PathBuf;

use serde::Serialize;

use crate::placer::{FileOutcome, FileReport, PlacementReport};
use crate::scanner::Discovery;
use crate::variant::{StageResult, Variant};

/// Per-outcome counts over one placement pass.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PlacementTally {
    pub placed: usize,
    /// Files written into the sorted tree (fan-out can write several per roll).
    pub copies: usize,
    pub missing_staged: usize,
    pub filtered: usize,
    pub unmatched: usize,
    pub conflicts: usize,
    pub already_handled: usize,
}

impl PlacementTally {
    pub fn from_files(files: &[FileReport]) -> Self {
        let mut tally = Self::default();
        for file in files {
            match &file.outcome {
                FileOutcome::Placed { destinations } => {
                    tally.placed += 1;
                    tally.copies += destinations.len();
                }
                FileOutcome::MissingStaged { .. } => tally.missing_staged += 1,
                FileOutcome::Filtered { .. } => tally.filtered += 1,
                FileOutcome::Unmatched => tally.unmatched += 1,
                FileOutcome::Conflict { .. } => tally.conflicts += 1,
                FileOutcome::AlreadyHandled => tally.already_handled += 1,
            }
        }
        tally
    }
}

/// Everything a run did, for printing or `--json`.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub output_root: PathBuf,
    pub discovered: usize,
    pub simple: usize,
    pub rejected_non_midi: usize,
    /// MIDI files skipped because their path is not valid UTF-8.
    pub skipped_non_utf8: Vec<PathBuf>,
    pub metadata_rows: usize,
    pub staged_with_soft: usize,
    pub staged_without_soft: usize,
    pub unclassified: Vec<PathBuf>,
    pub composer_dirs: usize,
    pub tally: PlacementTally,
    /// Base filenames matched in the metadata with no staged copy to place.
    pub not_found: Vec<String>,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn new(
        output_root: PathBuf,
        discovery: &Discovery,
        metadata_rows: usize,
        staged: StageResult,
        placement: PlacementReport,
    ) -> Self {
        Self {
            output_root,
            discovered: discovery.files.len(),
            simple: discovery.simple_count(),
            rejected_non_midi: discovery.rejected.len(),
            skipped_non_utf8: discovery.non_utf8.clone(),
            metadata_rows,
            staged_with_soft: staged.count(Variant::WithSoftPedal),
            staged_without_soft: staged.count(Variant::WithoutSoftPedal),
            unclassified: staged.unclassified,
            composer_dirs: placement.composer_dirs,
            tally: PlacementTally::from_files(&placement.files),
            not_found: placement.not_found,
            files: placement.files,
        }
    }

    /// The bare progress lines a plain-text run prints ahead of the summary:
    /// the simple-file count, one `file not found: <name>` per missing staged
    /// copy, then the metadata row count.
    pub fn progress_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.not_found.len() + 2);
        lines.push(self.simple.to_string());
        lines.extend(self.not_found.iter().map(|name| format!("file not found: {name}")));
        lines.push(self.metadata_rows.to_string());
        lines
    }

    /// Human-readable multi-line summary.
    pub fn render(&self) -> String {
        let t = &self.tally;
        let mut out = String::new();
        out.push_str(&format!("Library:     {}\n", self.output_root.display()));
        out.push_str(&format!(
            "Discovered:  {} MIDI files, {} simple",
            self.discovered, self.simple
        ));
        if self.rejected_non_midi > 0 {
            out.push_str(&format!(", {} rejected (not MIDI)", self.rejected_non_midi));
        }
        if !self.skipped_non_utf8.is_empty() {
            out.push_str(&format!(", {} skipped (non-UTF-8 path)", self.skipped_non_utf8.len()));
        }
        out.push('\n');
        out.push_str(&format!(
            "Staged:      {} with soft pedal, {} without, {} unclassified\n",
            self.staged_with_soft,
            self.staged_without_soft,
            self.unclassified.len()
        ));
        out.push_str(&format!(
            "Metadata:    {} rows, {} composer folders\n",
            self.metadata_rows, self.composer_dirs
        ));
        out.push_str(&format!(
            "Placement:   {} placed ({} files), {} missing staged copy, {} filtered by manufacturer, \
             {} unmatched, {} conflicting, {} other variant already handled\n",
            t.placed,
            t.copies,
            t.missing_staged,
            t.filtered,
            t.unmatched,
            t.conflicts,
            t.already_handled
        ));
        out
    }
}
