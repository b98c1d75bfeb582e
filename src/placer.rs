//! Match staged rolls against metadata and file them as
//! `filesSorted/<composer>/<pianist>/<title>.mid`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::LibraryLayout;
use crate::metadata::{Manufacturer, MetadataRecord, MetadataTable};
use crate::scanner::DiscoveredFile;
use crate::variant::{Variant, split_variant, staged_name};

#[derive(Error, Debug)]
pub enum PlaceError {
    #[error("Failed to create {path}: {source}")]
    CreateDir { path: String, source: std::io::Error },
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: String,
        to: String,
        source: std::io::Error,
    },
}

/// How to treat several metadata rows naming the same base filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Place once per row.
    #[default]
    FanOut,
    /// Place only the last row.
    LastWins,
    /// Place nothing and report a conflict.
    Error,
}

/// Base filename → row indices, in table order.
#[derive(Debug, Default)]
pub struct MetadataIndex<'a> {
    by_name: HashMap<&'a str, Vec<usize>>,
}

impl<'a> MetadataIndex<'a> {
    /// Rows with an empty filename cell are not indexed.
    pub fn build(table: &'a MetadataTable) -> Self {
        let mut by_name: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (i, name) in table.base_filenames.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            by_name.entry(name.as_str()).or_default().push(i);
        }
        Self { by_name }
    }

    pub fn rows(&self, base_filename: &str) -> &[usize] {
        self.by_name.get(base_filename).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Base filenames claimed by more than one row.
    pub fn duplicates(&self) -> usize {
        self.by_name.values().filter(|rows| rows.len() > 1).count()
    }
}

// Separators and characters most filesystems refuse in a name
static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1F]"#).unwrap());

/// Make a metadata value usable as a single path component.
pub fn sanitize_component(value: &str) -> String {
    let cleaned = UNSAFE_CHARS_RE.replace_all(value.trim(), "_").into_owned();
    match cleaned.as_str() {
        "" => "Unknown".to_string(),
        "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Final path for a record inside the sorted root.
pub fn destination(sorted_root: &Path, record: &MetadataRecord) -> PathBuf {
    sorted_root
        .join(sanitize_component(&record.composer))
        .join(sanitize_component(&record.pianist))
        .join(format!(
            "{}.{}",
            sanitize_component(&record.title),
            crate::OUTPUT_EXTENSION
        ))
}

/// Where the promotable (no soft pedal) copy of a roll sits in staging.
pub fn staged_source(layout: &LibraryLayout, base_filename: &str) -> PathBuf {
    let stem = format!("{base_filename}{}", Variant::WithoutSoftPedal.suffix());
    layout
        .staging_dir(Variant::WithoutSoftPedal)
        .join(staged_name(&stem))
}

/// What happened to one discovered file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Placed { destinations: Vec<PathBuf> },
    /// Matched a recognized row but the staged copy wasn't there.
    MissingStaged { base_filename: String },
    /// Matched only rows from manufacturers outside the recognized set.
    Filtered { manufacturers: Vec<String> },
    Unmatched,
    /// Several rows share the name and the policy forbids guessing.
    Conflict { rows: usize },
    /// Another variant of the same roll was placed, or found missing, earlier this run.
    AlreadyHandled,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub candidate: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Default)]
pub struct PlacementReport {
    pub composer_dirs: usize,
    pub files: Vec<FileReport>,
    /// Base filenames that matched a recognized row but had no staged copy.
    pub not_found: Vec<String>,
}

pub struct Placer<'a> {
    table: &'a MetadataTable,
    index: MetadataIndex<'a>,
    layout: &'a LibraryLayout,
    recognized: &'a [Manufacturer],
    policy: DuplicatePolicy,
    handled: HashSet<String>,
}

impl<'a> Placer<'a> {
    pub fn new(
        table: &'a MetadataTable,
        layout: &'a LibraryLayout,
        recognized: &'a [Manufacturer],
        policy: DuplicatePolicy,
    ) -> Self {
        let index = MetadataIndex::build(table);
        if index.duplicates() > 0 {
            log::warn!(
                "{} base filenames appear in more than one metadata row ({:?} policy)",
                index.duplicates(),
                policy
            );
        }
        Self {
            table,
            index,
            layout,
            recognized,
            policy,
            handled: HashSet::new(),
        }
    }

    /// Pre-create `filesSorted/<composer>` for every composer in the table.
    pub fn create_composer_dirs(&self) -> std::result::Result<usize, PlaceError> {
        let mut created = 0;
        for composer in self.table.distinct_composers() {
            if composer.trim().is_empty() {
                continue;
            }
            let dir = self.layout.sorted().join(sanitize_component(composer));
            create_dir(&dir)?;
            created += 1;
        }
        log::info!("Prepared {} composer folders", created);
        Ok(created)
    }

    /// Run every file through matching and placement.
    pub fn place_all<'f>(
        &mut self,
        files: impl IntoIterator<Item = &'f DiscoveredFile>,
    ) -> std::result::Result<PlacementReport, PlaceError> {
        let mut report = PlacementReport {
            composer_dirs: self.create_composer_dirs()?,
            files: Vec::new(),
            not_found: Vec::new(),
        };
        for file in files {
            let candidate = split_variant(&file.base_name).0.to_string();
            let outcome = self.place_candidate(&candidate)?;
            if let FileOutcome::MissingStaged { base_filename } = &outcome {
                report.not_found.push(base_filename.clone());
            }
            report.files.push(FileReport {
                path: file.path.clone(),
                candidate,
                outcome,
            });
        }
        Ok(report)
    }

    /// Match one roll identifier and copy its staged file wherever it belongs.
    ///
    /// Only a placement or a missing staged copy marks the roll as handled;
    /// unmatched, filtered and conflicting candidates are reported per file.
    pub fn place_candidate(&mut self, candidate: &str) -> std::result::Result<FileOutcome, PlaceError> {
        if self.handled.contains(candidate) {
            return Ok(FileOutcome::AlreadyHandled);
        }

        let rows = self.index.rows(candidate);
        let selected: &[usize] = match (rows.len(), self.policy) {
            (0, _) => {
                log::info!("No metadata for {}", candidate);
                return Ok(FileOutcome::Unmatched);
            }
            (1, _) | (_, DuplicatePolicy::FanOut) => rows,
            (_, DuplicatePolicy::LastWins) => &rows[rows.len() - 1..],
            (n, DuplicatePolicy::Error) => {
                log::warn!("{} metadata rows name {}, skipping", n, candidate);
                return Ok(FileOutcome::Conflict { rows: n });
            }
        };

        let mut destinations = Vec::new();
        let mut filtered = Vec::new();
        let mut missing = None;

        for &i in selected {
            let Some(record) = self.table.record(i) else {
                continue;
            };
            if !self.recognized.contains(&record.manufacturer) {
                log::info!(
                    "Skipping {} row {}: manufacturer {:?} not recognized",
                    candidate,
                    i,
                    record.manufacturer.to_string()
                );
                filtered.push(record.manufacturer.to_string());
                continue;
            }

            let dest = destination(&self.layout.sorted(), &record);
            if let Some(parent) = dest.parent() {
                create_dir(parent)?;
            }

            let source = staged_source(self.layout, &record.base_filename);
            if !source.is_file() {
                log::warn!("Staged file missing: {}", source.display());
                missing = Some(record.base_filename.clone());
                continue;
            }

            fs::copy(&source, &dest).map_err(|e| PlaceError::Copy {
                from: source.display().to_string(),
                to: dest.display().to_string(),
                source: e,
            })?;
            log::debug!("Placed {} -> {}", source.display(), dest.display());
            destinations.push(dest);
        }

        let outcome = if !destinations.is_empty() {
            FileOutcome::Placed { destinations }
        } else if let Some(base_filename) = missing {
            FileOutcome::MissingStaged { base_filename }
        } else {
            return Ok(FileOutcome::Filtered {
                manufacturers: filtered,
            });
        };
        self.handled.insert(candidate.to_string());
        Ok(outcome)
    }
}

fn create_dir(dir: &Path) -> std::result::Result<(), PlaceError> {
    fs::create_dir_all(dir).map_err(|e| PlaceError::CreateDir {
        path: dir.display().to_string(),
        source: e,
    })
}
