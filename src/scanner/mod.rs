pub mod listing;
pub mod midi;

use crate::MIDI_EXTENSIONS;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source library not found: {0}")]
    MissingRoot(String),
    #[error("Listing error: {0}")]
    Csv(#[from] csv::Error),
}

/// A MIDI file found under the source root.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    /// File name without extension.
    pub base_name: String,
    /// Path relative to the working directory (absolute if outside it).
    pub path: PathBuf,
    /// Base name is a single whitespace-delimited token.
    pub is_simple: bool,
}

/// Everything a walk of the source tree turned up, in traversal order.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    /// Candidates rejected by header probing (only with `verify_midi`).
    pub rejected: Vec<PathBuf>,
    /// MIDI files left out because their path is not valid UTF-8 and so
    /// cannot be written to the listing and read back.
    pub non_utf8: Vec<PathBuf>,
}

impl Discovery {
    pub fn simple(&self) -> impl Iterator<Item = &DiscoveredFile> {
        self.files.iter().filter(|f| f.is_simple)
    }

    pub fn simple_count(&self) -> usize {
        self.simple().count()
    }
}

/// True if the name is one token when split on whitespace.
pub fn is_simple_name(name: &str) -> bool {
    name.split_whitespace().count() == 1
}

/// Express `path` relative to `base`, falling back to `path` itself.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn has_midi_extension(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    MIDI_EXTENSIONS.contains(&ext.as_str())
}

/// Walk `root` for MIDI files. Paths are recorded relative to `base`.
///
/// With `verify` set, each candidate's header is parsed and non-SMF files are
/// left out (and listed in `rejected`).
pub fn discover(root: &Path, base: &Path, verify: bool) -> std::result::Result<Discovery, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.display().to_string()));
    }

    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root).follow_links(true).into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_midi_extension(entry.path()) {
            continue;
        }

        let path = entry.path();
        if verify {
            if let Err(e) = midi::probe(path) {
                log::warn!("Not a MIDI file, skipping {}: {}", path.display(), e);
                discovery.rejected.push(path.to_path_buf());
                continue;
            }
        }

        let relative = relative_to(path, base);
        let base_name = match (path.file_stem().and_then(|s| s.to_str()), relative.to_str()) {
            (Some(stem), Some(_)) => stem.to_string(),
            _ => {
                log::warn!("Skipping non-UTF-8 path: {}", path.display());
                discovery.non_utf8.push(path.to_path_buf());
                continue;
            }
        };
        let is_simple = is_simple_name(&base_name);
        log::trace!("Found {} (simple: {})", path.display(), is_simple);

        discovery.files.push(DiscoveredFile {
            base_name,
            path: relative,
            is_simple,
        });
    }

    log::info!(
        "Discovered {} MIDI files ({} simple) under {}",
        discovery.files.len(),
        discovery.simple_count(),
        root.display()
    );

    Ok(discovery)
}
