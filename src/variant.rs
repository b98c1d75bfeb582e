//! Soft-pedal variant classification and staging.
//!
//! Every roll is recorded twice, once with simulated soft pedal (`…emP`) and
//! once without (`…emR`). The variant code is the last three characters of
//! the file stem; the extension is never part of the check.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use thiserror::Error;

use crate::layout::LibraryLayout;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: String,
        to: String,
        source: std::io::Error,
    },
    #[error("Path has no usable file stem: {0}")]
    BadPath(String),
}

/// Which of the two encodings of a roll a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Variant {
    WithSoftPedal,
    WithoutSoftPedal,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::WithSoftPedal, Variant::WithoutSoftPedal];

    /// Filename suffix carried by this variant.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::WithSoftPedal => "emP",
            Self::WithoutSoftPedal => "emR",
        }
    }
}

/// Split a stem into `(roll identifier, variant)`.
/// Stems without a recognized suffix come back whole with `None`.
pub fn split_variant(stem: &str) -> (&str, Option<Variant>) {
    for variant in Variant::ALL {
        if let Some(base) = stem.strip_suffix(variant.suffix()) {
            return (base, Some(variant));
        }
    }
    (stem, None)
}

/// Classify a path by its stem's suffix.
pub fn classify_path(path: &Path) -> Option<Variant> {
    let stem = path.file_stem()?.to_str()?;
    split_variant(stem).1
}

/// Name a staged copy: original stem, normalized extension.
pub fn staged_name(stem: &str) -> String {
    format!("{stem}.{}", crate::OUTPUT_EXTENSION)
}

/// One file copied into staging.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub source: PathBuf,
    pub staged: PathBuf,
    pub variant: Variant,
}

#[derive(Debug, Default)]
pub struct StageResult {
    pub staged: Vec<StagedFile>,
    /// Listed files whose stem carries neither variant code.
    pub unclassified: Vec<PathBuf>,
}

impl StageResult {
    pub fn count(&self, variant: Variant) -> usize {
        self.staged.iter().filter(|s| s.variant == variant).count()
    }
}

/// Copy each listed file into the staging folder for its variant.
///
/// `base` resolves relative listing paths. Unclassified files are skipped
/// with a warning; a failed copy aborts.
pub fn stage_files(
    paths: &[PathBuf],
    base: &Path,
    layout: &LibraryLayout,
) -> std::result::Result<StageResult, StageError> {
    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Staging...");

    let mut result = StageResult::default();

    for path in paths {
        pb.inc(1);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StageError::BadPath(path.display().to_string()))?;

        let Some(variant) = split_variant(stem).1 else {
            log::warn!("No variant suffix on {}, not staged", path.display());
            result.unclassified.push(path.clone());
            continue;
        };

        let source = if path.is_absolute() { path.clone() } else { base.join(path) };
        let staged = layout.staging_dir(variant).join(staged_name(stem));

        fs::copy(&source, &staged).map_err(|e| StageError::Copy {
            from: source.display().to_string(),
            to: staged.display().to_string(),
            source: e,
        })?;
        log::debug!("Staged {} -> {}", source.display(), staged.display());

        result.staged.push(StagedFile {
            source,
            staged,
            variant,
        });
    }

    pb.finish_with_message(format!(
        "Staged: {} with soft pedal, {} without, {} unclassified",
        result.count(Variant::WithSoftPedal),
        result.count(Variant::WithoutSoftPedal),
        result.unclassified.len()
    ));

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn split_known_suffixes() {
        assert_eq!(
            split_variant("BeethovenSonataemR"),
            ("BeethovenSonata", Some(Variant::WithoutSoftPedal))
        );
        assert_eq!(
            split_variant("BeethovenSonataemP"),
            ("BeethovenSonata", Some(Variant::WithSoftPedal))
        );
    }

    #[test]
    fn split_is_case_sensitive_on_suffix() {
        assert_eq!(split_variant("Sonataemr"), ("Sonataemr", None));
        assert_eq!(split_variant("SonataEMP"), ("SonataEMP", None));
    }

    #[test]
    fn split_short_and_bare_stems() {
        assert_eq!(split_variant("em"), ("em", None));
        assert_eq!(split_variant("emR"), ("", Some(Variant::WithoutSoftPedal)));
        assert_eq!(split_variant("Waltz"), ("Waltz", None));
    }

    #[test]
    fn classify_ignores_extension_case_and_directories() {
        assert_eq!(
            classify_path(Path::new("a/very/long/dir/XemP.MID")),
            Some(Variant::WithSoftPedal)
        );
        assert_eq!(classify_path(Path::new("XemR.mid")), Some(Variant::WithoutSoftPedal));
        assert_eq!(classify_path(Path::new("emR.mid/Waltz.mid")), None);
    }

    fn write(path: &Path, body: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn stage_partitions_by_variant() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("src/a/RollemP.mid"), b"p");
        write(&tmp.path().join("src/b/RollemR.MID"), b"r");
        write(&tmp.path().join("src/Other.mid"), b"o");

        let layout = LibraryLayout::new(tmp.path(), "library", "t");
        layout.bootstrap().unwrap();

        let paths = vec![
            PathBuf::from("src/a/RollemP.mid"),
            PathBuf::from("src/b/RollemR.MID"),
            PathBuf::from("src/Other.mid"),
        ];
        let result = stage_files(&paths, tmp.path(), &layout).unwrap();

        assert_eq!(result.count(Variant::WithSoftPedal), 1);
        assert_eq!(result.count(Variant::WithoutSoftPedal), 1);
        assert_eq!(result.unclassified, vec![PathBuf::from("src/Other.mid")]);

        let soft = layout.staging_dir(Variant::WithSoftPedal).join("RollemP.mid");
        let plain = layout.staging_dir(Variant::WithoutSoftPedal).join("RollemR.mid");
        assert_eq!(fs::read(soft).unwrap(), b"p");
        assert_eq!(fs::read(plain).unwrap(), b"r");
        // Source untouched
        assert!(tmp.path().join("src/b/RollemR.MID").exists());
    }

    #[test]
    fn staging_is_deterministic_across_roots() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("src/XemP.mid"), b"1");
        write(&tmp.path().join("src/XemR.mid"), b"2");
        write(&tmp.path().join("src/YemR.mid"), b"3");
        let paths = vec![
            PathBuf::from("src/XemP.mid"),
            PathBuf::from("src/XemR.mid"),
            PathBuf::from("src/YemR.mid"),
        ];

        let listing = |layout: &LibraryLayout| {
            let mut names = Vec::new();
            for variant in Variant::ALL {
                for entry in fs::read_dir(layout.staging_dir(variant)).unwrap() {
                    let entry = entry.unwrap();
                    names.push((variant, entry.file_name(), fs::read(entry.path()).unwrap()));
                }
            }
            names.sort();
            names
        };

        let first = LibraryLayout::new(tmp.path(), "library", "1");
        first.bootstrap().unwrap();
        stage_files(&paths, tmp.path(), &first).unwrap();

        let second = LibraryLayout::new(tmp.path(), "library", "2");
        second.bootstrap().unwrap();
        stage_files(&paths, tmp.path(), &second).unwrap();

        assert_eq!(listing(&first), listing(&second));
    }

    #[test]
    fn missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let layout = LibraryLayout::new(tmp.path(), "library", "t");
        layout.bootstrap().unwrap();
        let err = stage_files(&[PathBuf::from("nope/GoneemR.mid")], tmp.path(), &layout);
        assert!(matches!(err, Err(StageError::Copy { .. })));
    }
}
