use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::variant::Variant;

/// Staging area, split by soft-pedal variant.
pub const FILES_RAW_DIR: &str = "filesRaw";
pub const WITH_SOFT_DIR: &str = "withSoft";
pub const WITHOUT_SOFT_DIR: &str = "withoutSoft";
/// Final composer/pianist/title tree.
pub const SORTED_DIR: &str = "filesSorted";
/// Listing of simple-named source files (base name, relative path).
pub const LISTING_FILE: &str = "libraryNew.csv";

/// Format a run timestamp as `YYYYMMDD-HHMMSS`.
pub fn run_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}

/// Paths of one generated library tree.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    pub root: PathBuf,
}

impl LibraryLayout {
    /// Layout rooted at `<parent>/<prefix><stamp>`.
    pub fn new(parent: &Path, prefix: &str, stamp: &str) -> Self {
        Self {
            root: parent.join(format!("{prefix}{stamp}")),
        }
    }

    pub fn files_raw(&self) -> PathBuf {
        self.root.join(FILES_RAW_DIR)
    }

    /// Staging folder for one variant.
    pub fn staging_dir(&self, variant: Variant) -> PathBuf {
        let leaf = match variant {
            Variant::WithSoftPedal => WITH_SOFT_DIR,
            Variant::WithoutSoftPedal => WITHOUT_SOFT_DIR,
        };
        self.files_raw().join(leaf)
    }

    pub fn sorted(&self) -> PathBuf {
        self.root.join(SORTED_DIR)
    }

    pub fn listing(&self) -> PathBuf {
        self.root.join(LISTING_FILE)
    }

    /// Re-exported metadata lands next to the listing, named after the spreadsheet.
    pub fn metadata_export(&self, metadata_file: &str) -> PathBuf {
        self.root.join(format!("{metadata_file}.csv"))
    }

    /// Create the skeleton: staging folders and the sorted root.
    /// Existing directories are left alone.
    pub fn bootstrap(&self) -> io::Result<()> {
        for dir in [
            self.staging_dir(Variant::WithSoftPedal),
            self.staging_dir(Variant::WithoutSoftPedal),
            self.sorted(),
        ] {
            fs::create_dir_all(&dir)?;
            log::debug!("Created {}", dir.display());
        }
        Ok(())
    }
}
