use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::placer::DuplicatePolicy;

/// Application configuration loaded from TOML config file.
/// All fields have defaults matching the stock library layout; the config file is optional.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Directory the source library lives in and the output root is created in.
    /// Defaults to the current working directory.
    pub work_dir: Option<PathBuf>,
    /// Source library folder, relative to `work_dir` unless absolute.
    pub source_dir: PathBuf,
    /// Folder inside the source library holding the metadata spreadsheet.
    pub metadata_dir: String,
    /// Spreadsheet file name without extension.
    pub metadata_file: String,
    /// Spreadsheet extension (xlsx, xls, ods, csv, tsv).
    pub metadata_extension: String,
    /// Explicit spreadsheet path; replaces the dir/file/extension triple.
    #[serde(rename = "metadata_path")]
    pub metadata_override: Option<PathBuf>,
    /// Output root is `<output_prefix><YYYYMMDD-HHMMSS>`.
    pub output_prefix: String,
    /// Roll manufacturers whose records are placed in the sorted tree.
    pub manufacturers: Vec<String>,
    /// What to do when several metadata rows share one base filename.
    pub duplicate_policy: DuplicatePolicy,
    /// Parse each MIDI header during discovery and skip files that aren't SMF.
    pub verify_midi: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            source_dir: PathBuf::from("libraryOriginal"),
            metadata_dir: "DOCUMENTATION".to_string(),
            metadata_file: "All_Rolls_modified".to_string(),
            metadata_extension: "xlsx".to_string(),
            metadata_override: None,
            output_prefix: "library".to_string(),
            manufacturers: crate::metadata::Manufacturer::RECOGNIZED
                .iter()
                .map(|m| m.to_string())
                .collect(),
            duplicate_policy: DuplicatePolicy::default(),
            verify_midi: false,
        }
    }
}

impl AppConfig {
    /// Load config from an explicit path, or `~/.config/rollsort/config.toml`.
    /// Returns default config if the file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load(explicit: Option<&Path>) -> Self {
        let config_path = explicit.map(Path::to_path_buf).or_else(Self::config_path);
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Some(path) if explicit.is_some() => {
                log::warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the working directory: config value, else the process cwd.
    pub fn resolve_work_dir(&self) -> std::io::Result<PathBuf> {
        match &self.work_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }

    /// Source library root under `work_dir`.
    pub fn source_root(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.source_dir)
    }

    /// Full path of the metadata spreadsheet.
    pub fn metadata_path(&self, work_dir: &Path) -> PathBuf {
        if let Some(path) = &self.metadata_override {
            return work_dir.join(path);
        }
        self.source_root(work_dir)
            .join(&self.metadata_dir)
            .join(format!("{}.{}", self.metadata_file, self.metadata_extension.trim_start_matches('.')))
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
