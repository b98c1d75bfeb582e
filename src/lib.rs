pub mod config;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod placer;
pub mod report;
pub mod scanner;
pub mod variant;

/// MIDI file extensions we pick up (compared case-insensitively)
pub const MIDI_EXTENSIONS: &[&str] = &["mid"];

/// Extension used for every file written into the library tree
pub const OUTPUT_EXTENSION: &str = "mid";

/// Application name for XDG paths
pub const APP_NAME: &str = "rollsort";
