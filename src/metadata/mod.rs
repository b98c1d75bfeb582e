pub mod spreadsheet;

use std::fmt;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata file not found: {0}")]
    Missing(String),
    #[error("Unsupported metadata format: {0}")]
    UnsupportedFormat(String),
    #[error("Workbook has no sheets: {0}")]
    NoSheet(String),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Roll manufacturer as written in the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Manufacturer {
    Ampico,
    DuoArt,
    WelteT100,
    WelteLicensee,
    Other(String),
}

impl Manufacturer {
    /// Reproducing-piano systems the library is sorted for by default.
    pub const RECOGNIZED: [Manufacturer; 4] = [
        Manufacturer::Ampico,
        Manufacturer::DuoArt,
        Manufacturer::WelteT100,
        Manufacturer::WelteLicensee,
    ];

    /// Exact-match parse; anything unfamiliar is kept verbatim.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Ampico" => Self::Ampico,
            "Duo-Art" => Self::DuoArt,
            "Welte-T-100" => Self::WelteT100,
            "Welte-Licensee" => Self::WelteLicensee,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ampico => f.write_str("Ampico"),
            Self::DuoArt => f.write_str("Duo-Art"),
            Self::WelteT100 => f.write_str("Welte-T-100"),
            Self::WelteLicensee => f.write_str("Welte-Licensee"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub title: String,
    pub composer: String,
    pub pianist: String,
    pub manufacturer: Manufacturer,
    pub roll_number: String,
    pub base_filename: String,
}

/// Column-addressable metadata: six index-aligned columns.
/// Record `i` lives at index `i` of every column.
#[derive(Debug, Default, Clone)]
pub struct MetadataTable {
    pub titles: Vec<String>,
    pub composers: Vec<String>,
    pub pianists: Vec<String>,
    pub manufacturers: Vec<String>,
    pub roll_numbers: Vec<String>,
    pub base_filenames: Vec<String>,
}

/// Number of columns the loader reads, in order.
pub const COLUMN_COUNT: usize = 6;

impl MetadataTable {
    /// Append a row. Short rows are padded with empty fields, extra cells ignored.
    pub fn push_row<S: AsRef<str>>(&mut self, row: &[S]) {
        let cell = |i: usize| row.get(i).map(|s| s.as_ref().to_string()).unwrap_or_default();
        if row.len() < COLUMN_COUNT {
            log::debug!("Short metadata row ({} cells), padding", row.len());
        }
        self.titles.push(cell(0));
        self.composers.push(cell(1));
        self.pianists.push(cell(2));
        self.manufacturers.push(cell(3));
        self.roll_numbers.push(cell(4));
        self.base_filenames.push(cell(5));
    }

    pub fn len(&self) -> usize {
        self.base_filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_filenames.is_empty()
    }

    pub fn record(&self, i: usize) -> Option<MetadataRecord> {
        if i >= self.len() {
            return None;
        }
        Some(MetadataRecord {
            title: self.titles[i].clone(),
            composer: self.composers[i].clone(),
            pianist: self.pianists[i].clone(),
            manufacturer: Manufacturer::from_name(&self.manufacturers[i]),
            roll_number: self.roll_numbers[i].clone(),
            base_filename: self.base_filenames[i].clone(),
        })
    }

    pub fn records(&self) -> impl Iterator<Item = MetadataRecord> + '_ {
        (0..self.len()).filter_map(|i| self.record(i))
    }

    /// Distinct composers in first-seen order.
    pub fn distinct_composers(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.composers
            .iter()
            .map(String::as_str)
            .filter(|c| seen.insert(*c))
            .collect()
    }
}

/// Load the tab-delimited export, skipping its header row.
pub fn load_table(path: &Path) -> std::result::Result<MetadataTable, MetadataError> {
    if !path.is_file() {
        return Err(MetadataError::Missing(path.display().to_string()));
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut table = MetadataTable::default();
    for record in reader.records() {
        let record = record?;
        let row: Vec<&str> = record.iter().collect();
        table.push_row(&row);
    }

    log::info!("Loaded {} metadata rows from {}", table.len(), path.display());
    Ok(table)
}
