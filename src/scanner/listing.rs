//! `libraryNew.csv`: one space-delimited `(base name, relative path)` row per
//! simple-named source file. The classifier reads the paths back from here.

use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use super::{DiscoveredFile, ScanError};

const DELIMITER: u8 = b' ';
const QUOTE: u8 = b'|';

/// Write the listing. Returns the number of rows written.
pub fn write_listing<'a>(
    path: &Path,
    files: impl IntoIterator<Item = &'a DiscoveredFile>,
) -> std::result::Result<usize, ScanError> {
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .quote_style(QuoteStyle::Necessary)
        .has_headers(false)
        .from_path(path)?;

    let mut rows = 0;
    for file in files {
        let rel = file.path.to_string_lossy();
        writer.write_record([file.base_name.as_str(), &*rel])?;
        rows += 1;
    }
    writer.flush()?;

    log::info!("Wrote {} listing rows to {}", rows, path.display());
    Ok(rows)
}

/// Read the path column back out of a listing.
pub fn read_listing_paths(path: &Path) -> std::result::Result<Vec<PathBuf>, ScanError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut paths = Vec::new();
    for record in reader.records() {
        let record = record?;
        match record.get(1) {
            Some(p) => paths.push(PathBuf::from(p)),
            None => log::warn!("Listing row without a path: {:?}", record),
        }
    }
    Ok(paths)
}
