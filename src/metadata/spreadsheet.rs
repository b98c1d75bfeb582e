//! Re-export the roll spreadsheet as tab-delimited text.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use csv::{ReaderBuilder, WriterBuilder};

use super::MetadataError;

/// Workbook extensions handed to calamine.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Render one cell the way a spreadsheet user would read it.
/// Whole-number floats lose their `.0`; empty cells become "".
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Read the first sheet of a workbook into rows of text.
fn read_workbook(path: &Path) -> std::result::Result<Vec<Vec<String>>, MetadataError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MetadataError::NoSheet(path.display().to_string()))??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Read an already-delimited metadata file into rows of text.
fn read_delimited(path: &Path, delimiter: u8) -> std::result::Result<Vec<Vec<String>>, MetadataError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Read any supported metadata source into rows (header row included).
pub fn read_rows(path: &Path) -> std::result::Result<Vec<Vec<String>>, MetadataError> {
    if !path.is_file() {
        return Err(MetadataError::Missing(path.display().to_string()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        e if WORKBOOK_EXTENSIONS.contains(&e) => read_workbook(path),
        "csv" => read_delimited(path, b','),
        "tsv" | "tab" | "txt" => read_delimited(path, b'\t'),
        _ => Err(MetadataError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Write rows as tab-delimited text.
pub fn write_tsv(path: &Path, rows: &[Vec<String>]) -> std::result::Result<(), MetadataError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .has_headers(false)
        .from_path(path)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Convert the spreadsheet at `source` into a tab-delimited file at `dest`.
/// Returns the number of rows written, header included.
pub fn export_tsv(source: &Path, dest: &Path) -> std::result::Result<usize, MetadataError> {
    let rows = read_rows(source)?;
    write_tsv(dest, &rows)?;
    log::info!(
        "Exported {} rows from {} to {}",
        rows.len(),
        source.display(),
        dest.display()
    );
    Ok(rows.len())
}
