use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::config::AppConfig;
use crate::layout::LibraryLayout;
use crate::metadata::{self, Manufacturer, spreadsheet};
use crate::placer::Placer;
use crate::report::RunSummary;
use crate::scanner::{self, listing};
use crate::variant;

/// Build one library tree under `work_dir`, named `<prefix><stamp>`.
///
/// Bootstrap → discover → listing → metadata export/load → stage → place.
/// Missing inputs are checked before anything is written.
pub fn run(config: &AppConfig, work_dir: &Path, stamp: &str) -> Result<RunSummary> {
    let source_root = config.source_root(work_dir);
    let metadata_path = config.metadata_path(work_dir);
    if !source_root.is_dir() {
        bail!("Source library not found: {}", source_root.display());
    }
    if !metadata_path.is_file() {
        bail!("Metadata spreadsheet not found: {}", metadata_path.display());
    }

    let layout = LibraryLayout::new(work_dir, &config.output_prefix, stamp);
    layout
        .bootstrap()
        .with_context(|| format!("Failed to create {}", layout.root.display()))?;
    log::info!("Output root: {}", layout.root.display());

    let discovery = scanner::discover(&source_root, work_dir, config.verify_midi)
        .context("Discovery failed")?;
    listing::write_listing(&layout.listing(), discovery.simple())
        .context("Failed to write file listing")?;

    let export_name = metadata_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&config.metadata_file);
    let export_path = layout.metadata_export(export_name);
    spreadsheet::export_tsv(&metadata_path, &export_path)
        .context("Failed to convert metadata spreadsheet")?;
    let table = metadata::load_table(&export_path).context("Failed to load metadata")?;

    let listed = listing::read_listing_paths(&layout.listing())
        .context("Failed to read file listing")?;
    let staged = variant::stage_files(&listed, work_dir, &layout).context("Staging failed")?;

    let recognized: Vec<Manufacturer> = config
        .manufacturers
        .iter()
        .map(|m| Manufacturer::from_name(m))
        .collect();
    let mut placer = Placer::new(&table, &layout, &recognized, config.duplicate_policy);
    let placement = placer.place_all(discovery.simple()).context("Placement failed")?;

    Ok(RunSummary::new(
        layout.root.clone(),
        &discovery,
        table.len(),
        staged,
        placement,
    ))
}
