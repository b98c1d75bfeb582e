//! End-to-end runs of the sort pipeline over a small fake roll collection

use rollsort::config::AppConfig;
use rollsort::pipeline;
use rollsort::placer::{DuplicatePolicy, FileOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STAMP: &str = "20210214-120000";

fn write(path: &Path, body: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Source tree with a metadata TSV and a handful of rolls.
fn fixture(metadata_rows: &[&str]) -> (TempDir, AppConfig) {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("libraryOriginal");

    write(&src.join("Ampico/BeethovenSonataemR.mid"), b"sonata-plain");
    write(&src.join("Ampico/BeethovenSonataemP.mid"), b"sonata-soft");
    write(&src.join("Duo-Art/ChopinWaltzemR.MID"), b"waltz-plain");
    write(&src.join("Welte/LisztDreamemR.mid"), b"liszt-plain");
    write(&src.join("Misc/Two Words emR.mid"), b"skipped");
    write(&src.join("Misc/Orphan.mid"), b"orphan");

    let mut sheet = String::from("Title\tComposer\tPianist\tManufacturer\tRoll\tFilename\n");
    for row in metadata_rows {
        sheet.push_str(row);
        sheet.push('\n');
    }
    write(&src.join("DOCUMENTATION/All_Rolls_modified.tsv"), sheet.as_bytes());

    let config = AppConfig {
        metadata_extension: "tsv".to_string(),
        ..AppConfig::default()
    };
    (tmp, config)
}

fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut out: Vec<_> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(dir).unwrap().to_path_buf(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect();
    out.sort();
    out
}

#[test]
fn sorts_rolls_into_composer_and_pianist_folders() {
    let (tmp, config) = fixture(&[
        "Sonata No.5\tBeethoven\tX\tAmpico\t100\tBeethovenSonata",
        "Waltz in A flat\tChopin\tY\tDuo-Art\t200\tChopinWaltz",
        "Liebestraum\tLiszt\tZ\tWelte-Mignon\t300\tLisztDream",
        "Lost Roll\tMozart\tW\tAmpico\t400\tMozartLost",
    ]);
    let before = snapshot(&tmp.path().join("libraryOriginal"));

    let summary = pipeline::run(&config, tmp.path(), STAMP).unwrap();
    let root = tmp.path().join(format!("library{STAMP}"));
    assert_eq!(summary.output_root, root);

    // Sorted tree
    assert_eq!(
        fs::read(root.join("filesSorted/Beethoven/X/Sonata No.5.mid")).unwrap(),
        b"sonata-plain"
    );
    assert_eq!(
        fs::read(root.join("filesSorted/Chopin/Y/Waltz in A flat.mid")).unwrap(),
        b"waltz-plain"
    );
    // Unrecognized manufacturer: composer folder only
    assert!(root.join("filesSorted/Liszt").is_dir());
    assert!(!root.join("filesSorted/Liszt/Z").exists());
    // Every composer gets a folder, even with no file
    assert!(root.join("filesSorted/Mozart").is_dir());

    // Staging
    assert!(root.join("filesRaw/withSoft/BeethovenSonataemP.mid").is_file());
    assert!(root.join("filesRaw/withoutSoft/BeethovenSonataemR.mid").is_file());
    assert!(root.join("filesRaw/withoutSoft/ChopinWaltzemR.mid").is_file());
    assert!(root.join("filesRaw/withoutSoft/LisztDreamemR.mid").is_file());
    assert!(!root.join("filesRaw/withoutSoft/Two Words emR.mid").exists());

    // Side files
    let listing = fs::read_to_string(root.join("libraryNew.csv")).unwrap();
    assert_eq!(listing.lines().count(), 5);
    assert!(listing.contains("ChopinWaltzemR libraryOriginal/Duo-Art/ChopinWaltzemR.MID"));
    assert!(!listing.contains("Two Words"));
    let export = fs::read_to_string(root.join("All_Rolls_modified.csv")).unwrap();
    assert!(export.starts_with("Title\tComposer"));

    // Summary
    assert_eq!(summary.discovered, 6);
    assert_eq!(summary.simple, 5);
    assert_eq!(summary.metadata_rows, 4);
    assert_eq!(summary.staged_with_soft, 1);
    assert_eq!(summary.staged_without_soft, 3);
    assert_eq!(
        summary.unclassified,
        vec![PathBuf::from("libraryOriginal/Misc/Orphan.mid")]
    );
    assert_eq!(summary.composer_dirs, 4);
    assert_eq!(summary.tally.placed, 2);
    assert_eq!(summary.tally.filtered, 1);
    assert_eq!(summary.tally.unmatched, 1);
    assert_eq!(summary.tally.already_handled, 1);

    // Source untouched
    assert_eq!(snapshot(&tmp.path().join("libraryOriginal")), before);
}

#[test]
fn missing_staged_copy_does_not_abort() {
    let (tmp, config) = fixture(&["Sonata No.5\tBeethoven\tX\tAmpico\t100\tBeethovenSonata"]);
    // Only the soft-pedal recording exists
    fs::remove_file(tmp.path().join("libraryOriginal/Ampico/BeethovenSonataemR.mid")).unwrap();

    let summary = pipeline::run(&config, tmp.path(), STAMP).unwrap();
    let root = tmp.path().join(format!("library{STAMP}"));

    assert!(!root.join("filesSorted/Beethoven/X/Sonata No.5.mid").exists());
    assert_eq!(summary.tally.missing_staged, 1);
    let sonata = summary
        .files
        .iter()
        .find(|f| f.candidate == "BeethovenSonata")
        .unwrap();
    assert_eq!(
        sonata.outcome,
        FileOutcome::MissingStaged {
            base_filename: "BeethovenSonata".to_string()
        }
    );
    assert_eq!(
        summary.progress_lines(),
        vec!["4", "file not found: BeethovenSonata", "1"]
    );

    // The JSON form carries the same facts and nothing else
    let json: serde_json::Value =
        serde_json::from_str(&serde_json::to_string_pretty(&summary).unwrap()).unwrap();
    assert_eq!(json["simple"], 4);
    assert_eq!(json["metadata_rows"], 1);
    assert_eq!(json["not_found"], serde_json::json!(["BeethovenSonata"]));
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_folder_is_skipped_without_aborting() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (tmp, config) = fixture(&["Valse\tChopin\tY\tDuo-Art\t7\tChopinWaltz"]);
    let odd = tmp
        .path()
        .join("libraryOriginal")
        .join(OsStr::from_bytes(b"Caf\xe9"))
        .join("MozartRondoemR.mid");
    write(&odd, b"rondo");

    let summary = pipeline::run(&config, tmp.path(), STAMP).unwrap();
    let root = tmp.path().join(format!("library{STAMP}"));

    assert_eq!(summary.skipped_non_utf8, vec![odd]);
    assert!(!root.join("filesRaw/withoutSoft/MozartRondoemR.mid").exists());
    assert!(root.join("filesSorted/Chopin/Y/Valse.mid").is_file());
}

#[test]
fn duplicate_rows_follow_policy() {
    let rows = [
        "Sonata No.5\tBeethoven\tX\tAmpico\t100\tBeethovenSonata",
        "Sonata No.5 (reissue)\tBeethoven\tX\tAmpico\t101\tBeethovenSonata",
    ];

    let (tmp, config) = fixture(&rows);
    pipeline::run(&config, tmp.path(), STAMP).unwrap();
    let sorted = tmp.path().join(format!("library{STAMP}/filesSorted/Beethoven/X"));
    assert!(sorted.join("Sonata No.5.mid").is_file());
    assert!(sorted.join("Sonata No.5 (reissue).mid").is_file());

    let (tmp, mut config) = fixture(&rows);
    config.duplicate_policy = DuplicatePolicy::Error;
    let summary = pipeline::run(&config, tmp.path(), STAMP).unwrap();
    // Both variants hit the conflict; neither marks the roll handled
    assert_eq!(summary.tally.conflicts, 2);
    assert_eq!(summary.tally.already_handled, 0);
    assert!(
        !tmp.path()
            .join(format!("library{STAMP}/filesSorted/Beethoven/X"))
            .exists()
    );
}

#[test]
fn missing_inputs_fail_before_writing() {
    let tmp = TempDir::new().unwrap();
    let config = AppConfig::default();
    assert!(pipeline::run(&config, tmp.path(), STAMP).is_err());
    assert!(!tmp.path().join(format!("library{STAMP}")).exists());

    fs::create_dir_all(tmp.path().join("libraryOriginal")).unwrap();
    let err = pipeline::run(&config, tmp.path(), STAMP).unwrap_err();
    assert!(err.to_string().contains("Metadata spreadsheet not found"));
}
