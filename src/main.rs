use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollsort", version, about = "Player-piano roll MIDI library organizer")]
struct Cli {
    /// Path to a TOML config file (defaults to the XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct SortArgs {
    /// Directory holding the source library; the new library is created here too
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Source library folder (relative to the work dir)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Metadata spreadsheet (xlsx, xls, ods, csv, tsv)
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a new sorted library (default when no command is given)
    Sort(SortArgs),

    /// Print the header and meta messages of MIDI files
    Inspect {
        /// Files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List MIDI files in the source library without copying anything
    List {
        /// Include multi-word file names
        #[arg(long)]
        all: bool,

        /// Directory holding the source library
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let mut config = rollsort::config::AppConfig::load(cli.config.as_deref());

    match cli.command.unwrap_or_else(|| Commands::Sort(SortArgs::default())) {
        Commands::Sort(args) => {
            if let Some(dir) = args.work_dir {
                config.work_dir = Some(dir);
            }
            if let Some(source) = args.source {
                config.source_dir = source;
            }
            if let Some(metadata) = args.metadata {
                config.metadata_override = Some(metadata);
            }

            let work_dir = config
                .resolve_work_dir()
                .context("Failed to determine working directory")?;
            let stamp = rollsort::layout::run_stamp(chrono::Local::now());

            let summary = rollsort::pipeline::run(&config, &work_dir, &stamp)
                .context("Sort failed")?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for line in summary.progress_lines() {
                    println!("{line}");
                }
                println!();
                print!("{}", summary.render());
            }
        }

        Commands::Inspect { files } => {
            for path in &files {
                let (header, tracks) = rollsort::scanner::midi::inspect(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                println!("{}", path.display());
                println!(
                    "  format: {}, timing: {}, tracks: {}",
                    header.format, header.timing, header.track_count
                );
                for (i, track) in tracks.iter().enumerate() {
                    println!(
                        "Track {}: {} ({} events)",
                        i,
                        track.name.as_deref().unwrap_or(""),
                        track.events
                    );
                    for msg in &track.meta {
                        println!("  {}", msg);
                    }
                }
            }
        }

        Commands::List { all, work_dir } => {
            if let Some(dir) = work_dir {
                config.work_dir = Some(dir);
            }
            let work_dir = config
                .resolve_work_dir()
                .context("Failed to determine working directory")?;
            let discovery = rollsort::scanner::discover(
                &config.source_root(&work_dir),
                &work_dir,
                config.verify_midi,
            )
            .context("Discovery failed")?;

            for file in discovery.files.iter().filter(|f| all || f.is_simple) {
                let variant = match rollsort::variant::classify_path(&file.path) {
                    Some(v) => v.suffix(),
                    None => "-",
                };
                println!("{:<4} {:<40} {}", variant, file.base_name, file.path.display());
            }
            println!();
            println!(
                "{} MIDI files, {} simple",
                discovery.files.len(),
                discovery.simple_count()
            );
        }
    }

    Ok(())
}
