//! multirename CLI - rule-driven batch file renaming
//!
//! Proposes new file names from patterns and a template, renames files
//! without overwriting, and replays or undoes saved runs.

use clap::{Args, Parser, Subcommand};
use multirename::serialization::{load_plan, load_report, write_json_pretty};
use multirename::{
    rename_files, BatchPlan, BatchWalker, ExtractOptions, HandlebarsRenderer, HandlerRegistry,
    PatternRegistry, Pipeline, RenameReport, TokenMatcher,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

const PATTERNS_PATH: &str = "patterns.yaml";
const FILE_NAMES_PATH: &str = "file_names.json";
const RESTORE_PATH: &str = "restore_data.json";
const RESTORE_UNDO_PATH: &str = "restore_undo.json";

#[derive(Parser)]
#[command(name = "multirename")]
#[command(version, about = "Rename batches of files from fields extracted out of their names", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propose new names and save them without renaming anything
    Extract {
        #[command(flatten)]
        extract: ExtractArgs,

        /// Save path for the proposed names
        #[arg(short, long, default_value = FILE_NAMES_PATH)]
        save_path: PathBuf,
    },

    /// Rename files
    Rename {
        #[command(subcommand)]
        command: RenameCommands,
    },

    /// Validate a patterns file without touching any file
    Validate {
        /// File to load patterns from
        #[arg(short, long, default_value = PATTERNS_PATH)]
        load: PathBuf,
    },
}

#[derive(Subcommand)]
enum RenameCommands {
    /// Propose new names and rename right away
    Extract {
        #[command(flatten)]
        extract: ExtractArgs,

        /// Save path for the restore data
        #[arg(short, long, default_value = RESTORE_PATH)]
        save_path: PathBuf,
    },

    /// Rename from a saved (and possibly edited) file of proposed names
    From {
        /// File to load proposed names from
        #[arg(short, long = "load-from-file", default_value = FILE_NAMES_PATH)]
        load: PathBuf,

        /// Save path for the restore data
        #[arg(short, long, default_value = RESTORE_PATH)]
        save_path: PathBuf,
    },

    /// Undo a previous rename using its restore data
    Restore {
        /// Restore data written by a previous rename
        #[arg(short, long, default_value = RESTORE_PATH)]
        load: PathBuf,

        /// Save path for the restore data of this undo
        #[arg(short, long, default_value = RESTORE_UNDO_PATH)]
        save_path: PathBuf,
    },
}

#[derive(Args)]
struct ExtractArgs {
    /// Template for new names, e.g. "{{volume}}-{{number}}.pdf"
    #[arg(short, long)]
    template: String,

    /// Fields that must be extracted for a file to be renamed
    #[arg(short, long, num_args = 1..)]
    mandatory: Option<Vec<String>>,

    /// File to load patterns from
    #[arg(short, long, default_value = PATTERNS_PATH)]
    load: PathBuf,

    /// Strings removed from file names before processing
    #[arg(long, num_args = 1..)]
    excludes: Vec<String>,

    /// Files or directories to process
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { extract, save_path } => extract_names(extract, save_path),
        Commands::Rename { command } => match command {
            RenameCommands::Extract { extract, save_path } => rename_extract(extract, save_path),
            RenameCommands::From { load, save_path } => rename_from(load, save_path),
            RenameCommands::Restore { load, save_path } => rename_restore(load, save_path),
        },
        Commands::Validate { load } => validate_patterns(load),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_patterns(path: &Path, handlers: &HandlerRegistry) -> Result<PatternRegistry, String> {
    PatternRegistry::load_from_file(path, handlers).map_err(|e| e.to_string())
}

/// Build the full plan of proposed names. Nothing is renamed here.
fn build_plan(args: ExtractArgs) -> Result<BatchPlan, String> {
    let handlers = HandlerRegistry::builtin();
    let patterns = load_patterns(&args.load, &handlers)?;
    let matcher = TokenMatcher::new(&patterns).map_err(|e| e.to_string())?;
    let renderer = HandlebarsRenderer::new(&args.template).map_err(|e| e.to_string())?;

    let pipeline = Pipeline::new(&patterns, &handlers, &matcher, &renderer).with_options(
        ExtractOptions {
            strips: args.excludes,
            mandatory: args.mandatory,
        },
    );

    pipeline
        .plan(BatchWalker::new(args.files))
        .map_err(|e| e.to_string())
}

fn save<T: serde::Serialize>(path: &Path, value: &T, what: &str) -> Result<(), String> {
    write_json_pretty(path, value)
        .map_err(|e| format!("Failed to save {} to {}: {}", what, path.display(), e))?;
    println!(":: Saved {} to file {}", what, path.display());
    Ok(())
}

fn finish(report: &RenameReport, save_path: &Path) -> Result<(), String> {
    println!("{}", report.summary());
    save(save_path, report, "restore data")
}

fn extract_names(args: ExtractArgs, save_path: PathBuf) -> Result<(), String> {
    let plan = build_plan(args)?;

    let (proposed, unchanged) = plan
        .values()
        .flat_map(|names| names.values())
        .fold((0usize, 0usize), |(p, u), name| match name {
            Some(_) => (p + 1, u),
            None => (p, u + 1),
        });
    println!(
        ":: Out of total of {}:: new names: {}, no new name: {}",
        proposed + unchanged,
        proposed,
        unchanged
    );

    save(&save_path, &plan, "file names")
}

fn rename_extract(args: ExtractArgs, save_path: PathBuf) -> Result<(), String> {
    let plan = build_plan(args)?;
    let report = rename_files(&plan);
    finish(&report, &save_path)
}

fn rename_from(load: PathBuf, save_path: PathBuf) -> Result<(), String> {
    let plan = load_plan(&load)
        .map_err(|e| format!("Failed to load file names from {}: {}", load.display(), e))?;
    let report = rename_files(&plan);
    finish(&report, &save_path)
}

fn rename_restore(load: PathBuf, save_path: PathBuf) -> Result<(), String> {
    let previous = load_report(&load)
        .map_err(|e| format!("Failed to load restore data from {}: {}", load.display(), e))?;
    let report = rename_files(&previous.restore_plan());
    finish(&report, &save_path)
}

fn validate_patterns(load: PathBuf) -> Result<(), String> {
    println!("Validating patterns in {}...", load.display());

    let handlers = HandlerRegistry::builtin();
    let patterns = load_patterns(&load, &handlers)?;
    TokenMatcher::new(&patterns).map_err(|e| e.to_string())?;

    println!("  ✓ {} labels validated: {}", patterns.len(), patterns.labels().join(", "));
    println!("  ✓ handlers available: {}", handlers.handler_names().join(", "));
    println!("All patterns are valid!");

    Ok(())
}
