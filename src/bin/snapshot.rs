//! Snapshot CLI - export a project tree and its files into one text document.

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::Local;
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use snapshot::builder::Snapshot;
use snapshot::config::{FileTypeSet, SnapshotConfig, DEFAULT_EXPORT_OPTIONS};
use snapshot::errors::{exit_code, SnapshotError};
use snapshot::output::{timestamped_path, write_export, ExportOptions};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "snapshot")]
#[command(about = "Export selected project files into a single timestamped text file")]
#[command(version)]
struct Cli {
    /// Root directory to scan
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Output file path; a _YYYYMMDD_HHMMSS suffix is added
    #[arg(short, long, default_value = "./backups/exported_files.txt")]
    output: PathBuf,

    /// Export options: description,tree,all_types,types (e.g. 1,1,0,py,js)
    #[arg(long, default_value = DEFAULT_EXPORT_OPTIONS)]
    export_options: String,

    /// Include only files modified in the last N minutes
    #[arg(long, value_name = "MINUTES")]
    recent: Option<u64>,

    /// Map functions, classes, and methods in Python and JS files
    #[arg(long)]
    map_functions: bool,

    /// Glob (relative to the root) naming exactly the files to include
    #[arg(long, value_name = "GLOB")]
    specific_path: Option<String>,

    /// JSON config file (defaults to <ROOT>/.snapshot.json if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,

    /// Skip files matched by .gitignore
    #[arg(long)]
    respect_gitignore: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "snapshot", &mut std::io::stdout());
        return;
    }

    init_logging(cli.verbose);

    match run(cli) {
        Ok(path) => println!("\nFiles were exported successfully to {}", path.display()),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: logging already initialized");
    }
}

fn run(cli: Cli) -> Result<PathBuf, SnapshotError> {
    let config = SnapshotConfig::resolve(cli.config.as_deref(), &cli.root)?;
    let categories = FileTypeSet::from_export_options(&cli.export_options);
    debug!(categories = ?categories, "export categories");

    let builder = Snapshot::new(&cli.root)
        .recent(cli.recent)
        .map_symbols(cli.map_functions)
        .follow_symlinks(cli.follow_symlinks)
        .respect_gitignore(cli.respect_gitignore);

    let builder = match cli.specific_path {
        Some(pattern) => builder.glob(pattern),
        None => builder.policy(config.discovery),
    };

    let tree = builder.build()?;

    let output = timestamped_path(&cli.output, &Local::now());
    let options = ExportOptions {
        categories,
        description: config.description,
    };
    write_export(&tree, &cli.root, &output, &options)?;

    Ok(output)
}
