use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use docxide_report::request::Manifest;
use docxide_report::store::OutputStore;
use docxide_report::{Config, Error, generate};

#[derive(Parser)]
#[command(name = "docxide-report")]
#[command(version)]
#[command(about = "Fill Word report templates with form fields and photos", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the template files
    #[arg(long, global = true, value_name = "DIR")]
    template_dir: Option<PathBuf>,

    /// Directory generated reports are stored in
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report from a JSON manifest
    Generate {
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Skip removing old outputs before generating
        #[arg(long)]
        no_cleanup: bool,
    },

    /// List registered templates
    Templates,

    /// List generated reports, newest first
    Files,

    /// Copy a generated report out of the store
    Fetch {
        file_id: String,

        /// Destination file (defaults to the report's own name)
        #[arg(value_name = "DEST")]
        dest: Option<PathBuf>,
    },

    /// Remove generated reports older than the given age
    Cleanup {
        /// Age in hours (defaults to the configured value)
        #[arg(long)]
        hours: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = cli.template_dir {
        config.template_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    let store = OutputStore::new(&config.output_dir);

    match cli.command {
        Commands::Generate {
            manifest,
            no_cleanup,
        } => {
            if config.cleanup_on_startup && !no_cleanup {
                store.cleanup_older_than(config.cleanup_after_hours)?;
            }
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            let request = Manifest::load(&manifest)?.into_request(base_dir, &config)?;
            let generated = generate(&config, &request, &store)?;
            print_json(&generated)
        }
        Commands::Templates => print_json(&config.templates.list(&config.template_dir)),
        Commands::Files => print_json(&store.list()?),
        Commands::Fetch { file_id, dest } => {
            let Some(report) = store.find(&file_id)? else {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("file not found or expired: {}", file_id),
                )));
            };
            let dest = dest.unwrap_or_else(|| PathBuf::from(&report.filename));
            std::fs::copy(&report.path, &dest)?;
            log::info!("Wrote {}", dest.display());
            Ok(())
        }
        Commands::Cleanup { hours } => {
            let removed = store.cleanup_older_than(hours.unwrap_or(config.cleanup_after_hours))?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
