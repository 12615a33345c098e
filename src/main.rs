//! Binary entry point for the bmodel CLI.
//!
//! ## Usage
//!
//! ```bash
//! # List the entities of a build script
//! bmodel entities app/build.gradle
//!
//! # Remove the second dependency, printing the new text instead of saving
//! bmodel remove app/build.gradle --group Dependencies --index 1 --dry-run
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use buildmodel::output::{emit_response, EntitiesResponse, ErrorResponse, RemoveResponse, SCHEMA_VERSION};
use buildmodel::{
    find_group, remove_entity, BuildFileParser, BuildModelConfig, BuildModelError, EntityGroup,
    FileId, Metadata, Project,
};
use buildmodel_core::OutputErrorCode;

// ============================================================================
// CLI Structure
// ============================================================================

/// Extract and edit the model of Gradle build scripts.
///
/// All output is JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "bmodel", version, about = "Gradle build script model extraction")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: buildmodel.toml in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the entity groups of a build script.
    Entities {
        /// Build script to read.
        file: PathBuf,
    },
    /// Remove one entity from its build script.
    Remove {
        /// Build script the entity was listed for.
        file: PathBuf,
        /// Group name, e.g. `Dependencies`.
        #[arg(long)]
        group: String,
        /// Zero-based index within the group.
        #[arg(long)]
        index: usize,
        /// Print the new text instead of writing it.
        #[arg(long)]
        dry_run: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), BuildModelError> {
    match cli.command {
        Command::Entities { file } => execute_entities(&cli.global, &file),
        Command::Remove {
            file,
            group,
            index,
            dry_run,
        } => execute_remove(&cli.global, &file, &group, index, dry_run),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

fn execute_entities(global: &GlobalArgs, file: &Path) -> Result<(), BuildModelError> {
    let (project, groups) = extract(global, file)?;
    emit(&EntitiesResponse::new(
        &project,
        file.display().to_string(),
        &groups,
    ))
}

fn execute_remove(
    global: &GlobalArgs,
    file: &Path,
    group: &str,
    index: usize,
    dry_run: bool,
) -> Result<(), BuildModelError> {
    let (mut project, groups) = extract(global, file)?;
    let entity = find_group(&groups, group)
        .ok_or_else(|| BuildModelError::EntityNotFound {
            message: format!("no group named '{}'", group),
        })?
        .entities
        .get(index)
        .ok_or_else(|| BuildModelError::EntityNotFound {
            message: format!("group '{}' has no entity {}", group, index),
        })?;
    if !entity.has(Metadata::Removable) {
        return Err(BuildModelError::invalid_args(format!(
            "'{}' cannot be removed",
            entity.display_name
        )));
    }

    remove_entity(&mut project, entity)?;
    info!(entity = %entity.display_name, dry_run, "removed entity");

    let edited: Option<FileId> = entity.whole_range.map(|b| b.file_id);
    let (saved, text) = if dry_run {
        let text = edited
            .and_then(|id| project.document(id))
            .map(|d| d.text().to_string());
        (Vec::new(), text)
    } else {
        let saved = project
            .save_modified()?
            .into_iter()
            .map(|p| display_path(&project, &p))
            .collect();
        (saved, None)
    };

    emit(&RemoveResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        file: file.display().to_string(),
        removed: entity.display_name.clone(),
        dry_run,
        saved,
        text,
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Load the configuration and extract the entity groups of `file`.
fn extract(
    global: &GlobalArgs,
    file: &Path,
) -> Result<(Project, Vec<EntityGroup>), BuildModelError> {
    let cwd = std::env::current_dir().map_err(|e| BuildModelError::io(".", &e))?;
    let config = match &global.config {
        Some(path) => BuildModelConfig::load(path)?,
        None => BuildModelConfig::load_from_dir(&cwd)?,
    };
    let mut project = Project::new(cwd);
    let id = project.open(file)?;
    let groups = BuildFileParser::new(config).parse(id, &mut project);
    Ok((project, groups))
}

fn display_path(project: &Project, path: &Path) -> String {
    path.strip_prefix(project.root())
        .unwrap_or(path)
        .display()
        .to_string()
}

fn emit<T: serde::Serialize>(response: &T) -> Result<(), BuildModelError> {
    emit_response(response, &mut io::stdout())
        .map_err(|e| BuildModelError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
