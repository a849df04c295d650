use anyhow::Context;
use colored::Colorize;

use sortmerge_engine::{run_merge, EngineError, MergeReport, SourceStatus};
use sortmerge_types::{ConfigError, ConfigFile, MergeConfig};

use crate::cli::{Cli, UsageError};

/// Process exit codes.
pub mod exit {
    pub const OK: u8 = 0;
    pub const PARSE_FAILED: u8 = 1;
    pub const BAD_CONFIG_FILE: u8 = 2;
    pub const MISSING_OPTION: u8 = 3;
    pub const CONFLICTING_KINDS: u8 = 4;
    pub const CONFLICTING_ORDERS: u8 = 5;
    pub const MISSING_FILES: u8 = 6;
    pub const OUTPUT_CREATE: u8 = 7;
    pub const NO_USABLE_INPUTS: u8 = 8;
}

/// Turn parsed arguments and an optional config file into a run configuration.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<MergeConfig> {
    let kind = cli.kind()?;
    let order = cli.order()?;
    let (output, inputs) = cli.files()?;

    let file = match &cli.config {
        Some(path) => ConfigFile::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigFile::default(),
    };
    Ok(file.resolve(kind, order, output, inputs)?)
}

pub fn run(cli: &Cli) -> anyhow::Result<MergeReport> {
    let config = resolve_config(cli)?;
    tracing::debug!(?config, "resolved configuration");
    Ok(run_merge(&config)?)
}

/// Map an error from [`run`] to the process exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(usage) = cause.downcast_ref::<UsageError>() {
            return match usage {
                UsageError::MissingKind => exit::MISSING_OPTION,
                UsageError::ConflictingKinds => exit::CONFLICTING_KINDS,
                UsageError::ConflictingOrders => exit::CONFLICTING_ORDERS,
                UsageError::MissingFiles => exit::MISSING_FILES,
            };
        }
        if let Some(config) = cause.downcast_ref::<ConfigError>() {
            return match config {
                ConfigError::MissingKind => exit::MISSING_OPTION,
                ConfigError::MissingOutput | ConfigError::NoInputs => exit::MISSING_FILES,
                ConfigError::InvalidCapacity(_)
                | ConfigError::Read { .. }
                | ConfigError::Parse(_) => exit::BAD_CONFIG_FILE,
            };
        }
        if let Some(engine) = cause.downcast_ref::<EngineError>() {
            return match engine {
                EngineError::OutputCreate { .. } => exit::OUTPUT_CREATE,
                EngineError::NoUsableSources { .. } => exit::NO_USABLE_INPUTS,
                EngineError::Config(inner) => match inner {
                    ConfigError::MissingKind => exit::MISSING_OPTION,
                    ConfigError::MissingOutput | ConfigError::NoInputs => exit::MISSING_FILES,
                    _ => exit::BAD_CONFIG_FILE,
                },
                _ => exit::PARSE_FAILED,
            };
        }
    }
    exit::PARSE_FAILED
}

pub fn print_summary(report: &MergeReport) {
    println!("Sorting completed");
    println!(
        "{} {} values written from {} sources{}",
        "✓".green().bold(),
        report.emitted.to_string().bold(),
        report.merged_count(),
        match report.dropped_count() {
            0 => String::new(),
            n => format!(", {} dropped", n.to_string().yellow()),
        }
    );
    for source in report.dropped() {
        if let SourceStatus::Dropped(reason) = &source.status {
            println!("  {} {}: {}", "✗".red(), source.path.display(), reason);
        }
    }
    for source in report.truncated() {
        if let SourceStatus::Truncated(cause) = &source.status {
            println!(
                "  {} {}: read stopped early after {} values: {}",
                "!".yellow(),
                source.path.display(),
                source.emitted,
                cause
            );
        }
    }
    if report.write_errors > 0 {
        println!(
            "  {} {} values could not be written",
            "!".red().bold(),
            report.write_errors
        );
    }
}
