//! Command-line entry point: analyze one export file and print the report.
//!
//! Usage: `hhbi_failcheck <export.csv>`
//!
//! The JSON report goes to stdout; logs and the console summary go to
//! stderr. Configuration comes from the TOML file named by `HHBI_CONFIG`.

use std::path::PathBuf;
use std::process::ExitCode;

use hhbi_failcheck::config::{self, ServiceConfig};
use hhbi_failcheck::logging::{self, Stage};
use hhbi_failcheck::model::AnalysisError;
use hhbi_failcheck::{ingest, report, run_analysis};

fn run(config: &ServiceConfig, input: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let text = ingest::read_input(input.as_deref())?;
    let source = input
        .as_deref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let analysis = run_analysis(&text, &config.analysis);
    let report = report::build_report(&source, &analysis, config);

    eprint!("{}", report::render_summary(&report));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> ExitCode {
    let loaded = match config::load_from_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = loaded.config;

    if let Err(e) = logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    ) {
        eprintln!("Failed to open log file: {}", e);
        return ExitCode::FAILURE;
    }

    match &loaded.source {
        Some(path) => logging::info(
            Stage::System,
            None,
            &format!("Using configuration from {}", path.display()),
        ),
        None => logging::debug(Stage::System, None, "Using built-in configuration"),
    }

    let input = std::env::args_os().nth(1).map(PathBuf::from);
    match run(&config, input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e.downcast_ref::<AnalysisError>(), Some(AnalysisError::NoInputFile)) {
                logging::error(Stage::System, None, "Please select a CSV file first");
            } else {
                logging::error(Stage::System, None, &e.to_string());
            }
            ExitCode::FAILURE
        }
    }
}
