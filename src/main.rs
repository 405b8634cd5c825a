// smartctl-collector - S.M.A.R.T. metrics from smartctl JSON output
//
// Reads one smartctl JSON document per device (as written by
// `smartctl --json -a <device>`), collects every device in parallel and
// prints the resulting metrics in text exposition format on stdout.
//
// # Usage
// smartctl-collector [--config <settings.json>] --input <file> [--input <file> ...]
//
// Example:
// smartctl-collector --input sda.json --input bus0-megaraid1.json

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smartctl_collector::config::ConfigManager;
use smartctl_collector::exposition::render;
use smartctl_collector::scheduler::ScrapeScheduler;
use smartctl_collector::source::{DocumentSource, FileSource};

/// Application entry point
///
/// 1. Initializes logging
/// 2. Parses command-line arguments
/// 3. Loads settings
/// 4. Collects every input document
/// 5. Prints the metrics
#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("smartctl-collector {}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = env::args().skip(1).collect();
    let config = parse_arguments(&args)?;

    let settings = ConfigManager::load(config.settings_path.as_deref())
        .await
        .context("Failed to load exporter settings")?;

    let sources: Vec<Box<dyn DocumentSource>> = config
        .inputs
        .iter()
        .map(|path| Box::new(FileSource::new(path)) as Box<dyn DocumentSource>)
        .collect();

    let report = ScrapeScheduler::new(settings).scrape(sources).await;

    for failure in &report.failures {
        error!("{}: {}", failure.origin, failure.reason);
    }

    print!("{}", render(&report.points));

    if report.devices == 0 {
        bail!("no device could be collected");
    }
    Ok(())
}

/// Application configuration parsed from command-line arguments
#[derive(Debug, PartialEq)]
struct AppConfig {
    /// Optional exporter settings file
    settings_path: Option<PathBuf>,

    /// smartctl JSON documents, one per device
    inputs: Vec<PathBuf>,
}

/// Parses command-line arguments
///
/// # Arguments
/// * `--config <path>` - exporter settings file (optional)
/// * `--input <path>` - smartctl JSON document (required, repeatable)
fn parse_arguments(args: &[String]) -> Result<AppConfig> {
    let mut settings_path = None;
    let mut inputs = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("Missing value for --config <path>")?;
                settings_path = Some(PathBuf::from(path));
            }
            "--input" => {
                let path = iter.next().context("Missing value for --input <path>")?;
                inputs.push(PathBuf::from(path));
            }
            other => bail!("Unknown argument: {}", other),
        }
    }

    if inputs.is_empty() {
        bail!("Missing required argument: --input <smartctl-json>");
    }

    Ok(AppConfig {
        settings_path,
        inputs,
    })
}

/// Initializes the logging subsystem
///
/// Logs go to stderr so stdout carries only metrics.
/// Default level is INFO, overridable with RUST_LOG. Under systemd
/// (INVOCATION_ID set) logs are JSON.
fn init_logging() {
    let is_systemd = env::var("INVOCATION_ID").is_ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if is_systemd {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_arguments() {
        let config = parse_arguments(&args(&[
            "--input", "sda.json", "--config", "settings.json", "--input", "sdb.json",
        ]))
        .unwrap();

        assert_eq!(config.settings_path, Some(PathBuf::from("settings.json")));
        assert_eq!(
            config.inputs,
            vec![PathBuf::from("sda.json"), PathBuf::from("sdb.json")]
        );
    }

    #[test]
    fn test_parse_arguments_errors() {
        assert!(parse_arguments(&args(&[])).is_err());
        assert!(parse_arguments(&args(&["--input"])).is_err());
        assert!(parse_arguments(&args(&["--config", "s.json"])).is_err());
        assert!(parse_arguments(&args(&["--verbose", "--input", "a.json"])).is_err());
    }
}
