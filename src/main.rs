use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use pulsemetrics::config::{load_config, schema_json, DEFAULT_CONFIG_PATH};
use pulsemetrics::startup;
use pulsemetrics::utils::logger::init_logging;
use tracing::error;

const USAGE: &str = "usage: pulsemetrics [--config <path>] [--schema]";

#[derive(Debug, PartialEq)]
enum Command {
    Serve { config_path: PathBuf },
    PrintSchema,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => return Ok(Command::PrintSchema),
            "--config" => {
                let path = args.next().ok_or("--config requires a path")?;
                config_path = PathBuf::from(path);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(Command::Serve { config_path })
}

#[tokio::main]
async fn main() -> ExitCode {
    let started_at = Instant::now();

    let config_path = match parse_args(std::env::args().skip(1)) {
        Ok(Command::PrintSchema) => {
            return match schema_json() {
                Ok(schema) => {
                    println!("{}", schema);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error rendering configuration schema: {}", e);
                    ExitCode::FAILURE
                }
            };
        }
        Ok(Command::Serve { config_path }) => config_path,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = startup::run(Arc::new(config), started_at).await {
        error!(
            event_name = "server.failed",
            event_domain = "server",
            error = %e,
            "server terminated with an error"
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
