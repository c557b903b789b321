mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use engine_logging::{engine_warn, LogDestination};
use xray_engine::XRay;

use cli::Cli;
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, cli.log_level);

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };
    let mut options = config.options;
    cli.apply_to(&mut options);

    let xray = XRay::new(config.fetch.settings());
    let result = match &cli.body {
        Some(path) => {
            let body = config::read_body(path)?;
            xray.process(&cli.url, body, &options).await
        }
        None => xray.parse(&cli.url, &options).await,
    };

    let (output, exit) = match result {
        Ok(envelope) => (serde_json::to_value(&envelope)?, ExitCode::SUCCESS),
        Err(err) => {
            engine_warn!("{err}");
            (serde_json::to_value(err.envelope())?, ExitCode::FAILURE)
        }
    };
    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(exit)
}
