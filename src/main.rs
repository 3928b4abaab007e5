mod app;
mod bridge;
mod cli;
mod format;
mod host;
mod settings;
mod speedtest;

use anyhow::Result;
use app::{run_speed_test, Extension};
use clap::Parser;
use cli::{Cli, Command};
use host::Manifest;
use settings::{MeasurementSettings, Preferences};
use speedtest::cloudflare::CloudflareFactory;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or_default() {
        Command::Serve { keyword, measurement } => {
            let factory = CloudflareFactory::new(measurement.into());
            let mut ext = Extension::new(Preferences::new(keyword), Box::new(factory));
            bridge::serve(&mut ext, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
        }
        Command::Run { measurement } => run_once(measurement.into()).await,
        Command::Manifest => {
            println!("{}", serde_json::to_string_pretty(&Manifest::current())?);
            Ok(())
        }
    }
}

async fn run_once(settings: MeasurementSettings) -> Result<()> {
    let factory = CloudflareFactory::new(settings);
    let result = run_speed_test(&factory).await?;
    let server = &result.server;

    println!(
        "Selected Server: {} (Host: {}) located in {}, {}",
        server.sponsor, server.host, server.city, server.country
    );
    println!("Download speed: {:.2} Mbps", result.download_mbps);
    println!("Upload speed: {:.2} Mbps", result.upload_mbps);
    println!("{}", format::ping_line(result.ping_ms));
    Ok(())
}

// Logs go to stderr; stdout carries host frames.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "speedlaunch=debug"
    } else {
        "speedlaunch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
