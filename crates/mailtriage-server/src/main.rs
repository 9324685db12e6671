//! `mailtriage` - support inbox API server.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailtriage_server::{ImportFormat, ServerConfig, import_file, serve, telemetry};
use tracing::info;

#[derive(Parser)]
#[command(name = "mailtriage", version, about = "Support inbox triage API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Listen address (overrides MAILTRIAGE_BIND).
        #[arg(long)]
        bind: Option<String>,
        /// Store URL (overrides MAILTRIAGE_STORE_URL).
        #[arg(long)]
        store_url: Option<String>,
        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },
    /// Load emails from a JSON array or a CSV file into the store.
    Import {
        /// File containing the emails.
        file: PathBuf,
        /// File format; guessed from the extension when omitted.
        #[arg(long, value_enum)]
        format: Option<ImportFormat>,
        /// Store URL (overrides MAILTRIAGE_STORE_URL).
        #[arg(long)]
        store_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;

    match cli.command {
        Command::Serve {
            bind,
            store_url,
            log_json,
        } => {
            telemetry::init(log_json);
            if let Some(bind) = bind {
                config = config.with_bind(&bind)?;
            }
            if let Some(url) = store_url {
                config = config.with_store_url(url);
            }

            info!("Starting mailtriage");
            let service = config.store().open().await?;
            serve(config.bind, service).await?;
        }
        Command::Import {
            file,
            format,
            store_url,
        } => {
            telemetry::init(false);
            if let Some(url) = store_url {
                config = config.with_store_url(url);
            }

            let service = config.store().open().await?;
            let inserted = import_file(&file, format, &service)
                .await
                .with_context(|| format!("importing {}", file.display()))?;
            info!(inserted, "Import finished");
        }
    }

    Ok(())
}
