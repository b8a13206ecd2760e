//! recordbase: fetch and write entries from the command line.
//!
//! Connection settings come from an optional YAML config file; flags
//! override whatever the file sets. Writes read a JSON entry from a file
//! or stdin, reads print the entry as JSON on stdout.

use clap::{ArgAction, Parser, Subcommand};
use recordbase_client::{ClientConfig, Entry, Instance};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "recordbase")]
#[command(about = "Get, merge and replace entries in a recordbase store")]
struct Cli {
    /// YAML client config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// `host:port`, optionally prefixed with `tls://`.
    #[arg(long)]
    endpoint: Option<String>,
    /// Bearer token, or `$VAR` to read it from the environment.
    #[arg(long)]
    token: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    tls: bool,
    /// Per-call budget in milliseconds; 0 means unbounded.
    #[arg(long)]
    timeout_ms: Option<i64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Get(GetArgs),
    Merge(WriteArgs),
    Replace(WriteArgs),
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    tenant: String,
    primary_key: String,
    /// Include file contents, not only file metadata.
    #[arg(long, action = ArgAction::SetTrue)]
    files: bool,
}

#[derive(clap::Args, Debug)]
struct WriteArgs {
    /// JSON entry; stdin when omitted.
    file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    recordbase_metrics::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = client_config(&cli)?;
    let timeout_ms = config.request_timeout_ms;

    match cli.command {
        Commands::Get(args) => {
            let include = args.files || config.include_file_contents;
            let db = Instance::connect_with_config(&config).await?;
            let result = db
                .get_json(&args.tenant, &args.primary_key, include, timeout_ms)
                .await;
            db.close();
            println!("{}", result?);
        }
        Commands::Merge(args) => {
            let entry = read_entry(args.file.as_deref())?;
            let db = Instance::connect_with_config(&config).await?;
            let result = db.merge(&entry, timeout_ms).await;
            db.close();
            result?;
        }
        Commands::Replace(args) => {
            let entry = read_entry(args.file.as_deref())?;
            let db = Instance::connect_with_config(&config).await?;
            let result = db.replace(&entry, timeout_ms).await;
            db.close();
            result?;
        }
    }
    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn client_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => recordbase_config::load_from_file(path)?,
        None => ClientConfig::new(""),
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(token) = &cli.token {
        config.token = token.clone();
    }
    if cli.tls {
        config.tls = true;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

fn read_entry(path: Option<&Path>) -> Result<Entry, Box<dyn std::error::Error>> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    Ok(recordbase_common::format::from_json(&text)?)
}
