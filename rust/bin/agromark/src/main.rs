//! `agromark`: terminal front-end for Agro Mark batch management.
//!
//! Drives the same state engine as the mobile screens: list and search
//! batches by code, create, delete with confirmation, and feed barcode
//! payloads into the search.

mod commands;
mod config;

use std::io::Write;

use clap::{Parser, Subcommand};

use agromark_bff::{Confirmation, RefreshPolicy};
use agromark_types::Validade;

use crate::config::ClientConfig;

/// Agro Mark: gerência de lotes.
#[derive(Parser, Debug)]
#[command(name = "agromark", about = "Agro Mark batch management client")]
struct Cli {
    /// Path to client config file (default: ~/.agromark/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Server URL (overrides config and AGROMARK_SERVER).
    #[arg(long = "server", global = true)]
    server: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List batches.
    List {
        /// Only batches whose code contains this text (case-insensitive).
        #[arg(long)]
        busca: Option<String>,
    },

    /// Create a batch.
    Create {
        /// Batch name.
        #[arg(long)]
        nome: String,
        /// Expiry date, YYYY-MM-DD (default: today).
        #[arg(long, value_parser = parse_validade)]
        validade: Option<Validade>,
    },

    /// Delete a batch by code.
    Delete {
        /// Batch code.
        codigo: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Search with a scanned barcode payload.
    Scan {
        /// Decoded barcode text.
        payload: String,
    },

    /// Show or change client configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Change configuration values.
    Set {
        #[arg(long)]
        server: Option<String>,
        /// Request timeout in seconds (0 clears it).
        #[arg(long = "timeout")]
        timeout: Option<u64>,
        /// reset: a refresh clears the search; reapply: keeps it.
        #[arg(long = "refresh-policy", value_parser = parse_policy)]
        refresh_policy: Option<RefreshPolicy>,
    },
}

fn parse_validade(s: &str) -> Result<Validade, String> {
    s.parse::<Validade>().map_err(|e| e.to_string())
}

fn parse_policy(s: &str) -> Result<RefreshPolicy, String> {
    match s.to_lowercase().as_str() {
        "reset" => Ok(RefreshPolicy::Reset),
        "reapply" => Ok(RefreshPolicy::Reapply),
        other => Err(format!("unknown refresh policy {:?} (reset|reapply)", other)),
    }
}

/// Ask before deleting. Anything but yes cancels.
fn confirm_delete(codigo: &str) -> anyhow::Result<Confirmation> {
    eprint!("Deseja excluir o lote {}? [s/N]: ", codigo);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(if matches!(answer.as_str(), "s" | "sim" | "y" | "yes") {
        Confirmation::Destructive
    } else {
        Confirmation::Cancel
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so table/json output stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let json_output = cli.output == "json";

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(ClientConfig::default_path);

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config_path, json_output)?,
            ConfigAction::Set {
                server,
                timeout,
                refresh_policy,
            } => commands::config::set(&config_path, server.as_deref(), timeout, refresh_policy)?,
        },

        Commands::Version => {
            println!("agromark v{}", env!("CARGO_PKG_VERSION"));
        }

        command => {
            let config = ClientConfig::load(&config_path)?;
            let server = config.resolve_server(cli.server.as_deref());
            let flux = commands::lotes::connect(&config, &server)?;

            match command {
                Commands::List { busca } => {
                    commands::lotes::list(&flux, busca.as_deref(), json_output).await?;
                }
                Commands::Create { nome, validade } => {
                    commands::lotes::create(&flux, &nome, validade, json_output).await?;
                }
                Commands::Delete { codigo, yes } => {
                    let confirmation = if yes {
                        Confirmation::Destructive
                    } else {
                        confirm_delete(&codigo)?
                    };
                    commands::lotes::delete(&flux, &codigo, confirmation).await?;
                }
                Commands::Scan { payload } => {
                    commands::lotes::scan(&flux, &payload, json_output).await?;
                }
                Commands::Config { .. } | Commands::Version => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}
