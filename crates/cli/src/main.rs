mod config;
mod demo;
mod logging;
mod render;
mod shell;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use vault_chain::MemoryContract;
use vault_fhe::DevEncryption;
use vault_workflow::WorkflowEngine;

use crate::config::CliConfig;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Encrypted research vault workflow driver.
#[derive(Parser)]
#[command(name = "vault", version, about = "Encrypted research vault workflow driver")]
struct Cli {
    /// Path to a TOML config file (default: ./vault.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "vault_workflow=debug" (RUST_LOG wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect, upload one record, decrypt and verify it
    Demo {
        /// Research name
        #[arg(long, default_value = "Trial A")]
        name: String,
        /// Private data value to encrypt
        #[arg(long, default_value = "42")]
        value: String,
        /// Confidence score, 1 to 10
        #[arg(long, default_value = "8")]
        confidence: String,
        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Interactive shell over stdin
    Shell,
}

/// Engine over the in-memory contract and the development capability, with
/// the configured wallet as the contract's signer.
pub(crate) fn local_engine(config: &CliConfig) -> (MemoryContract, WorkflowEngine) {
    let contract = MemoryContract::new(config.chain.contract_address.clone());
    contract.connect_signer(config.chain.wallet_address.clone());
    let engine = WorkflowEngine::new(
        Arc::new(contract.clone()),
        Arc::new(DevEncryption::new()),
        config.workflow.clone(),
    );
    (contract, engine)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    if let Err(e) = logging::init(level, cli.log_json || config.logging.json) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    let (contract, engine) = local_engine(&config);
    let wallet = config.chain.wallet_address.clone();

    let code = match cli.command {
        Commands::Demo {
            name,
            value,
            confidence,
            description,
        } => {
            let args = demo::DemoArgs {
                name,
                value,
                confidence,
                description,
            };
            demo::run(&engine, &wallet, args, cli.output).await
        }
        Commands::Shell => {
            let shell = shell::Shell::new(engine, contract, wallet, cli.output);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            match shell.run(stdin).await {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("error reading input: {}", e);
                    1
                }
            }
        }
    };
    process::exit(code);
}
