//! Preflight CLI - check contract invocations before paying for them
//!
//! # Usage
//!
//! ```bash
//! # Amount conversion, no network
//! preflight amount parse 12.5 --decimals 7
//! preflight amount display 125000000 --decimals 7
//!
//! # Simulate any contract call
//! preflight simulate --contract C... --method transfer \
//!     --source G... --arg address:G... --arg address:G... --arg i128:10000000
//!
//! # Token and vesting reads
//! preflight balance --token C... --account G...
//! preflight vesting --contract C... --recipient G... --token C...
//!
//! # Track a submitted transaction
//! PREFLIGHT__NETWORK__NAME=futurenet preflight status <hash>
//! ```

mod args;
mod config;
mod display;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use preflight_contracts::{TokenClient, VestingClient};
use preflight_rpc::{RpcClient, SimulationClient};
use preflight_tx::{TokioClock, TransactionLifecycle, TxOutcome};
use preflight_types::{parse_to_raw, AccountId, ContractId, ScAddress, TokenAmount};

use crate::config::{CliConfig, NetworkSettings};

/// Preflight - simulate, inspect and track contract invocations
#[derive(Parser, Debug)]
#[command(name = "preflight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, global = true, env = "PREFLIGHT_CONFIG")]
    config: Option<String>,

    /// Network preset (testnet, futurenet, mainnet, local)
    #[arg(long, global = true)]
    network: Option<String>,

    /// RPC endpoint, overriding the network preset
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert between display and raw token amounts
    Amount {
        #[command(subcommand)]
        action: AmountCommands,
    },

    /// Simulate a contract call without submitting it
    Simulate {
        #[arg(long)]
        contract: ContractId,

        #[arg(long)]
        method: String,

        /// Call argument as TYPE:VALUE, repeatable
        #[arg(long = "arg", value_name = "TYPE:VALUE")]
        args: Vec<String>,

        /// Account the call would be sent from
        #[arg(long)]
        source: Option<AccountId>,
    },

    /// Show a token balance
    Balance {
        #[arg(long)]
        token: ContractId,

        #[arg(long)]
        account: ScAddress,
    },

    /// Show vesting progress for a recipient
    Vesting {
        #[arg(long)]
        contract: ContractId,

        #[arg(long)]
        recipient: ScAddress,

        /// Token contract, for displaying amounts with its decimals
        #[arg(long)]
        token: Option<ContractId>,
    },

    /// Poll a submitted transaction until it resolves
    Status {
        /// Transaction hash (hex)
        hash: String,
    },
}

#[derive(Subcommand, Debug)]
enum AmountCommands {
    /// Render a raw integer amount
    Display {
        raw: u128,

        #[arg(short, long, default_value = "7")]
        decimals: u32,
    },

    /// Parse a decimal amount into its raw integer
    Parse {
        amount: String,

        #[arg(short, long, default_value = "7")]
        decimals: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = CliConfig::load(cli.config.as_deref())?;
    if let Some(network) = cli.network {
        settings.network = NetworkSettings::named(network);
    }
    if let Some(url) = cli.rpc_url {
        settings.network.rpc_url = Some(url);
    }
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }

    init_logging(&settings.logging)?;

    let ok = match cli.command {
        Commands::Amount { action } => amount(action)?,
        Commands::Simulate {
            contract,
            method,
            args,
            source,
        } => simulate(&settings, contract, &method, &args, source).await?,
        Commands::Balance { token, account } => balance(&settings, token, &account).await?,
        Commands::Vesting {
            contract,
            recipient,
            token,
        } => vesting(&settings, contract, &recipient, token).await?,
        Commands::Status { hash } => status(&settings, &hash).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Logs go to stderr; stdout carries results
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn connect(settings: &CliConfig) -> anyhow::Result<(RpcClient, SimulationClient)> {
    let profile = settings.network.profile()?;
    let rpc_config = settings.rpc.rpc_config();

    tracing::info!(network = %profile.name, url = %profile.rpc_url, "Using network");

    let rpc = RpcClient::connect(profile.clone(), &rpc_config)?;
    let sim = SimulationClient::new(rpc.transport(), profile, rpc_config);
    Ok((rpc, sim))
}

fn amount(action: AmountCommands) -> anyhow::Result<bool> {
    match action {
        AmountCommands::Display { raw, decimals } => {
            println!("{}", TokenAmount::new(raw, decimals)?)
        }
        AmountCommands::Parse { amount, decimals } => {
            println!("{}", parse_to_raw(&amount, decimals)?)
        }
    }
    Ok(true)
}

async fn simulate(
    settings: &CliConfig,
    contract: ContractId,
    method: &str,
    raw_args: &[String],
    source: Option<AccountId>,
) -> anyhow::Result<bool> {
    let args = raw_args
        .iter()
        .map(|arg| args::parse_arg(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let (_, sim) = connect(settings)?;
    let result = sim.simulate(contract, method, args, source).await;
    display::preflight(method, &result);
    Ok(result.success())
}

async fn balance(settings: &CliConfig, token: ContractId, account: &ScAddress) -> anyhow::Result<bool> {
    let (_, sim) = connect(settings)?;
    let token = TokenClient::new(sim, token);

    let (amount, symbol) = futures::try_join!(token.balance_amount(account), token.symbol())?;
    println!("{} {}", amount, symbol);
    Ok(true)
}

async fn vesting(
    settings: &CliConfig,
    contract: ContractId,
    recipient: &ScAddress,
    token: Option<ContractId>,
) -> anyhow::Result<bool> {
    let (_, sim) = connect(settings)?;

    let decimals = match token {
        Some(token) => Some(TokenClient::new(sim.clone(), token).decimals().await?),
        None => None,
    };
    let progress = VestingClient::new(sim, contract).progress(recipient).await?;

    display::vesting(&progress, decimals);
    Ok(true)
}

async fn status(settings: &CliConfig, hash: &str) -> anyhow::Result<bool> {
    let (rpc, sim) = connect(settings)?;
    let lifecycle = TransactionLifecycle::new(
        rpc.transport(),
        sim,
        Arc::new(TokioClock),
        settings.poll.lifecycle_config(),
    );

    let outcome = lifecycle.poll_hash(hash).await?;
    display::outcome(&outcome);
    Ok(matches!(outcome, TxOutcome::Success { .. }))
}
