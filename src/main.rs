//! CLI front-end for the holdings checker
//!
//! Checks one wallet against configured collections and prints a summary.
//! Exits 2 when any verdict is Unknown so schedulers can tell "could not
//! verify" apart from "verified absent".
use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;
use nftgate::{
    logger, CheckOptions, Config, ContractAddress, HoldingsChecker, OwnershipVerdict,
    WalletAddress,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nftgate", about = "Check NFT holdings via direct JSON-RPC")]
struct Args {
    /// Wallet address to check
    #[arg(long)]
    wallet: String,

    /// Aggregate-balance collection contract(s) to count (repeatable)
    #[arg(long = "contract")]
    contracts: Vec<String>,

    /// Also check the configured pass collection
    #[arg(long)]
    pass: bool,

    /// Allow the expensive per-token-ID deep scan for the pass collection
    #[arg(long)]
    deep_scan: bool,

    /// Skip cache reads (results are still written back)
    #[arg(long)]
    bypass_cache: bool,

    /// TOML config file; defaults plus NFTGATE_* env vars otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(logger::level_from_str(&args.log_level));

    let config = match &args.config {
        Some(path) => Config::load(path).context("failed to load config")?,
        None => Config::from_env(),
    };

    if args.contracts.is_empty() && !args.pass {
        bail!("nothing to do: pass --contract and/or --pass");
    }

    let wallet = WalletAddress::parse(&args.wallet).context("invalid --wallet")?;
    let contracts = args
        .contracts
        .iter()
        .map(|c| ContractAddress::parse(c))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --contract")?;

    let checker = HoldingsChecker::new(config).context("failed to build checker")?;

    let head = checker
        .preflight()
        .await
        .context("rpc endpoint unreachable")?;
    info!("connected, head block {}", head);

    let opts = CheckOptions {
        bypass_cache: args.bypass_cache,
        allow_deep_scan: args.deep_scan,
        ..Default::default()
    };

    let mut saw_unknown = false;

    for contract in &contracts {
        let result = checker.get_collection_count(&wallet, contract, opts).await;
        if result.success {
            let count = result.count.to_string();
            println!(
                "{}  {}  {} token(s)  [{}]",
                wallet,
                contract,
                if result.count > 0 { count.green() } else { count.normal() },
                result.standard_used
            );
        } else {
            saw_unknown = true;
            println!(
                "{}  {}  {}",
                wallet,
                contract,
                "could not verify right now, try again later".yellow()
            );
        }
    }

    if args.pass {
        let status = checker.get_pass_status(&wallet, None, opts).await;
        let rendered = match status.verdict {
            OwnershipVerdict::Owned => "PASS HELD".green().bold(),
            OwnershipVerdict::NotOwned => "no pass".normal(),
            OwnershipVerdict::Unknown => {
                saw_unknown = true;
                "could not verify right now, try again later".yellow()
            }
        };
        println!("{}  pass: {}  (checked {})", wallet, rendered, status.checked_at);
    }

    if saw_unknown {
        std::process::exit(2);
    }
    Ok(())
}
