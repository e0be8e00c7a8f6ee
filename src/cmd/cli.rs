use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::account::{derive_fuzz_accounts, Account, Role};
use crate::config::{best_estimate_tx_count, FaultSelection, KeysFile, RunConfig};
use crate::rpc::JsonRpcClient;
use crate::spammer::{
    Airdropper, FaultKind, FaultOutcome, FundingCalculator, RandomFiller, Spammer, Unstucker,
};
use crate::utils::init_logging;

/// Well-known development faucet key.
pub const DEFAULT_FAUCET_KEY: &str = "0xcdfbe6f7602f67a97602e3e9fc24cde1cdffa88acd47745c0b84c5ff55891e1b";

/// Fault-injection and load harness for execution nodes.
#[derive(Parser, Debug)]
#[clap(name = "txfuzz", version)]
pub struct Cli {
    /// Log level used when RUST_LOG is unset
    #[clap(long, global = true, default_value = "info")]
    pub log_level: String,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Airdrop to the fuzz accounts
    Airdrop(SpamArgs),
    /// Send valid spam transactions, round after round
    Spam(SpamArgs),
    /// Send a single round of the selected invalid transactions
    #[clap(name = "singleSpam")]
    SingleSpam(SpamArgs),
    /// Create ephemeral accounts
    Create {
        /// number of accounts to generate
        #[clap(long, default_value_t = 100)]
        accounts: usize,

        /// write the secrets to this TOML keys file
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Close the nonce gap of the faucet and every fuzz account
    Unstuck(SpamArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SpamArgs {
    /// RPC provider
    #[clap(long, default_value = "http://127.0.0.1:8544")]
    pub rpc: String,

    /// Faucet secret key
    #[clap(long, default_value = DEFAULT_FAUCET_KEY)]
    pub sk: String,

    /// Seed for the filler RNG, 0 picks a random one
    #[clap(long, default_value_t = 0)]
    pub seed: u64,

    /// Disable access list creation
    #[clap(long)]
    pub no_al: bool,

    /// Count of accounts to send transactions from
    #[clap(long, default_value_t = 100)]
    pub accounts: usize,

    /// Transactions per account per block, 0 = best estimate
    #[clap(long, default_value_t = 0)]
    pub txcount: u64,

    /// Gas limit used for transactions
    #[clap(long, default_value_t = 100_000)]
    pub gaslimit: u64,

    /// Slot time in seconds
    #[clap(long, default_value_t = 12)]
    pub slot_time: u64,

    /// TOML keys file to take fuzz accounts from, instead of deriving them
    #[clap(long)]
    pub keys: Option<PathBuf>,

    /// Send transactions with a gas limit below the intrinsic cost
    #[clap(long)]
    pub invalid_gas: bool,

    /// Send transactions with an already used nonce
    #[clap(long)]
    pub invalid_nonce: bool,

    /// Send transactions with a negative value
    #[clap(long)]
    pub invalid_negative_value: bool,

    /// Send transactions with a zero gas price
    #[clap(long)]
    pub invalid_gas_price_zero: bool,

    /// Send transactions with a corrupted signature
    #[clap(long)]
    pub invalid_signature: bool,

    /// Send transactions signed for another chain id
    #[clap(long)]
    pub invalid_chain_id: bool,

    /// Send transactions from a sender without funds
    #[clap(long)]
    pub lack_of_funds: bool,

    /// Also send random valid transactions
    #[clap(long)]
    pub valid_txs: bool,
}

impl SpamArgs {
    pub fn faults(&self) -> FaultSelection {
        let mut sel = FaultSelection::default();
        for (kind, on) in [
            (FaultKind::InvalidGas, self.invalid_gas),
            (FaultKind::InvalidNonce, self.invalid_nonce),
            (FaultKind::InvalidNegativeValue, self.invalid_negative_value),
            (FaultKind::InvalidGasPriceZero, self.invalid_gas_price_zero),
            (FaultKind::InvalidSignature, self.invalid_signature),
            (FaultKind::InvalidChainId, self.invalid_chain_id),
            (FaultKind::LackOfFunds, self.lack_of_funds),
        ] {
            sel.set(kind, on);
        }
        sel
    }

    /// Resolve keys, seed and transaction count into a validated run config.
    pub fn into_config(self) -> Result<RunConfig> {
        let faucet = Account::from_hex(&self.sk, Role::Faucet).context("parsing --sk")?;
        let accounts = match &self.keys {
            Some(path) => KeysFile::load(path)?.accounts(self.accounts)?,
            None => derive_fuzz_accounts(&faucet, self.accounts)?,
        };
        let seed = if self.seed == 0 { rand::random() } else { self.seed };
        let tx_per_round = if self.txcount == 0 {
            best_estimate_tx_count(accounts.len(), self.gaslimit)
        } else {
            self.txcount
        };
        let faults = self.faults();
        let config = RunConfig {
            rpc_url: self.rpc,
            faucet,
            accounts,
            tx_per_round,
            gas_limit: self.gaslimit,
            slot_time: Duration::from_secs(self.slot_time),
            access_list: !self.no_al,
            seed,
            faults,
            valid_txs: self.valid_txs,
        };
        config.validate()?;
        info!(
            faucet = %config.faucet.address(),
            accounts = config.accounts.len(),
            tx_per_round,
            seed,
            "configuration loaded"
        );
        Ok(config)
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.cmd {
        Cmd::Create { accounts, out } => create(accounts, out),
        Cmd::Airdrop(args) => {
            let config = args.into_config()?;
            let client = JsonRpcClient::new(&config.rpc_url)?;
            let value = FundingCalculator::airdrop().amount(config.tx_per_round);
            Airdropper::new(&client).airdrop(&config, value).await?;
            Ok(())
        }
        Cmd::Unstuck(args) => {
            let config = args.into_config()?;
            let client = JsonRpcClient::new(&config.rpc_url)?;
            for outcome in Unstucker::new(&client).unstuck_all(&config).await? {
                if outcome.initial_gap > 0 {
                    info!(address = %outcome.address, closed = outcome.initial_gap, batches = outcome.batches, "account unstuck");
                }
            }
            Ok(())
        }
        Cmd::Spam(args) => {
            let mut spammer = build_spammer(args)?;
            spammer.run_continuous().await?;
            Ok(())
        }
        Cmd::SingleSpam(args) => {
            let mut spammer = build_spammer(args)?;
            let summary = spammer.run_single().await?;
            for report in &summary.faults {
                match &report.outcome {
                    FaultOutcome::Accepted(hash) => warn!(kind = %report.kind, %hash, "accepted"),
                    FaultOutcome::Rejected(reason) => info!(kind = %report.kind, %reason, "rejected"),
                    FaultOutcome::Unencodable(reason) => info!(kind = %report.kind, %reason, "unencodable"),
                }
            }
            Ok(())
        }
    }
}

fn build_spammer(args: SpamArgs) -> Result<Spammer> {
    let config = args.into_config()?;
    let client = Arc::new(JsonRpcClient::new(&config.rpc_url)?);
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, stopping after the current round");
                let _ = stop_tx.send(true);
            }
            Err(e) => error!(error = %e, "could not listen for ctrl-c"),
        }
    });
    Ok(Spammer::new(client, Arc::new(RandomFiller::new()), config, stop_rx)?)
}

/// Generate `count` fresh accounts; never touches the chain.
fn create(count: usize, out: Option<PathBuf>) -> Result<()> {
    let accounts: Vec<Account> = (0..count).map(|_| Account::generate(Role::Fuzz)).collect();
    for account in &accounts {
        println!("{} {}", account.address(), account.secret_hex());
    }
    if let Some(path) = out {
        KeysFile::from_accounts(&accounts).save(&path)?;
        info!(count, path = %path.display(), "keys written");
    }
    Ok(())
}
