//! Faucet-funded top-ups of the fuzz accounts.

use alloy_primitives::{Address, B256, U256};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::rpc::{wait_mined, BlockRef, ChainClient, TX_TIMEOUT};
use crate::tx::{sign_tx, TxBuilder};
use crate::utils::{Result, SpamError};

const GWEI: u64 = 1_000_000_000;

/// Per-transaction cushion for spam rounds.
pub const SPAM_CUSHION_GWEI: u64 = 1_000_000;

/// Per-transaction cushion for the one-shot `airdrop` command.
pub const AIRDROP_CUSHION_GWEI: u64 = 100_000;

/// Amount each fuzz account receives ahead of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingCalculator {
    cushion_wei: U256,
}

impl FundingCalculator {
    pub fn with_cushion_gwei(gwei: u64) -> Self {
        Self { cushion_wei: U256::from(gwei) * U256::from(GWEI) }
    }

    pub fn spam() -> Self {
        Self::with_cushion_gwei(SPAM_CUSHION_GWEI)
    }

    pub fn airdrop() -> Self {
        Self::with_cushion_gwei(AIRDROP_CUSHION_GWEI)
    }

    /// `cushion * tx_count`.
    pub fn amount(&self, tx_count: u64) -> U256 {
        self.cushion_wei.saturating_mul(U256::from(tx_count))
    }
}

/// Transfers `value` from the faucet to every fuzz account, one at a time.
pub struct Airdropper<'a> {
    client: &'a dyn ChainClient,
    wait: Duration,
}

impl<'a> Airdropper<'a> {
    pub fn new(client: &'a dyn ChainClient) -> Self {
        Self { client, wait: TX_TIMEOUT }
    }

    /// Returns the hash of the last transfer once it is included.
    pub async fn airdrop(&self, config: &RunConfig, value: U256) -> Result<Option<B256>> {
        let faucet = &config.faucet;
        let builder = TxBuilder::new(self.client, config.gas_limit);
        info!(accounts = config.accounts.len(), %value, "airdropping to fuzz accounts");

        let balance = self.client.balance_at(faucet.address(), BlockRef::Latest).await?;
        let needed = value.saturating_mul(U256::from(config.accounts.len()));
        if balance < needed {
            warn!(faucet = %faucet.address(), %balance, %needed, "faucet balance does not cover the airdrop");
        }

        let mut last: Option<(Address, B256)> = None;
        for account in &config.accounts {
            let to = account.address();
            // re-read every time; the previous transfer may not be pending yet
            let nonce = self.client.pending_nonce(faucet.address()).await?;
            let tx = builder.transfer(faucet.address(), to, value, nonce).await.map_err(|e| funding(to, e))?;
            let signed = sign_tx(tx, faucet)?;
            let hash = self.client.send_transaction(&signed).await.map_err(|e| funding(to, e))?;
            debug!(%to, nonce, %hash, "funding transfer sent");
            last = Some((to, hash));
        }

        let Some((to, hash)) = last else {
            return Ok(None);
        };
        wait_mined(self.client, hash, self.wait).await.map_err(|e| funding(to, e))?;
        info!(%hash, "airdrop complete");
        Ok(Some(hash))
    }
}

fn funding(address: Address, err: SpamError) -> SpamError {
    SpamError::Funding { address, reason: err.to_string() }
}
