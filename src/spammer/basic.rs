//! Valid-transaction dispatch: one worker per fuzz account.

use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::config::RunConfig;
use crate::rpc::{wait_mined, ChainClient, TX_TIMEOUT};
use crate::spammer::filler::{FillRequest, TxFiller};
use crate::spammer::stats::RoundStats;
use crate::tx::sign_tx;
use crate::utils::{Result, SpamError};

/// Pause between two sends from the same account.
pub const SEND_PACING: Duration = Duration::from_millis(10);

pub struct BasicSender<'a> {
    client: &'a dyn ChainClient,
    filler: &'a dyn TxFiller,
    stats: &'a RoundStats,
}

impl<'a> BasicSender<'a> {
    pub fn new(client: &'a dyn ChainClient, filler: &'a dyn TxFiller, stats: &'a RoundStats) -> Self {
        Self { client, filler, stats }
    }

    /// Run `count` transactions from every fuzz account concurrently.
    /// A failing account is logged; the others carry on.
    pub async fn dispatch(&self, config: &RunConfig, count: u64) {
        let workers = config.accounts.iter().map(|account| async move {
            if let Err(e) = self.send_from(config, account, count).await {
                warn!(account = %account.address(), error = %e, "filler worker stopped");
            }
        });
        join_all(workers).await;
    }

    /// Send `count` filler transactions from `account` in increasing nonce
    /// order, then wait for the last one to be included.
    pub async fn send_from(&self, config: &RunConfig, account: &Account, count: u64) -> Result<u64> {
        let sender = account.address();
        let chain_id = self.client.chain_id().await?;
        let gas_price = self.client.suggest_gas_price().await?;
        let mut nonce = self.client.pending_nonce(sender).await?;

        let mut sent = 0;
        let mut last = None;
        for i in 0..count {
            let req = FillRequest {
                sender,
                nonce,
                seed: config.seed.wrapping_add(i),
                access_list: config.access_list,
                chain_id,
                gas_price,
                gas_limit: config.gas_limit,
            };
            let tx = self.filler.fill(req).await?;
            let signed = sign_tx(tx, account)?;
            match self.client.send_transaction(&signed).await {
                Ok(hash) => {
                    debug!(%sender, nonce, %hash, "filler transaction sent");
                    self.stats.accepted();
                    last = Some(hash);
                    sent += 1;
                    nonce += 1;
                }
                // the nonce is still free; the next transaction reuses it
                Err(SpamError::SubmissionRejected(reason)) => {
                    warn!(%sender, nonce, %reason, "could not submit transaction");
                    self.stats.rejected(&reason);
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(SEND_PACING).await;
        }

        if let Some(hash) = last {
            match wait_mined(self.client, hash, TX_TIMEOUT).await {
                Ok(receipt) => info!(%sender, sent, block = receipt.block_number, "filler batch included"),
                Err(e) => warn!(%sender, error = %e, "waiting for transactions to be mined failed"),
            }
        }
        Ok(sent)
    }
}
