//! Nonce-gap recovery ("unstuck").
//!
//! An account is stuck when a transaction at some nonce was dropped or
//! underpriced: every later nonce waits behind it. Recovery fills the
//! missing nonces with 1-wei self-transfers priced to replace whatever sits
//! in the pool, in batches of at most [`BATCH_SIZE`], for at most
//! [`MAX_ATTEMPTS`] batches.

use alloy_primitives::Address;
use std::time::Duration;
use tracing::{info, warn};

use crate::account::{Account, ChainObservation};
use crate::config::RunConfig;
use crate::rpc::{wait_mined, ChainClient, UNSTUCK_TIMEOUT};
use crate::tx::{sign_tx, TxBuilder, INTRINSIC_GAS};
use crate::utils::{Result, SpamError};

/// Most self-transfers in flight per account at once.
pub const BATCH_SIZE: u64 = 50;

/// Batches attempted before giving up on an account.
pub const MAX_ATTEMPTS: usize = 100;

/// Replacement transactions pay this multiple of the suggested gas price.
pub const REPLACEMENT_PRICE_MULTIPLIER: u128 = 100;

/// What recovery did for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryOutcome {
    pub address: Address,
    /// Gap observed on entry.
    pub initial_gap: u64,
    /// Batches broadcast.
    pub batches: usize,
    /// Self-transfers admitted by the node.
    pub sent: u64,
}

pub struct Unstucker<'a> {
    client: &'a dyn ChainClient,
    batch_wait: Duration,
}

impl<'a> Unstucker<'a> {
    pub fn new(client: &'a dyn ChainClient) -> Self {
        Self { client, batch_wait: UNSTUCK_TIMEOUT }
    }

    /// Recover the faucet, then every fuzz account, one at a time.
    pub async fn unstuck_all(&self, config: &RunConfig) -> Result<Vec<RecoveryOutcome>> {
        let mut outcomes = Vec::with_capacity(config.accounts.len() + 1);
        for account in config.all_accounts() {
            outcomes.push(self.try_unstuck(account).await?);
        }
        Ok(outcomes)
    }

    /// Close the nonce gap of `account` or fail with `RecoveryTimeout`.
    pub async fn try_unstuck(&self, account: &Account) -> Result<RecoveryOutcome> {
        let address = account.address();
        let builder = TxBuilder::new(self.client, INTRINSIC_GAS)
            .with_price_multiplier(REPLACEMENT_PRICE_MULTIPLIER);
        let mut outcome = RecoveryOutcome { address, initial_gap: 0, batches: 0, sent: 0 };

        for attempt in 0..MAX_ATTEMPTS {
            let obs = ChainObservation::fetch(self.client, address).await?;
            if attempt == 0 {
                outcome.initial_gap = obs.gap();
            }
            if !obs.is_stuck() {
                return Ok(outcome);
            }

            let count = obs.gap().min(BATCH_SIZE);
            info!(%address, attempt, first_nonce = obs.confirmed, count, "sending transactions to unstuck account");

            // broadcast the whole batch before waiting on any of it
            let mut last = None;
            for tx in builder.self_transfers(address, obs.confirmed, count).await? {
                let nonce = tx.nonce;
                let signed = sign_tx(tx, account)?;
                match self.client.send_transaction(&signed).await {
                    Ok(hash) => {
                        outcome.sent += 1;
                        last = Some(hash);
                    }
                    Err(SpamError::SubmissionRejected(reason)) => {
                        warn!(%address, nonce, %reason, "unstuck transaction rejected");
                    }
                    Err(e) => return Err(e),
                }
            }
            outcome.batches += 1;

            let Some(hash) = last else {
                warn!(%address, attempt, "no unstuck transaction of the batch was admitted");
                continue;
            };
            match wait_mined(self.client, hash, self.batch_wait).await {
                Ok(_) => {}
                Err(e @ SpamError::InclusionTimeout { .. }) => {
                    warn!(%address, attempt, error = %e, "unstuck batch not mined in time");
                }
                Err(e) => return Err(e),
            }
        }

        let obs = ChainObservation::fetch(self.client, address).await?;
        if !obs.is_stuck() {
            return Ok(outcome);
        }
        warn!(%address, remaining = obs.gap(), "could not unstuck account after {MAX_ATTEMPTS} tries");
        Err(SpamError::RecoveryTimeout { address, attempts: MAX_ATTEMPTS, remaining: obs.gap() })
    }
}
