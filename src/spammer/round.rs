//! Round orchestration: recover, fund, dispatch, wait.

use alloy_primitives::U256;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::rpc::ChainClient;
use crate::spammer::airdrop::{Airdropper, FundingCalculator};
use crate::spammer::basic::BasicSender;
use crate::spammer::filler::TxFiller;
use crate::spammer::invalid::{FaultOutcome, FaultReport, InvalidTxGenerator, TRANSFER_VALUE};
use crate::spammer::stats::{Counters, RoundStats};
use crate::spammer::unstuck::Unstucker;
use crate::tx::{sign_tx, TxBuilder};
use crate::utils::{Result, SpamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Valid filler traffic, round after round until shutdown.
    Continuous,
    /// One round of the enabled fault generators.
    SingleShot,
}

/// What one round did.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub round: u64,
    pub counters: Counters,
    pub faults: Vec<FaultReport>,
}

pub struct Spammer {
    client: Arc<dyn ChainClient>,
    filler: Arc<dyn TxFiller>,
    config: RunConfig,
    stats: RoundStats,
    shutdown: watch::Receiver<bool>,
    rounds: u64,
}

impl Spammer {
    /// Validates `config`; nothing touches the chain until a run starts.
    pub fn new(
        client: Arc<dyn ChainClient>,
        filler: Arc<dyn TxFiller>,
        config: RunConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, filler, config, stats: RoundStats::new(), shutdown, rounds: 0 })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Loop rounds until shutdown is signalled. Returns the number of rounds run.
    pub async fn run_continuous(&mut self) -> Result<u64> {
        info!(
            accounts = self.config.accounts.len(),
            tx_per_round = self.config.tx_per_round,
            slot_time = ?self.config.slot_time,
            "starting continuous spam"
        );
        loop {
            if self.shutdown_requested() {
                break;
            }
            self.round(Mode::Continuous).await?;
            if self.wait_slot().await {
                break;
            }
        }
        info!(rounds = self.rounds, "spam stopped");
        Ok(self.rounds)
    }

    /// Exactly one round of fault injection.
    pub async fn run_single(&mut self) -> Result<RoundSummary> {
        let summary = self.round(Mode::SingleShot).await?;
        self.wait_slot().await;
        Ok(summary)
    }

    async fn round(&mut self, mode: Mode) -> Result<RoundSummary> {
        self.rounds += 1;
        let round = self.rounds;
        let client = self.client.as_ref();

        // recovery and funding failures end the run
        if let Err(e) = Unstucker::new(client).unstuck_all(&self.config).await {
            error!(round, error = %e, "recovery failed");
            return Err(e);
        }
        let value = FundingCalculator::spam().amount(self.config.tx_per_round);
        if let Err(e) = Airdropper::new(client).airdrop(&self.config, value).await {
            error!(round, error = %e, "funding failed");
            return Err(e);
        }

        let faults = match mode {
            Mode::Continuous => {
                self.send_filler().await;
                Vec::new()
            }
            Mode::SingleShot => self.dispatch_faults().await,
        };

        let counters = self.stats.take();
        info!(
            round,
            sent = counters.accepted + counters.rejected,
            accepted = counters.accepted,
            rejected = counters.rejected,
            anomalies = counters.anomalies,
            "round complete"
        );
        Ok(RoundSummary { round, counters, faults })
    }

    async fn send_filler(&self) {
        BasicSender::new(self.client.as_ref(), self.filler.as_ref(), &self.stats)
            .dispatch(&self.config, self.config.tx_per_round)
            .await;
    }

    /// Enabled generators in fixed order, plus a filler batch when asked for.
    /// With nothing enabled a single valid transfer goes out instead.
    async fn dispatch_faults(&self) -> Vec<FaultReport> {
        let kinds = self.config.faults.enabled();
        let mut reports = Vec::with_capacity(kinds.len());
        if kinds.is_empty() && !self.config.valid_txs {
            if let Err(e) = self.send_default_transfer().await {
                warn!(error = %e, "default transfer failed");
            }
            return reports;
        }

        // `validate` guarantees at least one fuzz account
        let sender = &self.config.accounts[0];
        let generator = InvalidTxGenerator::new(
            self.client.as_ref(),
            sender,
            self.config.faucet.address(),
            self.config.gas_limit,
        );
        for kind in kinds {
            match generator.generate(kind).await {
                Ok(report) => {
                    match &report.outcome {
                        FaultOutcome::Accepted(_) => self.stats.anomaly(),
                        FaultOutcome::Rejected(reason) | FaultOutcome::Unencodable(reason) => {
                            self.stats.rejected(reason)
                        }
                    }
                    reports.push(report);
                }
                Err(e) => warn!(%kind, error = %e, "could not build invalid transaction"),
            }
        }

        if self.config.valid_txs {
            self.send_filler().await;
        }
        reports
    }

    async fn send_default_transfer(&self) -> Result<()> {
        let client = self.client.as_ref();
        let sender = &self.config.accounts[0];
        let nonce = client.pending_nonce(sender.address()).await?;
        let tx = TxBuilder::new(client, self.config.gas_limit)
            .transfer(sender.address(), self.config.faucet.address(), U256::from(TRANSFER_VALUE), nonce)
            .await?;
        match client.send_transaction(&sign_tx(tx, sender)?).await {
            Ok(hash) => {
                info!(%hash, "default transfer sent");
                self.stats.accepted();
                Ok(())
            }
            Err(SpamError::SubmissionRejected(reason)) => {
                self.stats.rejected(&reason);
                Err(SpamError::SubmissionRejected(reason))
            }
            Err(e) => Err(e),
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep one slot. Returns `true` if shutdown was requested meanwhile.
    async fn wait_slot(&mut self) -> bool {
        let slot = self.config.slot_time;
        let interrupted = tokio::select! {
            _ = tokio::time::sleep(slot) => false,
            _ = wait_for_shutdown(&mut self.shutdown) => true,
        };
        if interrupted {
            info!("shutdown requested");
        }
        interrupted || self.shutdown_requested()
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        // sender dropped: no shutdown can arrive any more
        std::future::pending::<()>().await;
    }
}
