//! Run configuration: built once from the command line, immutable for the run.

pub mod keys_file;

pub use keys_file::KeysFile;

use std::time::Duration;

use crate::account::Account;
use crate::spammer::invalid::FaultKind;
use crate::tx::INTRINSIC_GAS;
use crate::utils::{Result, SpamError};

/// Block gas budget used to size rounds when no tx count is given.
pub const BLOCK_GAS_TARGET: u64 = 30_000_000;

/// Which invalid-transaction kinds a single-shot round exercises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultSelection {
    pub invalid_gas: bool,
    pub invalid_nonce: bool,
    pub invalid_negative_value: bool,
    pub invalid_gas_price_zero: bool,
    pub invalid_signature: bool,
    pub invalid_chain_id: bool,
    pub lack_of_funds: bool,
}

impl FaultSelection {
    pub fn only(kind: FaultKind) -> Self {
        let mut sel = Self::default();
        sel.set(kind, true);
        sel
    }

    pub fn set(&mut self, kind: FaultKind, on: bool) {
        match kind {
            FaultKind::InvalidGas => self.invalid_gas = on,
            FaultKind::InvalidNonce => self.invalid_nonce = on,
            FaultKind::InvalidNegativeValue => self.invalid_negative_value = on,
            FaultKind::InvalidGasPriceZero => self.invalid_gas_price_zero = on,
            FaultKind::InvalidSignature => self.invalid_signature = on,
            FaultKind::InvalidChainId => self.invalid_chain_id = on,
            FaultKind::LackOfFunds => self.lack_of_funds = on,
        }
    }

    pub fn is_enabled(&self, kind: FaultKind) -> bool {
        match kind {
            FaultKind::InvalidGas => self.invalid_gas,
            FaultKind::InvalidNonce => self.invalid_nonce,
            FaultKind::InvalidNegativeValue => self.invalid_negative_value,
            FaultKind::InvalidGasPriceZero => self.invalid_gas_price_zero,
            FaultKind::InvalidSignature => self.invalid_signature,
            FaultKind::InvalidChainId => self.invalid_chain_id,
            FaultKind::LackOfFunds => self.lack_of_funds,
        }
    }

    /// Enabled kinds in dispatch order.
    pub fn enabled(&self) -> Vec<FaultKind> {
        FaultKind::ALL.into_iter().filter(|k| self.is_enabled(*k)).collect()
    }

    pub fn any(&self) -> bool {
        !self.enabled().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub rpc_url: String,
    pub faucet: Account,
    /// Fuzz accounts, in recovery and funding order.
    pub accounts: Vec<Account>,
    /// Transactions per fuzz account per round.
    pub tx_per_round: u64,
    /// Gas limit ceiling for every generated transaction.
    pub gas_limit: u64,
    pub slot_time: Duration,
    pub access_list: bool,
    pub seed: u64,
    pub faults: FaultSelection,
    /// Single-shot rounds also send a batch of filler transactions.
    pub valid_txs: bool,
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            return Err(SpamError::Config("at least one fuzz account is required".into()));
        }
        if self.gas_limit < INTRINSIC_GAS {
            return Err(SpamError::Config(format!(
                "gas limit {} is below the intrinsic transfer cost {INTRINSIC_GAS}",
                self.gas_limit
            )));
        }
        if self.tx_per_round == 0 {
            return Err(SpamError::Config("transactions per round must be > 0".into()));
        }
        if self.slot_time.is_zero() {
            return Err(SpamError::Config("slot time must be > 0".into()));
        }
        Ok(())
    }

    /// Faucet first, then every fuzz account.
    pub fn all_accounts(&self) -> impl Iterator<Item = &Account> {
        std::iter::once(&self.faucet).chain(self.accounts.iter())
    }
}

/// Transactions per account that fill one block: `30M / (accounts * gas_limit)`, at least 1.
pub fn best_estimate_tx_count(accounts: usize, gas_limit: u64) -> u64 {
    let per_round = (accounts as u64).saturating_mul(gas_limit.max(1));
    if per_round == 0 {
        return 1;
    }
    (BLOCK_GAS_TARGET / per_round).max(1)
}
