//! Invalid-transaction generators.
//!
//! Every generator starts from a valid baseline built from live chain state
//! and overrides exactly one dimension of it. The node is expected to refuse
//! the result; admission is reported as an anomaly.

use alloy_primitives::{Address, PrimitiveSignature, B256, U256};
use std::fmt;
use tracing::{info, warn};

use crate::account::{Account, Role};
use crate::rpc::{BlockRef, ChainClient};
use crate::tx::{sign_tx, SignedTransaction, Transaction, TxBuilder, INTRINSIC_GAS};
use crate::utils::{Result, SpamError};

/// 1 gwei.
pub const TRANSFER_VALUE: u64 = 1_000_000_000;

/// Fault transactions outbid the suggested price by this factor.
pub const FAULT_PRICE_MULTIPLIER: u128 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    InvalidGas,
    InvalidNonce,
    InvalidNegativeValue,
    InvalidGasPriceZero,
    InvalidSignature,
    InvalidChainId,
    LackOfFunds,
}

impl FaultKind {
    /// Every kind, in the order a single-shot round dispatches them.
    pub const ALL: [FaultKind; 7] = [
        FaultKind::InvalidGas,
        FaultKind::InvalidNonce,
        FaultKind::InvalidNegativeValue,
        FaultKind::InvalidGasPriceZero,
        FaultKind::InvalidSignature,
        FaultKind::InvalidChainId,
        FaultKind::LackOfFunds,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FaultKind::InvalidGas => "invalid-gas",
            FaultKind::InvalidNonce => "invalid-nonce",
            FaultKind::InvalidNegativeValue => "invalid-negative-value",
            FaultKind::InvalidGasPriceZero => "invalid-gas-price-zero",
            FaultKind::InvalidSignature => "invalid-signature",
            FaultKind::InvalidChainId => "invalid-chain-id",
            FaultKind::LackOfFunds => "lack-of-funds",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultOutcome {
    /// The node admitted an invalid transaction.
    Accepted(B256),
    /// The node refused it, with the node's reason.
    Rejected(String),
    /// The local encoder could not express it.
    Unencodable(String),
}

impl FaultOutcome {
    pub fn is_anomaly(&self) -> bool {
        matches!(self, FaultOutcome::Accepted(_))
    }
}

/// One generated fault: the baseline it came from, what was sent, and how
/// the node answered.
#[derive(Debug, Clone)]
pub struct FaultReport {
    pub kind: FaultKind,
    pub sender: Address,
    pub baseline: Transaction,
    pub sent: SignedTransaction,
    pub outcome: FaultOutcome,
}

pub struct InvalidTxGenerator<'a> {
    client: &'a dyn ChainClient,
    sender: &'a Account,
    to: Address,
    gas_ceiling: u64,
}

impl<'a> InvalidTxGenerator<'a> {
    pub fn new(client: &'a dyn ChainClient, sender: &'a Account, to: Address, gas_ceiling: u64) -> Self {
        Self { client, sender, to, gas_ceiling }
    }

    /// Build, sign and submit one transaction of `kind`.
    ///
    /// Node rejections and encoder refusals are outcomes, not errors; only
    /// transport failures while reading chain state are returned as `Err`.
    pub async fn generate(&self, kind: FaultKind) -> Result<FaultReport> {
        let ephemeral;
        let sender = if kind == FaultKind::LackOfFunds {
            ephemeral = Account::generate(Role::Fuzz);
            &ephemeral
        } else {
            self.sender
        };

        let builder = TxBuilder::new(self.client, self.gas_ceiling).with_price_multiplier(FAULT_PRICE_MULTIPLIER);
        let value = U256::from(TRANSFER_VALUE);
        let baseline = if kind == FaultKind::LackOfFunds {
            // an unfunded sender fails gas estimation, so the limit is fixed
            let nonce = self.client.nonce_at(sender.address(), BlockRef::Latest).await?;
            builder.transfer_with_gas(self.to, value, nonce, INTRINSIC_GAS).await?
        } else {
            builder.baseline(sender.address(), self.to, value).await?
        };
        let tx = apply_fault(kind, baseline.clone());

        let signed = match sign_fault(kind, tx.clone(), sender) {
            Ok(signed) => signed,
            Err(SpamError::Encode(e)) => {
                info!(%kind, error = %e, "encoder refused invalid transaction");
                return Ok(FaultReport {
                    kind,
                    sender: sender.address(),
                    baseline,
                    // kept unsigned: there is no hash to sign
                    sent: tx.into_signed(PrimitiveSignature::new(U256::ZERO, U256::ZERO, false)),
                    outcome: FaultOutcome::Unencodable(e.to_string()),
                });
            }
            Err(e) => return Err(e),
        };

        let outcome = match self.client.send_transaction(&signed).await {
            Ok(hash) => {
                warn!(%kind, %hash, sender = %sender.address(), "node accepted invalid transaction");
                FaultOutcome::Accepted(hash)
            }
            Err(SpamError::SubmissionRejected(reason)) => {
                info!(%kind, %reason, "invalid transaction rejected");
                FaultOutcome::Rejected(reason)
            }
            Err(SpamError::Encode(e)) => {
                info!(%kind, error = %e, "encoder refused invalid transaction");
                FaultOutcome::Unencodable(e.to_string())
            }
            Err(e) => return Err(e),
        };

        Ok(FaultReport { kind, sender: sender.address(), baseline, sent: signed, outcome })
    }
}

/// Override the one dimension `kind` names.
pub fn apply_fault(kind: FaultKind, mut tx: Transaction) -> Transaction {
    match kind {
        FaultKind::InvalidGas => tx.gas_limit = INTRINSIC_GAS - 1,
        FaultKind::InvalidNonce => {
            // reuse a spent nonce when there is one, else jump to the end of the range
            tx.nonce = if tx.nonce > 0 { tx.nonce - 1 } else { u64::MAX };
        }
        FaultKind::InvalidNegativeValue => tx.value = -tx.value,
        FaultKind::InvalidGasPriceZero => tx.gas_price = 0,
        FaultKind::InvalidChainId => tx.chain_id = tx.chain_id.wrapping_add(1),
        // the fault lives outside the transaction body: sender or signature
        FaultKind::InvalidSignature | FaultKind::LackOfFunds => {}
    }
    tx
}

fn sign_fault(kind: FaultKind, tx: Transaction, sender: &Account) -> Result<SignedTransaction> {
    let mut signed = sign_tx(tx, sender)?;
    if kind == FaultKind::InvalidSignature {
        signed.signature = PrimitiveSignature::new(U256::ZERO, signed.signature.s(), signed.signature.v());
    }
    Ok(signed)
}
