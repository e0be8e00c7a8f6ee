use alloy_primitives::{Address, U256};

use crate::rpc::{BlockRef, CallRequest, ChainClient};
use crate::tx::Transaction;
use crate::utils::Result;

/// Intrinsic gas of a plain value transfer.
pub const INTRINSIC_GAS: u64 = 21_000;

/// Network parameters read once per built transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    pub chain_id: u64,
    pub gas_price: u128,
}

/// Builds valid transfers from live chain state.
pub struct TxBuilder<'a> {
    client: &'a dyn ChainClient,
    gas_ceiling: u64,
    price_multiplier: u128,
}

impl<'a> TxBuilder<'a> {
    pub fn new(client: &'a dyn ChainClient, gas_ceiling: u64) -> Self {
        Self { client, gas_ceiling, price_multiplier: 1 }
    }

    /// Scale the suggested gas price, e.g. to outbid a stuck transaction at the same nonce.
    pub fn with_price_multiplier(mut self, multiplier: u128) -> Self {
        self.price_multiplier = multiplier.max(1);
        self
    }

    pub async fn chain_params(&self) -> Result<ChainParams> {
        let chain_id = self.client.chain_id().await?;
        let suggested = self.client.suggest_gas_price().await?;
        Ok(ChainParams {
            chain_id,
            gas_price: suggested.saturating_mul(self.price_multiplier),
        })
    }

    /// Gas estimate for a transfer, clamped to the configured ceiling.
    pub async fn estimate_transfer_gas(&self, from: Address, to: Address, value: U256, gas_price: u128) -> Result<u64> {
        let call = CallRequest {
            from,
            to,
            value,
            gas_price: Some(U256::from(gas_price)),
            input: None,
        };
        let estimate = self.client.estimate_gas(&call).await?;
        Ok(estimate.min(self.gas_ceiling))
    }

    /// Transfer at an explicit nonce with an estimated gas limit.
    pub async fn transfer(&self, from: Address, to: Address, value: U256, nonce: u64) -> Result<Transaction> {
        let params = self.chain_params().await?;
        let gas = self.estimate_transfer_gas(from, to, value, params.gas_price).await?;
        Ok(Transaction::transfer(params.chain_id, nonce, to, value, gas, params.gas_price))
    }

    /// Transfer with a caller-chosen gas limit. Skips `eth_estimateGas`,
    /// which nodes refuse for senders that cannot cover the value.
    pub async fn transfer_with_gas(&self, to: Address, value: U256, nonce: u64, gas_limit: u64) -> Result<Transaction> {
        let params = self.chain_params().await?;
        Ok(Transaction::transfer(params.chain_id, nonce, to, value, gas_limit, params.gas_price))
    }

    /// Transfer at the sender's confirmed nonce: the reference every fault
    /// variant is derived from.
    pub async fn baseline(&self, from: Address, to: Address, value: U256) -> Result<Transaction> {
        let nonce = self.client.nonce_at(from, BlockRef::Latest).await?;
        self.transfer(from, to, value, nonce).await
    }

    /// `count` consecutive 1-wei self-transfers starting at `first_nonce`,
    /// all at the intrinsic gas limit.
    pub async fn self_transfers(&self, account: Address, first_nonce: u64, count: u64) -> Result<Vec<Transaction>> {
        let params = self.chain_params().await?;
        Ok((0..count)
            .map(|i| {
                Transaction::transfer(
                    params.chain_id,
                    first_nonce + i,
                    account,
                    U256::from(1),
                    INTRINSIC_GAS,
                    params.gas_price,
                )
            })
            .collect())
    }
}
