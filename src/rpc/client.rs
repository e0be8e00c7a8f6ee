use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::Serialize;

use crate::tx::SignedTransaction;
use crate::utils::Result;

/// Block a state query is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Latest,
    Pending,
    Number(u64),
}

impl BlockRef {
    /// JSON-RPC block tag / quantity.
    pub fn as_param(&self) -> String {
        match self {
            BlockRef::Latest => "latest".into(),
            BlockRef::Pending => "pending".into(),
            BlockRef::Number(n) => format!("{n:#x}"),
        }
    }
}

/// Call object for gas estimation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Bytes>,
}

/// Inclusion record of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub success: bool,
}

/// Capabilities the harness needs from the node under test.
/// `JsonRpcClient` talks to a real node; the test-only `MockChain` simulates one.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Next nonce of `account` as of `block`.
    async fn nonce_at(&self, account: Address, block: BlockRef) -> Result<u64>;

    /// Next nonce including the node's pending pool.
    async fn pending_nonce(&self, account: Address) -> Result<u64>;

    async fn chain_id(&self) -> Result<u64>;

    async fn suggest_gas_price(&self) -> Result<u128>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64>;

    async fn balance_at(&self, account: Address, block: BlockRef) -> Result<U256>;

    /// Broadcast. A validation failure reported by the node is
    /// `SpamError::SubmissionRejected`, transport trouble is `SpamError::Rpc`.
    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<B256>;

    /// `None` while the transaction is not included.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>>;
}
