//! JSON-RPC over HTTP implementation of [`ChainClient`].

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::rpc::client::{BlockRef, CallRequest, ChainClient, TxReceipt};
use crate::tx::SignedTransaction;
use crate::utils::{Result, SpamError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct JsonRpcClient {
    client: HttpClient,
    url: String,
}

impl JsonRpcClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(url)
            .map_err(|e| SpamError::Config(format!("failed to build RPC client for {url}: {e}")))?;
        Ok(Self { client, url: url.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: ArrayParams) -> Result<R> {
        self.client
            .request(method, params)
            .await
            .map_err(|e| SpamError::Rpc(format!("{method}: {e}")))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    // absent before byzantium
    status: Option<U64>,
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn nonce_at(&self, account: Address, block: BlockRef) -> Result<u64> {
        let n: U64 = self
            .call("eth_getTransactionCount", rpc_params![account, block.as_param()])
            .await?;
        Ok(n.to::<u64>())
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64> {
        self.nonce_at(account, BlockRef::Pending).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.call("eth_chainId", rpc_params![]).await?;
        Ok(id.to::<u64>())
    }

    async fn suggest_gas_price(&self) -> Result<u128> {
        let price: U256 = self.call("eth_gasPrice", rpc_params![]).await?;
        Ok(price.saturating_to::<u128>())
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64> {
        let gas: U64 = self.call("eth_estimateGas", rpc_params![call]).await?;
        Ok(gas.to::<u64>())
    }

    async fn balance_at(&self, account: Address, block: BlockRef) -> Result<U256> {
        self.call("eth_getBalance", rpc_params![account, block.as_param()]).await
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<B256> {
        let raw = Bytes::from(tx.encode_2718()?);
        debug!(nonce = tx.nonce(), len = raw.len(), "eth_sendRawTransaction");
        match self.client.request("eth_sendRawTransaction", rpc_params![raw]).await {
            Ok(hash) => Ok(hash),
            // an error object in the response is the node's admission verdict
            Err(ClientError::Call(obj)) => Err(SpamError::SubmissionRejected(obj.message().to_string())),
            Err(e) => Err(SpamError::Rpc(format!("eth_sendRawTransaction: {e}"))),
        }
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        let raw: Option<RawReceipt> = self.call("eth_getTransactionReceipt", rpc_params![hash]).await?;
        Ok(raw.and_then(|r| {
            // receipts of pending transactions carry no block number on some clients
            let block_number = r.block_number?.to::<u64>();
            Some(TxReceipt {
                transaction_hash: r.transaction_hash,
                block_number,
                success: r.status.map(|s| s == U64::from(1)).unwrap_or(true),
            })
        }))
    }
}
