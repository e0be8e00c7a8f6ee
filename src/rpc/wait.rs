use alloy_primitives::B256;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, trace};

use crate::rpc::client::{ChainClient, TxReceipt};
use crate::utils::{Result, SpamError};

/// How often receipts are polled while waiting for inclusion.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Bound for ordinary sends.
pub const TX_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Bound for one recovery batch.
pub const UNSTUCK_TIMEOUT: Duration = Duration::from_secs(60);

/// Poll until `hash` is included or `limit` elapses. Receipt query errors
/// are treated as transient and polled through.
pub async fn wait_mined(client: &dyn ChainClient, hash: B256, limit: Duration) -> Result<TxReceipt> {
    let poll = async {
        loop {
            match client.transaction_receipt(hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => trace!(%hash, "transaction not yet mined"),
                Err(e) => debug!(%hash, error = %e, "receipt retrieval failed"),
            }
            sleep(POLL_INTERVAL).await;
        }
    };
    timeout(limit, poll)
        .await
        .map_err(|_| SpamError::InclusionTimeout { hash, timeout: limit })
}
