use alloy_primitives::Address;
use tracing::info;

use crate::rpc::{BlockRef, ChainClient};
use crate::utils::Result;

/// Nonce snapshot of one account. Always fetched fresh, never cached across rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainObservation {
    /// Next nonce according to the latest included block.
    pub confirmed: u64,
    /// Next nonce including transactions sitting in the node's pool.
    pub pending: u64,
}

impl ChainObservation {
    /// Number of broadcast-but-not-included nonces.
    pub fn gap(&self) -> u64 {
        self.pending.saturating_sub(self.confirmed)
    }

    pub fn is_stuck(&self) -> bool {
        self.gap() > 0
    }

    /// Query both nonces for `account`.
    pub async fn fetch(client: &dyn ChainClient, account: Address) -> Result<Self> {
        let confirmed = client.nonce_at(account, BlockRef::Latest).await?;
        let pending = client.pending_nonce(account).await?;
        let obs = Self { confirmed, pending };
        if obs.is_stuck() {
            info!(
                %account,
                pending_nonce = pending,
                current_nonce = confirmed,
                missing = obs.gap(),
                "account is stuck"
            );
        }
        Ok(obs)
    }
}
