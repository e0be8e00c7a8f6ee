use alloy_primitives::{Address, B256};
use std::time::Duration;
use thiserror::Error;

use crate::tx::EncodeError;

/// Unified error type for the harness
#[derive(Error, Debug)]
pub enum SpamError {
    /// Nonce gap still open after the bounded attempt budget; needs manual remediation.
    #[error("could not unstuck account {address} after {attempts} attempts ({remaining} nonces still missing), please retry manually")]
    RecoveryTimeout {
        address: Address,
        attempts: usize,
        remaining: u64,
    },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("funding {address} failed: {reason}")]
    Funding { address: Address, reason: String },

    /// The node answered the submission with a validation error.
    #[error("transaction rejected by node: {0}")]
    SubmissionRejected(String),

    #[error("transaction {hash} not included within {timeout:?}")]
    InclusionTimeout { hash: B256, timeout: Duration },

    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("config error: {0}")]
    Config(String),
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, SpamError>;
