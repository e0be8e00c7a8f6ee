//! txfuzz: fault-injection and liveness harness for Ethereum execution nodes.
//!
//! - `spammer`: round orchestration, nonce-gap recovery, invalid-transaction generators
//! - `tx`: transaction model, signing, baseline builder
//! - `rpc`: chain client trait and its JSON-RPC implementation
//! - `account`: faucet and fuzz keys, nonce observations
//! - `config`: run configuration and keys file
//! - `testing`: in-memory node, test builds only

pub mod account;
pub mod cmd;
pub mod config;
pub mod rpc;
pub mod spammer;
#[cfg(test)]
pub mod testing;
pub mod tx;
pub mod utils;
