//! RPC module
//!
//! - `ChainClient`: the node capabilities the harness consumes
//! - `JsonRpcClient`: HTTP JSON-RPC implementation
//! - `wait_mined`: bounded wait-for-inclusion polling

pub mod client;
pub mod http;
pub mod wait;

pub use client::{BlockRef, CallRequest, ChainClient, TxReceipt};
pub use http::JsonRpcClient;
pub use wait::{wait_mined, TX_TIMEOUT, UNSTUCK_TIMEOUT};
