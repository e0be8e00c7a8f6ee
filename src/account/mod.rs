//! Account ledger: controlled keys, their roles and live nonce observations.

pub mod keys;
pub mod observation;

pub use keys::{address_of, derive_fuzz_accounts, parse_signing_key, Account, Role};
pub use observation::ChainObservation;
