//! Transaction model, signing and the baseline builder.

pub mod builder;
pub mod sign;
pub mod transaction;

pub use builder::{TxBuilder, INTRINSIC_GAS};
pub use sign::{recover_sender, recover_signer, sign_hash, sign_tx};
pub use transaction::{EncodeError, SignedTransaction, Transaction};
