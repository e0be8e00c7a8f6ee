//! Spam rounds, nonce-gap recovery and fault injection.

pub mod airdrop;
pub mod basic;
pub mod filler;
pub mod invalid;
pub mod round;
pub mod stats;
pub mod unstuck;

pub use airdrop::{Airdropper, FundingCalculator};
pub use basic::BasicSender;
pub use filler::{FillRequest, RandomFiller, TxFiller};
pub use invalid::{FaultKind, FaultOutcome, FaultReport, InvalidTxGenerator};
pub use round::{Mode, RoundSummary, Spammer};
pub use stats::{Counters, RoundStats};
pub use unstuck::{RecoveryOutcome, Unstucker};
