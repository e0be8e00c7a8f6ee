//! Valid filler transactions.

use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tx::Transaction;
use crate::utils::Result;

/// Largest value a filler transfer carries, in wei.
pub const MAX_FILL_VALUE: u64 = 1_000_000_000;

const MAX_PAYLOAD_LEN: usize = 64;
const MAX_ACCESS_LIST_ITEMS: usize = 3;
const MAX_STORAGE_KEYS: usize = 2;

/// Everything a filler needs to produce one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRequest {
    pub sender: Address,
    pub nonce: u64,
    pub seed: u64,
    pub access_list: bool,
    pub chain_id: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
}

#[async_trait]
pub trait TxFiller: Send + Sync + 'static {
    async fn fill(&self, req: FillRequest) -> Result<Transaction>;
}

/// Seeded pseudo-random filler. The same request always yields the same
/// transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomFiller;

impl RandomFiller {
    pub fn new() -> Self {
        Self
    }

    fn rng_for(req: &FillRequest) -> StdRng {
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&req.sender.as_slice()[..8]);
        let mixed = req.seed ^ u64::from_be_bytes(prefix) ^ req.nonce.rotate_left(32);
        StdRng::seed_from_u64(mixed)
    }

    fn random_access_list(rng: &mut StdRng) -> AccessList {
        let items = rng.gen_range(1..=MAX_ACCESS_LIST_ITEMS);
        AccessList(
            (0..items)
                .map(|_| AccessListItem {
                    address: Address::from(rng.gen::<[u8; 20]>()),
                    storage_keys: (0..rng.gen_range(0..=MAX_STORAGE_KEYS))
                        .map(|_| B256::from(rng.gen::<[u8; 32]>()))
                        .collect(),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl TxFiller for RandomFiller {
    async fn fill(&self, req: FillRequest) -> Result<Transaction> {
        let mut rng = Self::rng_for(&req);
        let to = Address::from(rng.gen::<[u8; 20]>());
        let value = U256::from(rng.gen_range(0..=MAX_FILL_VALUE));
        let payload: Vec<u8> = (0..rng.gen_range(0..=MAX_PAYLOAD_LEN)).map(|_| rng.gen()).collect();

        let mut tx = Transaction::transfer(req.chain_id, req.nonce, to, value, req.gas_limit, req.gas_price);
        tx.input = Bytes::from(payload);
        if req.access_list {
            tx.access_list = Some(Self::random_access_list(&mut rng));
        }
        Ok(tx)
    }
}
