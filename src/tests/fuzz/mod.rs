//! Fuzz tests for key parsing, fault overrides and filler requests.

use alloy_primitives::{Address, I256, U256};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::account::parse_signing_key;
use crate::spammer::invalid::apply_fault;
use crate::spammer::{FaultKind, FillRequest, RandomFiller, TxFiller};
use crate::tx::{Transaction, INTRINSIC_GAS};

fn random_transfer(rng: &mut StdRng) -> Transaction {
    Transaction::transfer(
        rng.gen_range(1..u64::MAX),
        rng.gen_range(0..1_000_000),
        Address::from(rng.gen::<[u8; 20]>()),
        U256::from(rng.gen_range(1..u64::MAX)),
        rng.gen_range(INTRINSIC_GAS..30_000_000),
        rng.gen_range(1..u128::from(u64::MAX)),
    )
}

#[test]
fn fuzz_key_parsing() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..1000 {
        let len = rng.gen_range(0..80);
        let bogus: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        // never panics, whatever the input
        let _ = parse_signing_key(&hex::encode(&bogus));
        let _ = parse_signing_key(&String::from_utf8_lossy(&bogus));
    }
}

#[test]
fn fuzz_each_fault_touches_one_field() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..500 {
        let baseline = random_transfer(&mut rng);
        for kind in FaultKind::ALL {
            let faulty = apply_fault(kind, baseline.clone());
            let changed = baseline.differing_fields(&faulty);
            let expected: &[&str] = match kind {
                FaultKind::InvalidGas => &["gas_limit"],
                FaultKind::InvalidNonce => &["nonce"],
                FaultKind::InvalidNegativeValue => &["value"],
                FaultKind::InvalidGasPriceZero => &["gas_price"],
                FaultKind::InvalidChainId => &["chain_id"],
                // sender and signature live outside the transaction body
                FaultKind::InvalidSignature | FaultKind::LackOfFunds => &[],
            };
            assert_eq!(changed, expected, "{kind}");
        }
    }
}

#[test]
fn fuzz_negative_values_never_encode() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..500 {
        let faulty = apply_fault(FaultKind::InvalidNegativeValue, random_transfer(&mut rng));
        assert!(faulty.value < I256::ZERO);
        assert!(faulty.signature_hash().is_err());
    }
}

#[tokio::test]
async fn fuzz_filler_requests() {
    let mut rng = StdRng::seed_from_u64(4);
    let filler = RandomFiller::new();
    for _ in 0..300 {
        let req = FillRequest {
            sender: Address::from(rng.gen::<[u8; 20]>()),
            nonce: rng.gen(),
            seed: rng.gen(),
            access_list: rng.gen(),
            chain_id: rng.gen_range(1..u64::MAX),
            gas_price: rng.gen_range(1..u128::from(u64::MAX)),
            gas_limit: rng.gen_range(INTRINSIC_GAS..30_000_000),
        };
        let tx = filler.fill(req).await.unwrap();
        assert_eq!(tx.nonce, req.nonce);
        assert_eq!(tx.access_list.is_some(), req.access_list);
        assert!(tx.signature_hash().is_ok());
    }
}
