use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::RngCore;
use std::fmt;

use crate::utils::{Result, SpamError};

const MAX_SIGNING_KEY_ATTEMPTS: usize = 16;

/// What an account is used for during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Funding source for every fuzz account.
    Faucet,
    /// Sender of spam and fault-injection transactions.
    Fuzz,
}

/// A controlled account: key material plus its derived address.
#[derive(Clone)]
pub struct Account {
    key: SigningKey,
    address: Address,
    role: Role,
}

impl Account {
    pub fn new(key: SigningKey, role: Role) -> Self {
        let address = address_of(&key);
        Self { key, address, role }
    }

    /// Parse a hex secret (with or without `0x`).
    pub fn from_hex(secret: &str, role: Role) -> Result<Self> {
        Ok(Self::new(parse_signing_key(secret)?, role))
    }

    /// Fresh random key, never seen by the chain.
    pub fn generate(role: Role) -> Self {
        Self::generate_with(&mut rand::thread_rng(), role)
    }

    pub fn generate_with<R: RngCore>(rng: &mut R, role: Role) -> Self {
        for _ in 0..MAX_SIGNING_KEY_ATTEMPTS {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Ok(key) = SigningKey::from_bytes((&bytes).into()) {
                return Self::new(key, role);
            }
        }
        // 16 consecutive out-of-range scalars has probability ~2^-2000
        panic!("failed to generate signing key");
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// Hex encoded secret, `0x` prefixed.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.to_bytes()))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Ethereum address: last 20 bytes of keccak256 over the uncompressed public key.
pub fn address_of(key: &SigningKey) -> Address {
    let verifying_key = VerifyingKey::from(key);
    let public_key = verifying_key.to_encoded_point(false);
    let hash = keccak256(&public_key.as_bytes()[1..]);
    Address::from_slice(&hash.as_slice()[12..])
}

pub fn parse_signing_key(input: &str) -> Result<SigningKey> {
    let trimmed = input.trim();
    let hex_str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let decoded =
        hex::decode(hex_str).map_err(|e| SpamError::Config(format!("invalid private key hex: {e}")))?;
    let bytes: [u8; 32] = decoded
        .try_into()
        .map_err(|_| SpamError::Config("private key must be 32 bytes".into()))?;
    SigningKey::from_bytes((&bytes).into())
        .map_err(|e| SpamError::Config(format!("invalid private key: {e}")))
}

/// Deterministic fuzz accounts derived from the faucet secret.
///
/// Key `i` is `keccak256(faucet_secret || i as big-endian u64)`; the same
/// faucet always yields the same accounts, so funds sent in one run are
/// reused by the next.
pub fn derive_fuzz_accounts(faucet: &Account, count: usize) -> Result<Vec<Account>> {
    let secret = faucet.key.to_bytes();
    let mut accounts = Vec::with_capacity(count);
    let mut index = 0u64;
    while accounts.len() < count {
        let mut preimage = Vec::with_capacity(40);
        preimage.extend_from_slice(secret.as_slice());
        preimage.extend_from_slice(&index.to_be_bytes());
        let digest: B256 = keccak256(&preimage);
        index += 1;
        // digest outside the curve order: skip this index
        if let Ok(key) = SigningKey::from_bytes((&digest.0).into()) {
            accounts.push(Account::new(key, Role::Fuzz));
        }
        if index > (count as u64).saturating_mul(2) + MAX_SIGNING_KEY_ATTEMPTS as u64 {
            return Err(SpamError::Config(format!("could not derive {count} fuzz accounts")));
        }
    }
    Ok(accounts)
}
