use alloy_primitives::{keccak256, Address, PrimitiveSignature, B256, U256};
use k256::ecdsa::{signature::hazmat::PrehashSigner, RecoveryId, Signature, SigningKey, VerifyingKey};

use crate::account::Account;
use crate::tx::{SignedTransaction, Transaction};
use crate::utils::{Result, SpamError};

/// Sign a 32-byte prehash, returning `(r, s, y_parity)` in alloy form.
pub fn sign_hash(key: &SigningKey, hash: B256) -> Result<PrimitiveSignature> {
    let (sig, recovery_id): (Signature, RecoveryId) = key
        .sign_prehash(hash.as_ref())
        .map_err(|e| SpamError::Signing(e.to_string()))?;
    let r = U256::from_be_slice(sig.r().to_bytes().as_slice());
    let s = U256::from_be_slice(sig.s().to_bytes().as_slice());
    Ok(PrimitiveSignature::new(r, s, recovery_id.is_y_odd()))
}

/// Sign `tx` with the account's key.
pub fn sign_tx(tx: Transaction, account: &Account) -> Result<SignedTransaction> {
    let hash = tx.signature_hash()?;
    let signature = sign_hash(account.signing_key(), hash)?;
    Ok(tx.into_signed(signature))
}

/// Address that produced `signature` over `hash`, as a node would recover it.
pub fn recover_signer(hash: B256, signature: &PrimitiveSignature) -> Result<Address> {
    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    compact[32..].copy_from_slice(&signature.s().to_be_bytes::<32>());
    let sig = Signature::from_slice(&compact).map_err(|e| SpamError::Signing(e.to_string()))?;
    let recovery_id = RecoveryId::new(signature.v(), false);
    let key = VerifyingKey::recover_from_prehash(hash.as_slice(), &sig, recovery_id)
        .map_err(|e| SpamError::Signing(e.to_string()))?;
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    Ok(Address::from_slice(&digest.as_slice()[12..]))
}

/// Sender of a signed transaction.
pub fn recover_sender(signed: &SignedTransaction) -> Result<Address> {
    recover_signer(signed.tx.signature_hash()?, &signed.signature)
}
