//! Transaction model used by every generator.
//!
//! The value is a *signed* 256-bit integer: a negative transfer can be built
//! and signed locally even though the canonical encoder has no way to carry
//! it. Encoding is where that surfaces, as [`EncodeError::NegativeValue`].

use alloy_consensus::{SignableTransaction, TxEip2930, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{keccak256, Address, Bytes, PrimitiveSignature, TxKind, B256, I256, U256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("value {0} is negative and has no canonical encoding")]
    NegativeValue(I256),
}

/// Unsigned transfer/call. No access list encodes as an EIP-155 legacy
/// transaction, an access list as an EIP-2930 typed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub to: Address,
    pub value: I256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub input: Bytes,
    pub chain_id: u64,
    pub access_list: Option<AccessList>,
}

impl Transaction {
    /// Plain value transfer with an empty payload.
    pub fn transfer(chain_id: u64, nonce: u64, to: Address, value: U256, gas_limit: u64, gas_price: u128) -> Self {
        Self {
            nonce,
            to,
            value: I256::from_raw(value),
            gas_limit,
            gas_price,
            input: Bytes::new(),
            chain_id,
            access_list: None,
        }
    }

    /// Value as the unsigned quantity that goes on the wire.
    pub fn wire_value(&self) -> Result<U256, EncodeError> {
        if self.value.is_negative() {
            return Err(EncodeError::NegativeValue(self.value));
        }
        Ok(self.value.into_raw())
    }

    /// Upper bound the sender must hold: `value + gas_limit * gas_price`.
    pub fn max_cost(&self) -> Result<U256, EncodeError> {
        let fee = U256::from(self.gas_limit).saturating_mul(U256::from(self.gas_price));
        Ok(self.wire_value()?.saturating_add(fee))
    }

    /// Hash the sender signs over.
    pub fn signature_hash(&self) -> Result<B256, EncodeError> {
        Ok(match self.consensus()? {
            ConsensusTx::Legacy(tx) => tx.signature_hash(),
            ConsensusTx::Eip2930(tx) => tx.signature_hash(),
        })
    }

    pub fn into_signed(self, signature: PrimitiveSignature) -> SignedTransaction {
        SignedTransaction { tx: self, signature }
    }

    /// Names of the fields in which `self` and `other` differ.
    pub fn differing_fields(&self, other: &Transaction) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.nonce != other.nonce {
            fields.push("nonce");
        }
        if self.to != other.to {
            fields.push("to");
        }
        if self.value != other.value {
            fields.push("value");
        }
        if self.gas_limit != other.gas_limit {
            fields.push("gas_limit");
        }
        if self.gas_price != other.gas_price {
            fields.push("gas_price");
        }
        if self.input != other.input {
            fields.push("input");
        }
        if self.chain_id != other.chain_id {
            fields.push("chain_id");
        }
        if self.access_list != other.access_list {
            fields.push("access_list");
        }
        fields
    }

    fn consensus(&self) -> Result<ConsensusTx, EncodeError> {
        let value = self.wire_value()?;
        Ok(match &self.access_list {
            None => ConsensusTx::Legacy(TxLegacy {
                chain_id: Some(self.chain_id),
                nonce: self.nonce,
                gas_price: self.gas_price,
                gas_limit: self.gas_limit,
                to: TxKind::Call(self.to),
                value,
                input: self.input.clone(),
            }),
            Some(access_list) => ConsensusTx::Eip2930(TxEip2930 {
                chain_id: self.chain_id,
                nonce: self.nonce,
                gas_price: self.gas_price,
                gas_limit: self.gas_limit,
                to: TxKind::Call(self.to),
                value,
                access_list: access_list.clone(),
                input: self.input.clone(),
            }),
        })
    }
}

enum ConsensusTx {
    Legacy(TxLegacy),
    Eip2930(TxEip2930),
}

/// A transaction plus the signature attached to it. The signature need not
/// belong to the transaction; fault injection relies on that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: Transaction,
    pub signature: PrimitiveSignature,
}

impl SignedTransaction {
    /// Canonical EIP-2718 bytes as sent through `eth_sendRawTransaction`.
    pub fn encode_2718(&self) -> Result<Vec<u8>, EncodeError> {
        let envelope = match self.tx.consensus()? {
            ConsensusTx::Legacy(tx) => TxEnvelope::Legacy(tx.into_signed(self.signature)),
            ConsensusTx::Eip2930(tx) => TxEnvelope::Eip2930(tx.into_signed(self.signature)),
        };
        Ok(envelope.encoded_2718())
    }

    /// keccak256 of the encoded transaction.
    pub fn hash(&self) -> Result<B256, EncodeError> {
        Ok(keccak256(self.encode_2718()?))
    }

    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }
}
