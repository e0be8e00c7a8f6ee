//! In-memory node for exercising the harness without a network.
//!
//! `MockChain` keeps per-account balances, a confirmed nonce, a pool of
//! submitted transactions and a set of *stuck* nonces: pool slots that count
//! toward the pending nonce but are never mined, the way a dropped or
//! underpriced transaction blocks a real account. A transaction submitted at
//! a stuck nonce replaces it.
//!
//! Admission follows the usual execution-client order: chain id, signature,
//! nonce, intrinsic gas, gas price, balance. Mining includes every
//! contiguous run of pooled transactions and happens on each receipt query
//! unless disabled with [`MockChain::set_mining`].

use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::rpc::{BlockRef, CallRequest, ChainClient, TxReceipt};
use crate::tx::{recover_sender, SignedTransaction, INTRINSIC_GAS};
use crate::utils::{Result, SpamError};

pub const MOCK_CHAIN_ID: u64 = 1337;
pub const MOCK_GAS_PRICE: u128 = 1_000_000_000;

#[derive(Debug, Default, Clone)]
struct AccountState {
    balance: U256,
    confirmed: u64,
    stuck: BTreeSet<u64>,
    pool: BTreeMap<u64, Pooled>,
}

impl AccountState {
    fn pending(&self) -> u64 {
        let mut next = self.confirmed;
        while self.stuck.contains(&next) || self.pool.contains_key(&next) {
            next += 1;
        }
        next
    }
}

#[derive(Debug, Clone)]
struct Pooled {
    hash: B256,
    to: Address,
    value: U256,
    gas_price: u128,
}

#[derive(Debug, Default)]
struct ChainState {
    accounts: HashMap<Address, AccountState>,
    receipts: HashMap<B256, TxReceipt>,
    block_number: u64,
    accepted: Vec<SignedTransaction>,
    rejected: Vec<(SignedTransaction, String)>,
    observed: Vec<Address>,
}

pub struct MockChain {
    state: Mutex<ChainState>,
    chain_id: u64,
    gas_price: u128,
    mining: Mutex<bool>,
    permissive: Mutex<bool>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::default()),
            chain_id: MOCK_CHAIN_ID,
            gas_price: MOCK_GAS_PRICE,
            mining: Mutex::new(true),
            permissive: Mutex::new(false),
        }
    }

    pub fn set_balance(&self, account: Address, balance: U256) {
        self.state.lock().accounts.entry(account).or_default().balance = balance;
    }

    pub fn set_confirmed_nonce(&self, account: Address, nonce: u64) {
        self.state.lock().accounts.entry(account).or_default().confirmed = nonce;
    }

    /// Mark the next `gap` nonces of `account` as broadcast but never includable.
    pub fn stick(&self, account: Address, gap: u64) {
        let mut st = self.state.lock();
        let acc = st.accounts.entry(account).or_default();
        let start = acc.pending();
        acc.stuck.extend(start..start + gap);
    }

    /// Toggle inclusion; when off, every receipt query returns `None`.
    pub fn set_mining(&self, on: bool) {
        *self.mining.lock() = on;
    }

    /// Skip admission checks, modelling a node that accepts what it should reject.
    pub fn set_permissive(&self, on: bool) {
        *self.permissive.lock() = on;
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.state.lock().accounts.get(&account).map(|a| a.balance).unwrap_or_default()
    }

    pub fn confirmed_nonce(&self, account: Address) -> u64 {
        self.state.lock().accounts.get(&account).map(|a| a.confirmed).unwrap_or_default()
    }

    pub fn gap(&self, account: Address) -> u64 {
        let st = self.state.lock();
        st.accounts.get(&account).map(|a| a.pending() - a.confirmed).unwrap_or_default()
    }

    /// Every transaction admitted to the pool, in submission order.
    pub fn accepted(&self) -> Vec<SignedTransaction> {
        self.state.lock().accepted.clone()
    }

    /// Admitted transactions whose recovered sender is `account`.
    pub fn accepted_from(&self, account: Address) -> Vec<SignedTransaction> {
        self.accepted()
            .into_iter()
            .filter(|tx| recover_sender(tx).ok() == Some(account))
            .collect()
    }

    /// Every refused transaction with the node's reason.
    pub fn rejected(&self) -> Vec<(SignedTransaction, String)> {
        self.state.lock().rejected.clone()
    }

    /// Accounts in the order their pending nonce was queried.
    pub fn observed(&self) -> Vec<Address> {
        self.state.lock().observed.clone()
    }

    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }

    /// Include every includable pooled transaction in one block.
    pub fn mine(&self) {
        let mut st = self.state.lock();
        let mut included = Vec::new();
        for (sender, acc) in st.accounts.iter_mut() {
            while let Some(tx) = acc.pool.remove(&acc.confirmed) {
                let fee = U256::from(INTRINSIC_GAS) * U256::from(tx.gas_price);
                acc.balance = acc.balance.saturating_sub(tx.value.saturating_add(fee));
                acc.confirmed += 1;
                included.push((*sender, tx));
            }
        }
        if included.is_empty() {
            return;
        }
        st.block_number += 1;
        let block_number = st.block_number;
        for (_, tx) in included {
            let to = st.accounts.entry(tx.to).or_default();
            to.balance = to.balance.saturating_add(tx.value);
            st.receipts.insert(
                tx.hash,
                TxReceipt { transaction_hash: tx.hash, block_number, success: true },
            );
        }
    }

    fn reject(&self, tx: &SignedTransaction, reason: &str) -> SpamError {
        self.state.lock().rejected.push((tx.clone(), reason.to_string()));
        SpamError::SubmissionRejected(reason.to_string())
    }

    fn admit(&self, tx: &SignedTransaction, raw: &[u8]) -> Result<B256> {
        let permissive = *self.permissive.lock();
        let hash = keccak256(raw);
        let value = tx.tx.wire_value()?;

        if !permissive && tx.tx.chain_id != self.chain_id {
            return Err(self.reject(tx, "invalid chain id for signer"));
        }
        let sender = match recover_sender(tx) {
            Ok(sender) => sender,
            Err(_) if permissive => Address::ZERO,
            Err(_) => return Err(self.reject(tx, "invalid sender: signature recovery failed")),
        };

        let mut st = self.state.lock();
        let acc = st.accounts.entry(sender).or_default();
        if !permissive {
            let reason = if tx.tx.nonce < acc.confirmed {
                Some("nonce too low")
            } else if tx.tx.nonce == u64::MAX {
                Some("nonce has max value")
            } else if tx.tx.gas_limit < INTRINSIC_GAS {
                Some("intrinsic gas too low")
            } else if tx.tx.gas_price < self.gas_price {
                Some("transaction underpriced")
            } else if acc.balance < tx.tx.max_cost()? {
                Some("insufficient funds for gas * price + value")
            } else {
                None
            };
            if let Some(reason) = reason {
                drop(st);
                return Err(self.reject(tx, reason));
            }
        }
        acc.stuck.remove(&tx.tx.nonce);
        acc.pool.insert(
            tx.tx.nonce,
            Pooled { hash, to: tx.tx.to, value, gas_price: tx.tx.gas_price },
        );
        st.accepted.push(tx.clone());
        Ok(hash)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn nonce_at(&self, account: Address, _block: BlockRef) -> Result<u64> {
        Ok(self.confirmed_nonce(account))
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64> {
        let mut st = self.state.lock();
        st.observed.push(account);
        Ok(st.accounts.get(&account).map(AccountState::pending).unwrap_or_default())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn suggest_gas_price(&self) -> Result<u128> {
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64> {
        // nodes simulate the call, so an unaffordable value fails here already
        if self.balance(call.from) < call.value {
            return Err(SpamError::Rpc("eth_estimateGas: insufficient funds for transfer".into()));
        }
        Ok(INTRINSIC_GAS)
    }

    async fn balance_at(&self, account: Address, _block: BlockRef) -> Result<U256> {
        Ok(self.balance(account))
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<B256> {
        // encode exactly as the HTTP client would before anything reaches the node
        let raw = tx.encode_2718()?;
        self.admit(tx, &raw)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        if !*self.mining.lock() {
            return Ok(None);
        }
        self.mine();
        Ok(self.state.lock().receipts.get(&hash).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, Role};
    use crate::tx::{sign_tx, Transaction};

    fn funded(chain: &MockChain) -> Account {
        let acc = Account::generate(Role::Fuzz);
        chain.set_balance(acc.address(), U256::from(10u128.pow(20)));
        acc
    }

    fn transfer(nonce: u64) -> Transaction {
        Transaction::transfer(MOCK_CHAIN_ID, nonce, Address::repeat_byte(9), U256::from(1), INTRINSIC_GAS, MOCK_GAS_PRICE)
    }

    #[tokio::test]
    async fn stuck_nonces_count_toward_pending() {
        let chain = MockChain::new();
        let acc = funded(&chain);
        chain.set_confirmed_nonce(acc.address(), 4);
        chain.stick(acc.address(), 3);
        assert_eq!(chain.pending_nonce(acc.address()).await.unwrap(), 7);
        assert_eq!(chain.nonce_at(acc.address(), BlockRef::Latest).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn replacing_stuck_nonces_unblocks_mining() {
        let chain = MockChain::new();
        let acc = funded(&chain);
        chain.stick(acc.address(), 2);
        let first = chain.send_transaction(&sign_tx(transfer(0), &acc).unwrap()).await.unwrap();
        // nonce 1 still stuck, nonce 0 can be mined on its own
        assert!(chain.transaction_receipt(first).await.unwrap().is_some());
        assert_eq!(chain.gap(acc.address()), 1);
        let second = chain.send_transaction(&sign_tx(transfer(1), &acc).unwrap()).await.unwrap();
        assert!(chain.transaction_receipt(second).await.unwrap().is_some());
        assert_eq!(chain.gap(acc.address()), 0);
        assert_eq!(chain.confirmed_nonce(acc.address()), 2);
    }

    #[tokio::test]
    async fn admission_rejects_with_reason() {
        let chain = MockChain::new();
        let acc = funded(&chain);
        let mut tx = transfer(0);
        tx.gas_limit = INTRINSIC_GAS - 1;
        let err = chain.send_transaction(&sign_tx(tx, &acc).unwrap()).await.unwrap_err();
        assert!(matches!(err, SpamError::SubmissionRejected(ref r) if r == "intrinsic gas too low"));
        assert_eq!(chain.rejected().len(), 1);
        assert!(chain.accepted().is_empty());
    }

    #[tokio::test]
    async fn permissive_chain_admits_invalid_transactions() {
        let chain = MockChain::new();
        chain.set_permissive(true);
        let acc = Account::generate(Role::Fuzz);
        let mut tx = transfer(0);
        tx.gas_price = 0;
        chain.send_transaction(&sign_tx(tx, &acc).unwrap()).await.unwrap();
        assert_eq!(chain.accepted().len(), 1);
    }

    #[tokio::test]
    async fn estimate_fails_when_value_exceeds_balance() {
        let chain = MockChain::new();
        let acc = Account::generate(Role::Fuzz);
        let call = CallRequest {
            from: acc.address(),
            to: Address::repeat_byte(9),
            value: U256::from(10),
            gas_price: None,
            input: None,
        };
        let err = chain.estimate_gas(&call).await.unwrap_err();
        assert!(matches!(err, SpamError::Rpc(ref m) if m.contains("insufficient funds")));
        chain.set_balance(acc.address(), U256::from(10));
        assert_eq!(chain.estimate_gas(&call).await.unwrap(), INTRINSIC_GAS);
    }

    #[tokio::test]
    async fn nothing_is_mined_while_mining_is_off() {
        let chain = MockChain::new();
        let acc = funded(&chain);
        chain.set_mining(false);
        let hash = chain.send_transaction(&sign_tx(transfer(0), &acc).unwrap()).await.unwrap();
        assert!(chain.transaction_receipt(hash).await.unwrap().is_none());
        chain.set_mining(true);
        let receipt = chain.transaction_receipt(hash).await.unwrap().unwrap();
        assert_eq!(receipt.block_number, 1);
    }
}
