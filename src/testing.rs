//! Shared fixtures for unit tests

use crate::chain::ChainClient;
use crate::error::{ChainError, ChainResult};
use crate::tx::{ResolvedFees, SignedTransaction};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use ethers::abi::Abi;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Bytes, Eip1559TransactionRequest, TransactionReceipt, H256, U256, U64,
};

/// First dev account of a local anvil/hardhat node
const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn abi_from_json(json: &str) -> Abi {
    serde_json::from_str(json).unwrap()
}

pub fn wallet() -> LocalWallet {
    DEV_KEY.parse::<LocalWallet>().unwrap().with_chain_id(31337u64)
}

/// A signed transfer with the given nonce, built without touching a chain
pub async fn signed_tx(nonce: u64) -> SignedTransaction {
    let signer = wallet();
    let to = Address::repeat_byte(0x42);
    let fees = ResolvedFees {
        value: U256::zero(),
        max_priority_fee_per_gas: U256::from(1u64),
        max_fee_per_gas: U256::from(2u64),
        gas_limit: U256::from(21_000u64),
        nonce: U256::from(nonce),
    };
    let tx = TypedTransaction::Eip1559(
        Eip1559TransactionRequest::new()
            .from(signer.address())
            .to(to)
            .value(fees.value)
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            .max_fee_per_gas(fees.max_fee_per_gas)
            .gas(fees.gas_limit)
            .nonce(fees.nonce)
            .chain_id(signer.chain_id()),
    );
    let signature = signer.sign_transaction(&tx).await.unwrap();
    SignedTransaction::new(tx, signature, signer.address(), Some(to), Bytes::default(), fees)
}

pub fn receipt(tx_hash: H256, success: bool) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: tx_hash,
        status: Some(U64::from(if success { 1u64 } else { 0u64 })),
        ..Default::default()
    }
}

/// What [`ScriptedChain::wait_mined`] does for a transaction
#[derive(Debug, Clone)]
pub enum ReceiptScript {
    /// Mined with the given execution status
    Mined(bool),
    Fail(ChainError),
    /// Never returns
    Hang,
}

/// Chain whose receipts are scripted per transaction and can be changed between calls.
/// Unscripted transactions hang.
#[derive(Default)]
pub struct ScriptedChain {
    scripts: DashMap<H256, ReceiptScript>,
    waited: DashSet<H256>,
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, tx_hash: H256, script: ReceiptScript) {
        self.scripts.insert(tx_hash, script);
    }

    pub fn waited_on(&self, tx_hash: H256) -> bool {
        self.waited.contains(&tx_hash)
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn suggest_priority_fee(&self) -> ChainResult<U256> {
        Ok(U256::from(1u64))
    }

    async fn estimate_gas(&self, _tx: &TypedTransaction) -> ChainResult<U256> {
        Ok(U256::from(21_000u64))
    }

    async fn pending_nonce(&self, _account: Address) -> ChainResult<U256> {
        Ok(U256::zero())
    }

    async fn send_transaction(&self, _tx: &SignedTransaction) -> ChainResult<()> {
        Ok(())
    }

    async fn wait_mined(&self, tx_hash: H256) -> ChainResult<TransactionReceipt> {
        self.waited.insert(tx_hash);
        let script = self
            .scripts
            .get(&tx_hash)
            .map(|entry| entry.value().clone())
            .unwrap_or(ReceiptScript::Hang);

        match script {
            ReceiptScript::Mined(success) => Ok(receipt(tx_hash, success)),
            ReceiptScript::Fail(err) => Err(err),
            ReceiptScript::Hang => std::future::pending().await,
        }
    }
}
