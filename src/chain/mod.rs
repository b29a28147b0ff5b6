//! Chain access
//!
//! [`ChainClient`] is the narrow capability the lifecycle needs from a node:
//! fee suggestion, gas estimation, nonce lookup, broadcast and receipt waiting.
//! [`ProviderChain`] implements it on top of ethers middleware.

pub mod provider;

pub use provider::ProviderChain;

use crate::error::{ChainError, ChainResult};
use crate::tx::SignedTransaction;

use async_trait::async_trait;
use ethers::providers::{MiddlewareError, ProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, H256, U256};

/// Chain access used by the builder, sender and pool
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Currently suggested max priority fee per gas
    async fn suggest_priority_fee(&self) -> ChainResult<U256>;

    /// Simulate `tx` and return the gas it would use
    async fn estimate_gas(&self, tx: &TypedTransaction) -> ChainResult<U256>;

    /// Next usable nonce for `account`, counting pending transactions
    async fn pending_nonce(&self, account: Address) -> ChainResult<U256>;

    /// Broadcast a signed transaction
    async fn send_transaction(&self, tx: &SignedTransaction) -> ChainResult<()>;

    /// Block until `tx_hash` is mined and return its receipt
    async fn wait_mined(&self, tx_hash: H256) -> ChainResult<TransactionReceipt>;
}

impl ChainError {
    /// Convert an ethers error, keeping JSON-RPC error data for revert decoding
    pub fn from_middleware<E: MiddlewareError>(err: E) -> Self {
        match err.as_error_response() {
            Some(response) => ChainError::Rpc {
                code: response.code,
                message: response.message.clone(),
                data: response
                    .data
                    .as_ref()
                    .and_then(|d| d.as_str())
                    .map(str::to_owned),
            },
            None => ChainError::Transport(err.to_string()),
        }
    }
}

impl From<ProviderError> for ChainError {
    fn from(err: ProviderError) -> Self {
        ChainError::from_middleware(err)
    }
}
