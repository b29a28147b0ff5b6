//! Chain client backed by ethers middleware, with multi-RPC failover

use super::ChainClient;
use crate::config::ChainConfig;
use crate::error::{ChainError, ChainResult};
use crate::tx::SignedTransaction;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// [`ChainClient`] over one or more ethers middleware stacks.
///
/// Read-only calls rotate to the next endpoint on transport failures.
/// JSON-RPC error responses are returned as-is since another endpoint would
/// answer the same.
pub struct ProviderChain<M> {
    chain_id: u64,
    providers: Vec<M>,
    current: AtomicUsize,
    poll_interval: Duration,
}

impl ProviderChain<Provider<Http>> {
    /// Create HTTP providers for every configured RPC URL
    pub fn connect(config: &ChainConfig) -> ChainResult<Self> {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let mut providers = Vec::new();

        for url in &config.rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    providers.push(provider.interval(poll_interval));
                    debug!("Added HTTP provider for chain {}: {}", config.chain_id, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        Self::new(config.chain_id, providers, poll_interval)
    }
}

impl<M: Middleware> ProviderChain<M> {
    /// Wrap already-built middleware; at least one is required
    pub fn new(chain_id: u64, providers: Vec<M>, poll_interval: Duration) -> ChainResult<Self> {
        if providers.is_empty() {
            return Err(ChainError::Transport(format!(
                "no valid RPC providers for chain {}",
                chain_id
            )));
        }

        Ok(Self {
            chain_id,
            providers,
            current: AtomicUsize::new(0),
            poll_interval,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Active middleware
    pub fn inner(&self) -> &M {
        let idx = self.current.load(Ordering::Relaxed);
        &self.providers[idx % self.providers.len()]
    }

    /// Switch to the next endpoint
    fn failover(&self) {
        if self.providers.len() < 2 {
            return;
        }
        let next = (self.current.load(Ordering::Relaxed) + 1) % self.providers.len();
        self.current.store(next, Ordering::Relaxed);
        warn!("Chain {} failover to provider {}", self.chain_id, next);
    }
}

#[async_trait]
impl<M: Middleware> ChainClient for ProviderChain<M> {
    async fn suggest_priority_fee(&self) -> ChainResult<U256> {
        let mut last_error = None;
        for _ in 0..self.providers.len() {
            let result: Result<U256, ProviderError> = self
                .inner()
                .provider()
                .request("eth_maxPriorityFeePerGas", ())
                .await;
            match result.map_err(ChainError::from) {
                Ok(fee) => return Ok(fee),
                Err(e @ ChainError::Transport(_)) => {
                    warn!("Failed to get priority fee from chain {}: {}", self.chain_id, e);
                    last_error = Some(e);
                    self.failover();
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| ChainError::Transport("all providers failed".to_string())))
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> ChainResult<U256> {
        self.inner()
            .estimate_gas(tx, None)
            .await
            .map_err(ChainError::from_middleware)
    }

    async fn pending_nonce(&self, account: Address) -> ChainResult<U256> {
        let mut last_error = None;
        for _ in 0..self.providers.len() {
            let result = self
                .inner()
                .get_transaction_count(account, Some(BlockNumber::Pending.into()))
                .await
                .map_err(ChainError::from_middleware);
            match result {
                Ok(nonce) => return Ok(nonce),
                Err(e @ ChainError::Transport(_)) => {
                    warn!("Failed to get nonce from chain {}: {}", self.chain_id, e);
                    last_error = Some(e);
                    self.failover();
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| ChainError::Transport("all providers failed".to_string())))
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> ChainResult<()> {
        self.inner()
            .send_raw_transaction(tx.raw())
            .await
            .map(|_| ())
            .map_err(ChainError::from_middleware)
    }

    async fn wait_mined(&self, tx_hash: H256) -> ChainResult<TransactionReceipt> {
        loop {
            match self.inner().get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => debug!("Transaction {:?} not yet mined", tx_hash),
                Err(e) => match ChainError::from_middleware(e) {
                    e @ ChainError::Transport(_) => {
                        debug!("Receipt retrieval for {:?} failed: {}", tx_hash, e);
                        self.failover();
                    }
                    e => debug!("Receipt retrieval for {:?} rejected: {}", tx_hash, e),
                },
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
