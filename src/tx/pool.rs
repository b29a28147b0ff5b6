//! Ordered batch of submitted transactions awaiting confirmation

use super::signed::SignedTransaction;
use crate::chain::ChainClient;
use crate::config::PoolConfig;
use crate::error::{TxError, TxResult};
use crate::revert::RevertDecoder;

use ethers::types::{TransactionReceipt, H256, U64};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Confirmation state of a pool entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Queued,
    Confirmed,
    /// Confirmation failed or timed out; kept for a later retry
    Unresolved,
}

/// A submitted transaction held by a [`TransactionPool`]
#[derive(Debug, Clone)]
pub struct PendingEntry {
    tx: SignedTransaction,
    state: EntryState,
    failed_attempts: u32,
}

impl PendingEntry {
    fn new(tx: SignedTransaction) -> Self {
        Self {
            tx,
            state: EntryState::Queued,
            failed_attempts: 0,
        }
    }

    pub fn hash(&self) -> H256 {
        self.tx.hash()
    }

    pub fn transaction(&self) -> &SignedTransaction {
        &self.tx
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// How many confirmation attempts for this entry have failed
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }
}

/// Failure of [`TransactionPool::wait_mined`], with the receipts confirmed before it
#[derive(Debug, Error)]
#[error("{error} ({} earlier transactions confirmed)", .receipts.len())]
pub struct PartialReceipts {
    pub receipts: Vec<TransactionReceipt>,
    #[source]
    pub error: TxError,
}

/// FIFO batch of submitted, not yet confirmed transactions.
///
/// Confirmation is resolved one entry at a time in submission order. When an
/// entry fails to confirm, it and everything after it stay in the pool for a
/// later `wait_mined`; everything before it is dropped. A pool is meant to be
/// owned by one logical batch and is not shared between callers.
pub struct TransactionPool<C: ?Sized> {
    chain: Arc<C>,
    entries: Vec<PendingEntry>,
    timeout: Duration,
    decoder: Option<RevertDecoder>,
}

impl<C: ChainClient + ?Sized> TransactionPool<C> {
    /// Default per-transaction confirmation timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(chain: Arc<C>) -> Self {
        Self {
            chain,
            entries: Vec::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            decoder: None,
        }
    }

    pub fn from_config(chain: Arc<C>, config: &PoolConfig) -> Self {
        Self::new(chain).with_timeout(config.confirmation_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Decode revert data in confirmation errors
    pub fn with_decoder(mut self, decoder: RevertDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    /// Track a submitted transaction
    pub fn append(&mut self, tx: SignedTransaction) -> H256 {
        let hash = tx.hash();
        debug!("Tracking transaction {:?} at position {}", hash, self.entries.len());
        self.entries.push(PendingEntry::new(tx));
        hash
    }

    /// Track the transaction of a successful submission; errors pass through untouched
    pub fn append_result(&mut self, result: TxResult<SignedTransaction>) -> TxResult<H256> {
        result.map(|tx| self.append(tx))
    }

    /// Wait for every entry to be mined, in submission order.
    ///
    /// Each entry gets its own deadline of `timeout` from when waiting on it
    /// starts, capped by `deadline` if given. On success the pool is emptied
    /// and all receipts are returned in order. When entry `k` fails, entries
    /// before it are dropped, `k..` stay queued, and the receipts of `..k` are
    /// returned alongside the error.
    pub async fn wait_mined(
        &mut self,
        deadline: Option<Instant>,
    ) -> Result<Vec<TransactionReceipt>, PartialReceipts> {
        let mut receipts = Vec::with_capacity(self.entries.len());

        for index in 0..self.entries.len() {
            let tx_hash = self.entries[index].hash();
            let started = Instant::now();
            let entry_deadline = sub_deadline(started, self.timeout, deadline);

            let outcome = tokio::time::timeout_at(entry_deadline, self.chain.wait_mined(tx_hash)).await;
            let error = match outcome {
                Ok(Ok(receipt)) => {
                    crate::metrics::record_tx_confirmed(started.elapsed());
                    debug!("Transaction {:?} mined", tx_hash);
                    self.entries[index].state = EntryState::Confirmed;
                    receipts.push(receipt);
                    continue;
                }
                Ok(Err(e)) => {
                    crate::metrics::record_tx_confirmation_failed("error");
                    let source = match &self.decoder {
                        Some(decoder) => decoder.decode(e),
                        None => e,
                    };
                    TxError::ConfirmationFailed {
                        index,
                        tx_hash,
                        source,
                    }
                }
                Err(_) => {
                    crate::metrics::record_tx_confirmation_failed("timeout");
                    TxError::ConfirmationTimeout {
                        index,
                        tx_hash,
                        timeout: entry_deadline.saturating_duration_since(started),
                    }
                }
            };

            warn!("{}; keeping {} transactions", error, self.entries.len() - index);
            self.entries.drain(..index);
            let failing = &mut self.entries[0];
            failing.state = EntryState::Unresolved;
            failing.failed_attempts += 1;

            return Err(PartialReceipts { receipts, error });
        }

        if !receipts.is_empty() {
            info!("All {} transactions mined", receipts.len());
        }
        self.entries.clear();
        Ok(receipts)
    }

    /// Wait for every entry and require each receipt to report success
    pub async fn all_receipts_successful(&mut self, deadline: Option<Instant>) -> TxResult<()> {
        let receipts = self.wait_mined(deadline).await.map_err(|partial| partial.error)?;

        let failed: Vec<H256> = receipts
            .iter()
            .filter(|receipt| receipt.status != Some(U64::from(1)))
            .map(|receipt| receipt.transaction_hash)
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(TxError::PartialBatchFailure { tx_hashes: failed })
        }
    }

    /// Assert that nothing is left in the pool; entries are not dropped
    pub fn clear(&self) -> TxResult<()> {
        if self.entries.is_empty() {
            Ok(())
        } else {
            Err(TxError::UnresolvedEntries {
                count: self.entries.len(),
            })
        }
    }
}

/// Stand-in for "no deadline" when `now + timeout` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn sub_deadline(now: Instant, timeout: Duration, deadline: Option<Instant>) -> Instant {
    match (now.checked_add(timeout), deadline) {
        (Some(local), Some(deadline)) => local.min(deadline),
        (Some(local), None) => local,
        (None, Some(deadline)) => deadline,
        (None, None) => now + FAR_FUTURE,
    }
}
