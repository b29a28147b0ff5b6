//! Transaction submission

use super::builder::TransactionBuilder;
use super::fees::FeeParameters;
use super::gas::GasEstimator;
use super::pool::TransactionPool;
use super::signed::SignedTransaction;
use crate::chain::ChainClient;
use crate::config::GasConfig;
use crate::error::{TxError, TxResult};
use crate::revert::RevertDecoder;

use ethers::signers::Signer;
use ethers::types::{Address, Bytes, H256};
use tracing::{info, warn};

/// Builds, signs and broadcasts transactions.
///
/// Failures from simulation and from broadcast both reach the caller with
/// their revert reason decoded when the registry knows it. A failed
/// submission never yields a transaction, so nothing unsent can reach a pool.
#[derive(Debug, Clone)]
pub struct TransactionSender {
    builder: TransactionBuilder,
}

impl TransactionSender {
    pub fn new(decoder: RevertDecoder) -> Self {
        Self {
            builder: TransactionBuilder::new(decoder),
        }
    }

    pub fn from_config(decoder: RevertDecoder, gas: &GasConfig) -> Self {
        Self {
            builder: TransactionBuilder::new(decoder)
                .with_gas_estimator(GasEstimator::from_config(gas)),
        }
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    /// Build a transaction and broadcast it
    pub async fn submit<C, S>(
        &self,
        chain: &C,
        fee: &FeeParameters,
        signer: &S,
        from: Address,
        to: Option<Address>,
        data: Bytes,
    ) -> TxResult<SignedTransaction>
    where
        C: ChainClient + ?Sized,
        S: Signer,
    {
        let tx = self.builder.build(chain, fee, signer, from, to, data).await?;

        if let Err(e) = chain.send_transaction(&tx).await {
            let e = self.builder.decoder().decode(e);
            warn!("Failed to send transaction {:?}: {}", tx.hash(), e);
            crate::metrics::record_tx_submission_failed();
            return Err(TxError::SubmissionFailed(e));
        }

        info!(
            "Transaction sent: {:?} (nonce {}, from {:?})",
            tx.hash(),
            tx.nonce(),
            from
        );
        crate::metrics::record_tx_submitted();
        Ok(tx)
    }

    /// Submit through the pool's chain and track the result in the pool
    pub async fn submit_into<C, S>(
        &self,
        pool: &mut TransactionPool<C>,
        fee: &FeeParameters,
        signer: &S,
        from: Address,
        to: Option<Address>,
        data: Bytes,
    ) -> TxResult<H256>
    where
        C: ChainClient + ?Sized,
        S: Signer,
    {
        let chain = pool.chain().clone();
        let result = self.submit(chain.as_ref(), fee, signer, from, to, data).await;
        pool.append_result(result)
    }
}
