//! Dynamic-fee transaction construction
//!
//! Resolution order for fields the caller left unset:
//! 1. value defaults to zero
//! 2. priority fee from the chain's suggestion (one query)
//! 3. max fee defaults to the priority fee; a max fee below it is rejected
//! 4. gas limit from simulation (reverts decoded)
//! 5. nonce from the account's pending nonce
//!
//! The assembled transaction is then signed. Nothing is broadcast.

use super::fees::{resolve_max_fee, FeeParameters, ResolvedFees};
use super::gas::GasEstimator;
use super::signed::SignedTransaction;
use crate::chain::ChainClient;
use crate::error::{TxError, TxResult};
use crate::revert::RevertDecoder;

use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest};
use tracing::debug;

/// Builds and signs EIP-1559 transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    decoder: RevertDecoder,
    gas_estimator: GasEstimator,
}

impl TransactionBuilder {
    pub fn new(decoder: RevertDecoder) -> Self {
        Self {
            decoder,
            gas_estimator: GasEstimator::new(),
        }
    }

    pub fn with_gas_estimator(mut self, gas_estimator: GasEstimator) -> Self {
        self.gas_estimator = gas_estimator;
        self
    }

    pub fn decoder(&self) -> &RevertDecoder {
        &self.decoder
    }

    /// Resolve every unset parameter and sign the transaction with `signer`.
    ///
    /// `signer` must be bound to `from`. `to` is `None` for contract creation.
    pub async fn build<C, S>(
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
        if signer.address() != from {
            return Err(TxError::SigningFailed(format!(
                "signer {:?} cannot sign for {:?}",
                signer.address(),
                from
            )));
        }

        let value = fee.value.unwrap_or_default();

        let priority_fee = match fee.max_priority_fee_per_gas {
            Some(fee) => fee,
            None => self
                .decoder
                .decode_result(chain.suggest_priority_fee().await)
                .map_err(TxError::FeeSuggestionFailed)?,
        };

        let max_fee = resolve_max_fee(fee.max_fee_per_gas, priority_fee)?;

        let mut request = Eip1559TransactionRequest::new()
            .from(from)
            .value(value)
            .data(data.clone())
            .max_priority_fee_per_gas(priority_fee)
            .max_fee_per_gas(max_fee)
            .chain_id(signer.chain_id());
        if let Some(to) = to {
            request = request.to(to);
        }

        let gas_limit = match fee.gas_limit.filter(|gas| !gas.is_zero()) {
            Some(gas) => gas,
            None => {
                let simulation = TypedTransaction::Eip1559(request.clone());
                self.gas_estimator
                    .estimate_gas_limit(chain, &self.decoder, &simulation)
                    .await?
            }
        };

        let nonce = match fee.nonce {
            Some(nonce) => nonce,
            None => chain
                .pending_nonce(from)
                .await
                .map_err(|e| TxError::NonceResolutionFailed(self.decoder.decode(e)))?,
        };

        let tx = TypedTransaction::Eip1559(request.gas(gas_limit).nonce(nonce));
        let signature = signer
            .sign_transaction(&tx)
            .await
            .map_err(|e| TxError::SigningFailed(e.to_string()))?;

        let fees = ResolvedFees {
            value,
            max_priority_fee_per_gas: priority_fee,
            max_fee_per_gas: max_fee,
            gas_limit,
            nonce,
        };
        let signed = SignedTransaction::new(tx, signature, from, to, data, fees);

        debug!(
            "Built transaction {:?}: nonce={} gas={} max_fee={} priority_fee={}",
            signed.hash(),
            nonce,
            gas_limit,
            max_fee,
            priority_fee
        );
        crate::metrics::record_tx_built();

        Ok(signed)
    }
}
