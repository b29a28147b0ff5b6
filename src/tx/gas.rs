//! Gas limit estimation

use crate::chain::ChainClient;
use crate::config::GasConfig;
use crate::error::{TxError, TxResult};
use crate::revert::RevertDecoder;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::U256;
use tracing::debug;

/// Gas estimator for transactions
#[derive(Debug, Clone, Default)]
pub struct GasEstimator {
    /// Buffer percentage for gas limit (e.g., 20 = 20% buffer)
    gas_limit_buffer_percent: u64,
}

impl GasEstimator {
    /// Create a gas estimator that uses estimates verbatim
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer_percent(gas_limit_buffer_percent: u64) -> Self {
        Self {
            gas_limit_buffer_percent,
        }
    }

    pub fn from_config(config: &GasConfig) -> Self {
        Self::with_buffer_percent(config.gas_limit_buffer_percent)
    }

    /// Simulate `tx` and derive a gas limit; simulation reverts come back decoded
    pub async fn estimate_gas_limit<C>(
        &self,
        chain: &C,
        decoder: &RevertDecoder,
        tx: &TypedTransaction,
    ) -> TxResult<U256>
    where
        C: ChainClient + ?Sized,
    {
        let estimate = decoder
            .decode_result(chain.estimate_gas(tx).await)
            .map_err(TxError::GasEstimationFailed)?;

        let gas_limit = self.apply_buffer(estimate);
        debug!("Estimated gas {} (limit {})", estimate, gas_limit);
        Ok(gas_limit)
    }

    fn apply_buffer(&self, estimate: U256) -> U256 {
        let buffer = estimate.saturating_mul(U256::from(self.gas_limit_buffer_percent)) / 100;
        estimate.saturating_add(buffer)
    }
}
