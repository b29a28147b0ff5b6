//! Error types for transaction building, submission and confirmation

use crate::revert::DecodedRevert;

use ethers::types::{H256, U256};
use std::time::Duration;
use thiserror::Error;

/// Error reported by a chain backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    /// JSON-RPC error response; `data` carries hex-encoded revert data when present
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction {0:?} not found")]
    NotFound(H256),

    /// Revert whose payload matched an enrolled failure schema
    #[error("execution reverted: {0}")]
    Reverted(DecodedRevert),

    /// Revert whose selector matched but whose arguments could not be unpacked
    #[error("failed to unpack {name} arguments ({reason}): {source}")]
    RevertUnpack {
        name: String,
        reason: String,
        source: Box<ChainError>,
    },
}

impl ChainError {
    /// Decoded revert carried by this error, if any
    pub fn decoded_revert(&self) -> Option<&DecodedRevert> {
        match self {
            ChainError::Reverted(revert) => Some(revert),
            _ => None,
        }
    }
}

/// Main error type for the transaction lifecycle
#[derive(Error, Debug)]
pub enum TxError {
    #[error("failed to query suggested priority fee: {0}")]
    FeeSuggestionFailed(#[source] ChainError),

    #[error("max fee per gas ({max_fee}) < max priority fee per gas ({priority_fee})")]
    FeeCapTooLow { max_fee: U256, priority_fee: U256 },

    #[error("gas estimation failed: {0}")]
    GasEstimationFailed(#[source] ChainError),

    #[error("nonce resolution failed: {0}")]
    NonceResolutionFailed(#[source] ChainError),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("submission failed: {0}")]
    SubmissionFailed(#[source] ChainError),

    #[error("wait mined: transaction #{index} ({tx_hash:?}) not confirmed within {timeout:?}")]
    ConfirmationTimeout {
        index: usize,
        tx_hash: H256,
        timeout: Duration,
    },

    #[error("wait mined: transaction #{index} ({tx_hash:?}) failed: {source}")]
    ConfirmationFailed {
        index: usize,
        tx_hash: H256,
        #[source]
        source: ChainError,
    },

    #[error("not successes: {tx_hashes:?}")]
    PartialBatchFailure { tx_hashes: Vec<H256> },

    #[error("ignored tx count: {count}")]
    UnresolvedEntries { count: usize },
}

/// Where in the lifecycle a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Nothing reached the chain
    NotSubmitted,
    /// Broadcast, but no receipt observed yet
    Unconfirmed,
    /// Mined with a non-success execution status
    ExecutionFailed,
}

impl TxError {
    /// Check if re-invoking `wait_mined` may resolve the error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TxError::ConfirmationTimeout { .. } | TxError::ConfirmationFailed { .. }
        )
    }

    pub fn stage(&self) -> FailureStage {
        match self {
            TxError::ConfirmationTimeout { .. }
            | TxError::ConfirmationFailed { .. }
            | TxError::UnresolvedEntries { .. } => FailureStage::Unconfirmed,
            TxError::PartialBatchFailure { .. } => FailureStage::ExecutionFailed,
            _ => FailureStage::NotSubmitted,
        }
    }

    /// Chain error underneath, for variants that wrap one
    pub fn chain_error(&self) -> Option<&ChainError> {
        match self {
            TxError::FeeSuggestionFailed(e)
            | TxError::GasEstimationFailed(e)
            | TxError::NonceResolutionFailed(e)
            | TxError::SubmissionFailed(e)
            | TxError::ConfirmationFailed { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Errors raised by contract handles and event unpacking
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("could not find event {0}")]
    EventNotFound(String),

    #[error("could not find function {0}")]
    FunctionNotFound(String),

    #[error("abi error: {0}")]
    Abi(#[from] ethers::abi::Error),
}

/// Result type for lifecycle operations
pub type TxResult<T> = Result<T, TxError>;

/// Result type for chain backend calls
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        let fee = TxError::FeeCapTooLow {
            max_fee: U256::from(1),
            priority_fee: U256::from(2),
        };
        assert_eq!(fee.stage(), FailureStage::NotSubmitted);
        assert!(!fee.is_retryable());

        let timeout = TxError::ConfirmationTimeout {
            index: 1,
            tx_hash: H256::zero(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(timeout.stage(), FailureStage::Unconfirmed);
        assert!(timeout.is_retryable());

        let batch = TxError::PartialBatchFailure { tx_hashes: vec![H256::zero()] };
        assert_eq!(batch.stage(), FailureStage::ExecutionFailed);
    }

    #[test]
    fn test_chain_error_accessor() {
        let source = ChainError::Transport("connection reset".to_string());
        let err = TxError::SubmissionFailed(source.clone());
        assert_eq!(err.chain_error(), Some(&source));
        assert!(TxError::SigningFailed("boom".to_string()).chain_error().is_none());
    }
}
