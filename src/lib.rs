//! Transaction lifecycle for EVM chains
//!
//! Builds and signs dynamic-fee (EIP-1559) transactions, broadcasts them,
//! tracks batches of them until mined, and decodes custom-error reverts
//! against the ABIs of the contracts involved.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use ethers::signers::{LocalWallet, Signer};
//! use ethers::types::Bytes;
//! use tx_lifecycle::{
//!     config::Settings, FailureRegistry, FeeParameters, ProviderChain, RevertDecoder,
//!     TransactionPool, TransactionSender,
//! };
//!
//! let settings = Settings::load()?;
//! let chain = Arc::new(ProviderChain::connect(&settings.chain)?);
//! let registry = Arc::new(FailureRegistry::new());
//! let sender = TransactionSender::from_config(RevertDecoder::new(registry), &settings.gas);
//! let mut pool = TransactionPool::from_config(chain, &settings.pool);
//!
//! let wallet: LocalWallet = std::env::var("PRIVATE_KEY")?.parse()?;
//! let wallet = wallet.with_chain_id(settings.chain.chain_id);
//! let to = "0x000000000000000000000000000000000000dEaD".parse()?;
//! sender
//!     .submit_into(&mut pool, &FeeParameters::new(), &wallet, wallet.address(), Some(to), Bytes::new())
//!     .await?;
//! pool.all_receipts_successful(None).await?;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod contract;
pub mod error;
pub mod metrics;
pub mod revert;
pub mod tx;
pub mod units;

#[cfg(test)]
mod testing;

pub use chain::{ChainClient, ProviderChain};
pub use contract::Contract;
pub use error::{ChainError, ContractError, FailureStage, TxError, TxResult};
pub use revert::{DecodedRevert, EmbeddedFailureData, FailureRegistry, RevertDecoder};
pub use tx::{
    FeeParameters, PartialReceipts, SignedTransaction, TransactionBuilder, TransactionPool,
    TransactionSender,
};

use tracing_subscriber::util::TryInitError;

const DEFAULT_LOG_FILTER: &str = "info,tx_lifecycle=debug";

/// Install a human-readable tracing subscriber filtered by `RUST_LOG`
pub fn init_logging() -> Result<(), TryInitError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init()
}

/// Same as [`init_logging`] but emits one JSON object per line
pub fn init_json_logging() -> Result<(), TryInitError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .try_init()
}
