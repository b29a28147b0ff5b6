//! Transaction lifecycle: fee resolution, signing, broadcast and batch confirmation

mod builder;
mod fees;
mod gas;
mod pool;
mod sender;
mod signed;

pub use builder::TransactionBuilder;
pub use fees::{FeeParameters, ResolvedFees};
pub use gas::GasEstimator;
pub use pool::{EntryState, PartialReceipts, PendingEntry, TransactionPool};
pub use sender::TransactionSender;
pub use signed::SignedTransaction;
