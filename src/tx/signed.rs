//! Signed, immutable dynamic-fee transactions

use super::fees::ResolvedFees;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Signature, H256};

/// A signed EIP-1559 transaction, identified by the hash of its signed encoding
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    tx: TypedTransaction,
    signature: Signature,
    hash: H256,
    from: Address,
    to: Option<Address>,
    data: Bytes,
    fees: ResolvedFees,
}

impl SignedTransaction {
    pub(crate) fn new(
        tx: TypedTransaction,
        signature: Signature,
        from: Address,
        to: Option<Address>,
        data: Bytes,
        fees: ResolvedFees,
    ) -> Self {
        let hash = tx.hash(&signature);
        Self {
            tx,
            signature,
            hash,
            from,
            to,
            data,
            fees,
        }
    }

    pub fn hash(&self) -> H256 {
        self.hash
    }

    pub fn from(&self) -> Address {
        self.from
    }

    /// Destination; `None` for contract creation
    pub fn to(&self) -> Option<Address> {
        self.to
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn fees(&self) -> &ResolvedFees {
        &self.fees
    }

    pub fn nonce(&self) -> ethers::types::U256 {
        self.fees.nonce
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Unsigned transaction as it was signed
    pub fn transaction(&self) -> &TypedTransaction {
        &self.tx
    }

    /// Signed RLP encoding, ready for `eth_sendRawTransaction`
    pub fn raw(&self) -> Bytes {
        self.tx.rlp_signed(&self.signature)
    }
}

impl PartialEq for SignedTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for SignedTransaction {}
