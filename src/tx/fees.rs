//! Fee parameters supplied by callers and their resolved form

use crate::error::{TxError, TxResult};

use ethers::types::U256;

/// Caller-supplied transaction parameters; `None` fields are resolved at build time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeParameters {
    pub value: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    /// Zero is treated the same as unset
    pub gas_limit: Option<U256>,
    /// Used verbatim when set, without checking chain state
    pub nonce: Option<U256>,
}

impl FeeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value<T: Into<U256>>(mut self, value: T) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn max_priority_fee_per_gas<T: Into<U256>>(mut self, fee: T) -> Self {
        self.max_priority_fee_per_gas = Some(fee.into());
        self
    }

    pub fn max_fee_per_gas<T: Into<U256>>(mut self, fee: T) -> Self {
        self.max_fee_per_gas = Some(fee.into());
        self
    }

    pub fn gas_limit<T: Into<U256>>(mut self, gas: T) -> Self {
        self.gas_limit = Some(gas.into());
        self
    }

    pub fn nonce<T: Into<U256>>(mut self, nonce: T) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// Fully resolved parameters of a signed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFees {
    pub value: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: U256,
    pub nonce: U256,
}

impl ResolvedFees {
    /// Upper bound on what the transaction can cost the sender
    pub fn max_cost(&self) -> U256 {
        self.gas_limit.saturating_mul(self.max_fee_per_gas).saturating_add(self.value)
    }
}

/// Default the max fee to the priority fee and reject a max fee below it
pub(crate) fn resolve_max_fee(max_fee: Option<U256>, priority_fee: U256) -> TxResult<U256> {
    let max_fee = max_fee.unwrap_or(priority_fee);
    if max_fee < priority_fee {
        return Err(TxError::FeeCapTooLow {
            max_fee,
            priority_fee,
        });
    }
    Ok(max_fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_fee_defaults_to_priority_fee() {
        assert_eq!(resolve_max_fee(None, U256::from(2)).unwrap(), U256::from(2));
    }

    #[test]
    fn test_max_fee_below_priority_fee_rejected() {
        let err = resolve_max_fee(Some(U256::from(1)), U256::from(2)).unwrap_err();
        assert!(matches!(err, TxError::FeeCapTooLow { .. }));
    }

    #[test]
    fn test_max_fee_equal_or_above_priority_fee_accepted() {
        assert_eq!(resolve_max_fee(Some(U256::from(2)), U256::from(2)).unwrap(), U256::from(2));
        assert_eq!(resolve_max_fee(Some(U256::from(9)), U256::from(2)).unwrap(), U256::from(9));
    }

    #[test]
    fn test_builder_setters() {
        let fee = FeeParameters::new().value(5u64).gas_limit(21_000u64).nonce(3u64);
        assert_eq!(fee.value, Some(U256::from(5)));
        assert_eq!(fee.gas_limit, Some(U256::from(21_000)));
        assert_eq!(fee.nonce, Some(U256::from(3)));
        assert!(fee.max_priority_fee_per_gas.is_none());
    }

    #[test]
    fn test_max_cost() {
        let fees = ResolvedFees {
            value: U256::from(10),
            max_priority_fee_per_gas: U256::from(1),
            max_fee_per_gas: U256::from(3),
            gas_limit: U256::from(21_000),
            nonce: U256::zero(),
        };
        assert_eq!(fees.max_cost(), U256::from(63_010));
    }
}
