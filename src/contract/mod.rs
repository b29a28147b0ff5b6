//! Contract handles
//!
//! A [`Contract`] binds an address and an ABI to a typed function table,
//! usually abigen-generated bindings. Attaching an ABI enrolls its custom
//! errors so reverts from the contract decode by name.

pub mod events;

pub use events::{find_event_logs, unpack_events, unpack_events_into_map};

use crate::error::ContractError;
use crate::revert::FailureRegistry;

use ethers::abi::{Abi, Token};
use ethers::contract::EthLogDecode;
use ethers::types::{Address, Bytes, TransactionReceipt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Address, ABI and function table of one contract instance
pub struct Contract<T> {
    address: Address,
    abi: Option<Abi>,
    funcs: T,
    registry: Arc<FailureRegistry>,
}

impl<T> Contract<T> {
    /// Handle for a contract whose address and ABI are attached later
    pub fn new(funcs: T, registry: Arc<FailureRegistry>) -> Self {
        Self {
            address: Address::zero(),
            abi: None,
            funcs,
            registry,
        }
    }

    /// Handle for a contract that is already deployed at `address`
    pub fn at(address: Address, abi: Abi, funcs: T, registry: Arc<FailureRegistry>) -> Self {
        let mut contract = Self::new(funcs, registry);
        contract.set_address(address).set_abi(abi);
        contract
    }

    /// Set the address; ignored once a non-zero address is set
    pub fn set_address(&mut self, address: Address) -> &mut Self {
        if self.address.is_zero() {
            self.address = address;
        }
        self
    }

    /// Attach the ABI and enroll its errors; ignored once an ABI is attached
    pub fn set_abi(&mut self, abi: Abi) -> &mut Self {
        if self.abi.is_none() {
            let enrolled = self.registry.enroll([&abi]);
            debug!("Contract {:?}: enrolled {} custom errors", self.address, enrolled);
            self.abi = Some(abi);
        }
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> Option<&Abi> {
        self.abi.as_ref()
    }

    pub fn funcs(&self) -> &T {
        &self.funcs
    }

    pub fn funcs_mut(&mut self) -> &mut T {
        &mut self.funcs
    }

    pub fn registry(&self) -> &Arc<FailureRegistry> {
        &self.registry
    }

    /// ABI-encode a call to `name` for use as transaction data
    pub fn encode_call(&self, name: &str, args: &[Token]) -> Result<Bytes, ContractError> {
        let function = self
            .abi
            .as_ref()
            .and_then(|abi| abi.functions.get(name))
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ContractError::FunctionNotFound(name.to_string()))?;
        Ok(function.encode_input(args)?.into())
    }

    /// Decode this contract's `name` events out of `receipts`
    pub fn unpack_events<E: EthLogDecode>(
        &self,
        name: &str,
        receipts: &[TransactionReceipt],
    ) -> Result<Vec<E>, ContractError> {
        unpack_events(self.require_abi(name)?, name, receipts)
    }

    pub fn unpack_events_into_map(
        &self,
        name: &str,
        receipts: &[TransactionReceipt],
    ) -> Result<Vec<BTreeMap<String, Token>>, ContractError> {
        unpack_events_into_map(self.require_abi(name)?, name, receipts)
    }

    fn require_abi(&self, event: &str) -> Result<&Abi, ContractError> {
        self.abi
            .as_ref()
            .ok_or_else(|| ContractError::EventNotFound(event.to_string()))
    }
}
