//! Selector-indexed store of custom error schemas

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ethers::abi::ethabi::AbiError;
use ethers::abi::Abi;
use tracing::debug;

/// Leading four bytes of a custom error's signature hash
pub type Selector = [u8; 4];

/// Compute the selector of a custom error schema
pub fn selector_of(schema: &AbiError) -> Selector {
    let hash = schema.signature();
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Canonical signature of a custom error, e.g. `Foo(uint256,address)`
pub fn canonical_signature(schema: &AbiError) -> String {
    let types: Vec<String> = schema.inputs.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", schema.name, types.join(","))
}

/// Shared registry of custom error schemas.
///
/// Append-only: the first schema enrolled under a selector is kept and later
/// enrollments under the same selector are ignored. Safe to enroll into and
/// look up from concurrently; share it as `Arc<FailureRegistry>`.
#[derive(Debug, Default)]
pub struct FailureRegistry {
    schemas: DashMap<Selector, AbiError>,
}

impl FailureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll every custom error of every ABI; returns how many were new
    pub fn enroll<'a, I>(&self, abis: I) -> usize
    where
        I: IntoIterator<Item = &'a Abi>,
    {
        abis.into_iter()
            .map(|abi| self.enroll_errors(abi.errors.values().flatten()))
            .sum()
    }

    /// Enroll individual error schemas; returns how many were new
    pub fn enroll_errors<'a, I>(&self, schemas: I) -> usize
    where
        I: IntoIterator<Item = &'a AbiError>,
    {
        let mut added = 0;
        for schema in schemas {
            match self.schemas.entry(selector_of(schema)) {
                Entry::Occupied(existing) => {
                    if existing.get() != schema {
                        debug!(
                            "Ignoring {} - selector 0x{} already taken by {}",
                            canonical_signature(schema),
                            hex::encode(existing.key()),
                            canonical_signature(existing.get())
                        );
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(schema.clone());
                    added += 1;
                }
            }
        }
        added
    }

    /// Schema registered under a selector
    pub fn lookup(&self, selector: &Selector) -> Option<AbiError> {
        self.schemas.get(selector).map(|s| s.value().clone())
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.schemas.contains_key(selector)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
