//! Ether denomination helpers

use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};
use tracing::debug;

/// Parse a decimal ether amount ("1.5") into wei; unparsable input yields zero
pub fn to_wei(ether: &str) -> U256 {
    match parse_ether(ether.trim()) {
        Ok(wei) => wei,
        Err(e) => {
            debug!("Treating {:?} as zero wei: {}", ether, e);
            U256::zero()
        }
    }
}

/// Format a wei amount as a decimal ether string
pub fn to_ether(wei: U256) -> String {
    format_ether(wei)
}
