//! Turns raw revert payloads into named, decoded failures

use super::registry::{canonical_signature, FailureRegistry, Selector};
use crate::error::ChainError;

use ethers::abi::ethabi::AbiError;
use ethers::abi::Token;
use ethers::providers::MiddlewareError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Errors that may carry hex-encoded revert data
pub trait EmbeddedFailureData {
    /// Revert data as returned on the wire (`0x`-prefixed hex), if any
    fn failure_data(&self) -> Option<&str>;
}

impl EmbeddedFailureData for ChainError {
    fn failure_data(&self) -> Option<&str> {
        match self {
            ChainError::Rpc { data, .. } => data.as_deref(),
            _ => None,
        }
    }
}

/// A revert matched against an enrolled failure schema
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRevert {
    pub name: String,
    pub signature: String,
    pub args: Vec<Token>,
}

impl fmt::Display for DecodedRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_token(f, arg)?;
        }
        write!(f, ")")
    }
}

fn write_token(f: &mut fmt::Formatter<'_>, token: &Token) -> fmt::Result {
    match token {
        Token::Uint(v) => write!(f, "{}", v),
        Token::Int(v) => write!(f, "{}", ethers::types::I256::from_raw(*v)),
        Token::Address(a) => write!(f, "{:?}", a),
        Token::Bool(b) => write!(f, "{}", b),
        Token::String(s) => write!(f, "{:?}", s),
        Token::Bytes(b) | Token::FixedBytes(b) => write!(f, "0x{}", hex::encode(b)),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            let open = if matches!(token, Token::Tuple(_)) { "(" } else { "[" };
            let close = if matches!(token, Token::Tuple(_)) { ")" } else { "]" };
            write!(f, "{}", open)?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_token(f, item)?;
            }
            write!(f, "{}", close)
        }
    }
}

/// Outcome of matching raw revert bytes against the registry
#[derive(Debug)]
pub enum RevertMatch {
    /// Too short or selector not enrolled
    Unknown,
    Decoded(DecodedRevert),
    /// Selector enrolled but arguments did not unpack
    Mismatch { schema: AbiError, reason: String },
}

/// Decodes chain errors against a shared [`FailureRegistry`]
#[derive(Debug, Clone)]
pub struct RevertDecoder {
    registry: Arc<FailureRegistry>,
}

impl RevertDecoder {
    pub fn new(registry: Arc<FailureRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<FailureRegistry> {
        &self.registry
    }

    /// Decorate an error with its decoded revert reason where possible.
    ///
    /// Errors without revert data, with malformed data, or with a selector
    /// that is not enrolled are returned unchanged. A matched selector whose
    /// arguments fail to unpack yields `ChainError::RevertUnpack` chaining the
    /// original error.
    pub fn decode(&self, err: ChainError) -> ChainError {
        let data = match err.failure_data().and_then(decode_hex) {
            Some(data) => data,
            None => return err,
        };

        match self.match_bytes(&data) {
            RevertMatch::Unknown => err,
            RevertMatch::Decoded(revert) => {
                debug!("Decoded revert: {}", revert);
                crate::metrics::record_revert_decoded(&revert.name);
                ChainError::Reverted(revert)
            }
            RevertMatch::Mismatch { schema, reason } => {
                warn!(
                    "Revert selector matched {} but arguments did not unpack: {}",
                    canonical_signature(&schema),
                    reason
                );
                ChainError::RevertUnpack {
                    name: schema.name,
                    reason,
                    source: Box::new(err),
                }
            }
        }
    }

    /// Apply [`RevertDecoder::decode`] to the error side of a result
    pub fn decode_result<T>(&self, result: Result<T, ChainError>) -> Result<T, ChainError> {
        result.map_err(|e| self.decode(e))
    }

    /// Convert an ethers middleware error and decode it in one step
    pub fn decode_middleware<E: MiddlewareError>(&self, err: E) -> ChainError {
        self.decode(ChainError::from_middleware(err))
    }

    /// Match raw revert bytes (selector followed by ABI-encoded arguments)
    pub fn match_bytes(&self, data: &[u8]) -> RevertMatch {
        if data.len() < 4 {
            return RevertMatch::Unknown;
        }
        let mut selector: Selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);

        let schema = match self.registry.lookup(&selector) {
            Some(schema) => schema,
            None => return RevertMatch::Unknown,
        };

        match schema.decode(&data[4..]) {
            Ok(args) => RevertMatch::Decoded(DecodedRevert {
                name: schema.name.clone(),
                signature: canonical_signature(&schema),
                args,
            }),
            Err(e) => RevertMatch::Mismatch {
                schema,
                reason: e.to_string(),
            },
        }
    }
}

/// Decode `0x`-prefixed hex; anything else is treated as undecodable
fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))?;
    hex::decode(digits).ok()
}
