//! Custom error (revert) decoding
//!
//! Contract ABIs enroll their custom errors into a shared [`FailureRegistry`];
//! the [`RevertDecoder`] matches the selector of revert data carried by chain
//! errors against it and decodes the arguments.

mod decoder;
mod registry;

pub use decoder::{DecodedRevert, EmbeddedFailureData, RevertDecoder, RevertMatch};
pub use registry::{canonical_signature, selector_of, FailureRegistry, Selector};
