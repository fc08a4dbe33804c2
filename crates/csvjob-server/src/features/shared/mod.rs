//! Code shared between feature slices
//!
//! - **id_codec**: reversible obfuscation of numeric ids
//! - **error_helpers**: database error classification
//! - **test_helpers**: fixtures for database tests (test-only)

pub mod error_helpers;
pub mod id_codec;

#[cfg(test)]
pub mod test_helpers;

pub use id_codec::{IdCodec, IdCodecError};
