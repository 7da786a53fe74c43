//! Identifier computation.
//!
//! Both functions are pure: the digest is SHA-256 over canonical bytes, and
//! the identifier is the first eight bytes of SHA-256 over the fully signed
//! canonical bytes, read little-endian and rendered in decimal.

use crate::crypto::hash::{fold_to_u64, sha256};

/// The 32-byte value a signature is computed over.
pub fn digest(canonical_bytes: &[u8]) -> [u8; 32] {
    sha256(canonical_bytes)
}

/// Transaction identifier for the given signed canonical bytes.
pub fn transaction_id(signed_bytes: &[u8]) -> String {
    fold_to_u64(&sha256(signed_bytes)).to_string()
}
