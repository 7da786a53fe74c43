//! # Hashing Utilities
//!
//! SHA-256 is the only hash the network uses: key derivation from
//! passphrases, transaction digests, transaction identifiers and addresses
//! all run through it. The helpers below are thin wrappers over `sha2` so
//! call sites read as what they compute.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
///
/// # Example
///
/// ```
/// use lisk_wallet_protocol::crypto::sha256;
///
/// let hash = sha256(b"lisk");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Reads the first eight bytes of a hash as a little-endian `u64`.
///
/// This is how the network folds a 32-byte hash into the numeric space
/// used by both addresses and transaction identifiers: take the leading
/// eight bytes, reverse them, and read the result big-endian.
pub fn fold_to_u64(hash: &[u8; 32]) -> u64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(head)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
