//! # Cryptographic Primitives
//!
//! Everything the wallet signs or hashes goes through this module:
//!
//! - **SHA-256** for passphrase key derivation, transaction digests,
//!   identifiers and addresses.
//! - **Ed25519** for transaction and message signatures.
//!
//! Both are thin wrappers over `sha2` and `ed25519-dalek`. Nothing here
//! implements a primitive by hand.

pub mod hash;
pub mod keys;
pub mod message;

pub use hash::sha256;
pub use keys::{Address, KeyError, LiskKeypair, LiskPublicKey, LiskSignature};
pub use message::{MessageError, SignedMessage};
