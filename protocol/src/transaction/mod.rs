//! # Transaction Module
//!
//! Construction, canonical encoding, identifiers, local signing and
//! verification for Lisk transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs       : TransactionType, Asset, vote deltas, LSK amounts
//! builder.rs     : Transaction record and fluent TransactionBuilder
//! encoding.rs    : canonical byte encoding (and decoding)
//! id.rs          : signing digest and transaction identifier
//! signing.rs     : passphrase-derived local signer
//! verification.rs: signature and id checks on finished transactions
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: a per-kind constructor or [`TransactionBuilder`] validates
//!    the fields against the encoding rules.
//! 2. **Sign**: the digest of the unsigned canonical bytes is signed
//!    locally ([`LocalSigner`]) or on a hardware device.
//! 3. **Finalize**: the optional second signature is appended and the id
//!    is computed over the fully signed bytes.
//! 4. **Broadcast**: the JSON wire shape is submitted to a peer.
//!
//! ## Design Decisions
//!
//! - The fee is not part of the canonical bytes; see [`encoding`].
//! - Amounts are `u64` raw units (1 LSK = 10^8). No floating point.
//! - Any mutation of a signed field drops signatures and id.

pub mod builder;
pub mod encoding;
pub mod id;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use encoding::{decode_unsigned, EncodingError};
pub use signing::{sign_second, sign_transaction, LocalSigner, SignerError};
pub use types::{
    concat_vote_lists, format_lsk, parse_lsk, AmountError, Asset, TransactionType, VoteDelta,
    VoteDirection,
};
pub use verification::{verify_transaction, VerificationError};
