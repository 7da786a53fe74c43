// Copyright (c) 2026 Lisk Wallet Contributors. MIT License.
// See LICENSE for details.

//! # Lisk Wallet: Protocol Library
//!
//! The part of a wallet that has to be right: turning "send 1 LSK to
//! 1859190791819301L" into bytes the network will accept, getting them
//! signed by whichever backend the account uses, and handing the result
//! to a peer.
//!
//! Signatures and ids are computed over a hand-written, bit-exact byte
//! layout. One misplaced byte and the network rejects the transaction, so
//! the encoder is pinned by golden fixtures.
//!
//! ## Architecture
//!
//! - **config**: network epoch, fee schedule, limits, peer headers.
//! - **crypto**: SHA-256, Ed25519 keys from passphrases, addresses,
//!   signed messages.
//! - **transaction**: transaction record, canonical encoding, ids, local
//!   signing, verification.
//! - **ledger**: hardware device adapter: APDU framing, transports,
//!   confirmation hook, serialised device sessions.
//! - **dispatch**: account signing modes and the dispatcher choosing a
//!   backend.
//! - **broadcast**: peer submission and receipts.
//! - **wallet**: the caller-facing `request_*` operations.
//! - **error**: the error taxonomy every request failure maps into.
//!
//! ## Design Philosophy
//!
//! 1. Encoding is pure and deterministic. Same fields, same bytes.
//! 2. Secrets live for one request and are zeroed on drop.
//! 3. Every backend failure becomes one [`WalletError`] kind before it
//!    reaches the caller.
//! 4. If it touches money, it has tests. Plural.

pub mod broadcast;
pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod transaction;
pub mod wallet;

pub use broadcast::{HttpPeer, PeerClient, Receipt};
pub use dispatch::{Account, Credentials, SigningDispatcher, SigningMode, SigningOutcome};
pub use error::{ErrorCategory, WalletError};
pub use wallet::Wallet;
