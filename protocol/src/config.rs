//! # Network Configuration & Constants
//!
//! Every protocol constant the wallet core depends on lives here: the slot
//! epoch, field widths of the canonical encoding, asset limits, the default
//! fee schedule and the peer handshake parameters.
//!
//! The values mirror the Lisk 0.9 network. The canonical byte layout is
//! consensus-critical on the peer side, so nothing in this file may change
//! without a matching change on the network.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::transaction::types::TransactionType;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Network epoch as Unix seconds: 2016-05-24T17:00:00Z.
///
/// Transaction timestamps count whole seconds from this instant.
pub const EPOCH_UNIX_SECONDS: i64 = 1_464_109_200;

/// Returns the network epoch as a UTC datetime.
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_UNIX_SECONDS, 0)
        .single()
        .unwrap_or_default()
}

/// Converts a wall-clock instant into a network timestamp (seconds since
/// the epoch, floored).
///
/// Instants before the epoch clamp to zero.
pub fn slot_time(at: DateTime<Utc>) -> u32 {
    let millis = (at - epoch()).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis / 1_000).min(i32::MAX as i64) as u32
}

/// Network timestamp for "now".
pub fn current_slot_time() -> u32 {
    slot_time(Utc::now())
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Number of decimal places in one LSK. 1 LSK = 10^8 beddows.
pub const LSK_DECIMALS: u32 = 8;

/// Raw units in one LSK.
pub const RAW_UNITS_PER_LSK: u64 = 100_000_000;

// ---------------------------------------------------------------------------
// Canonical Encoding
// ---------------------------------------------------------------------------

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Width of the encoded recipient field.
pub const RECIPIENT_LENGTH: usize = 8;

/// Bytes in an unsigned canonical encoding before the asset:
/// type (1) + timestamp (4) + sender key (32) + recipient (8) + amount (8).
pub const FIXED_HEADER_LENGTH: usize = 1 + 4 + PUBLIC_KEY_LENGTH + RECIPIENT_LENGTH + 8;

/// Suffix every address carries after its decimal digits.
pub const ADDRESS_SUFFIX: char = 'L';

// ---------------------------------------------------------------------------
// Asset Limits
// ---------------------------------------------------------------------------

/// Maximum delegate username length in bytes.
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Characters allowed in a delegate username besides `a-z` and `0-9`.
pub const USERNAME_EXTRA_CHARS: &str = "!@$&_.";

/// Maximum number of vote deltas in one vote transaction.
pub const MAX_VOTES_PER_TRANSACTION: usize = 33;

/// Maximum message length accepted for message signing, in bytes.
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Fixed fee for each transaction kind, in raw units.
///
/// The fee rides in the JSON wire shape only; it is not part of the
/// canonical bytes and therefore not covered by the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub send: u64,
    pub second_signature: u64,
    pub delegate: u64,
    pub vote: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            send: 10_000_000,
            second_signature: 500_000_000,
            delegate: 2_500_000_000,
            vote: 100_000_000,
        }
    }
}

impl FeeSchedule {
    /// Looks up the fee for a transaction kind.
    pub fn fee_for(&self, kind: TransactionType) -> u64 {
        match kind {
            TransactionType::Send => self.send,
            TransactionType::SecondSignature => self.second_signature,
            TransactionType::RegisterDelegate => self.delegate,
            TransactionType::Vote => self.vote,
        }
    }
}

// ---------------------------------------------------------------------------
// Hardware Device
// ---------------------------------------------------------------------------

/// BIP-44 purpose component of every device derivation path.
pub const BIP44_PURPOSE: u32 = 44;

/// SLIP-44 coin index for LSK.
pub const LISK_COIN_INDEX: u32 = 134;

/// Default per-exchange device timeout, in seconds. Human confirmation on
/// the device happens inside a single exchange, so this bounds how long a
/// prompt may stay open.
pub const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Peers
// ---------------------------------------------------------------------------

/// Mainnet network hash, sent to peers so they reject cross-network traffic.
pub const MAINNET_NETHASH: &str =
    "ed14889723f24ecc54871d058d98ce91ff2f973192075c0155ba2b7b70ad2511";

/// Testnet network hash.
pub const TESTNET_NETHASH: &str =
    "da3ed6a45429278bac2666961289ca17ad86595d33b31037615d4b8e8f158bba";

/// Peer API version this client announces.
pub const PEER_API_VERSION: &str = "0.9.9";

/// Port announced in the peer headers. Wallet clients do not accept
/// inbound connections; peers only check the header is present.
pub const ANNOUNCED_PORT: u16 = 8000;

/// HTTP timeout for a single broadcast, in seconds.
pub const BROADCAST_TIMEOUT_SECS: u64 = 15;

/// Headers a peer requires on every `/peer/*` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub nethash: String,
    pub version: String,
    pub min_version: String,
    pub os: String,
    pub port: u16,
}

impl NetworkParams {
    /// Parameters for mainnet.
    pub fn mainnet() -> Self {
        Self::with_nethash(MAINNET_NETHASH)
    }

    /// Parameters for testnet.
    pub fn testnet() -> Self {
        Self::with_nethash(TESTNET_NETHASH)
    }

    /// Parameters for a custom network identified by `nethash`.
    pub fn with_nethash(nethash: &str) -> Self {
        Self {
            nethash: nethash.to_string(),
            version: PEER_API_VERSION.to_string(),
            min_version: PEER_API_VERSION.to_string(),
            os: std::env::consts::OS.to_string(),
            port: ANNOUNCED_PORT,
        }
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
