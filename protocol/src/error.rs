//! Caller-facing error taxonomy.
//!
//! Every failure of a wallet request ends up as exactly one
//! [`WalletError`] kind, whatever backend produced it. Each kind maps to one
//! [`ErrorCategory`] so a caller can pick how to present it without
//! matching on internals.

use thiserror::Error;

use crate::broadcast::BroadcastError;
use crate::ledger::DeviceError;
use crate::transaction::{EncodingError, SignerError, VerificationError};

/// How a caller should present an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input or account state. Fix and resubmit.
    Validation,
    /// The signing device or its environment.
    Device,
    /// The network peer.
    Network,
}

/// Failure of a wallet request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("invalid transaction: {0}")]
    Encoding(#[from] EncodingError),

    /// Derived or device key does not match the account, or a required
    /// passphrase was not supplied.
    #[error("passphrase does not match the account")]
    InvalidPassphrase,

    #[error("no hardware device transport is available")]
    NoTransportAvailable,

    #[error("hardware device unavailable: {0}")]
    TransportUnavailable(String),

    #[error("request was rejected on the device")]
    UserRejected,

    #[error("device did not respond in time")]
    DeviceTimeout,

    #[error("account signing mode is not supported")]
    UnsupportedSigningMode,

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

impl WalletError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WalletError::Encoding(_)
            | WalletError::InvalidPassphrase
            | WalletError::UnsupportedSigningMode => ErrorCategory::Validation,
            WalletError::NoTransportAvailable
            | WalletError::TransportUnavailable(_)
            | WalletError::UserRejected
            | WalletError::DeviceTimeout => ErrorCategory::Device,
            WalletError::Broadcast(_) => ErrorCategory::Network,
        }
    }
}

impl From<SignerError> for WalletError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Encoding(e) => WalletError::Encoding(e),
            SignerError::InvalidPassphrase
            | SignerError::InvalidSecondPassphrase
            | SignerError::MissingSecondPassphrase => WalletError::InvalidPassphrase,
        }
    }
}

impl From<DeviceError> for WalletError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::NoTransportAvailable => WalletError::NoTransportAvailable,
            DeviceError::UserRejected => WalletError::UserRejected,
            DeviceError::Timeout => WalletError::DeviceTimeout,
            DeviceError::TransportUnavailable(reason) => WalletError::TransportUnavailable(reason),
            DeviceError::Status(_) | DeviceError::InvalidResponse(_) => {
                WalletError::TransportUnavailable(err.to_string())
            }
        }
    }
}

impl From<VerificationError> for WalletError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Encoding(e) => WalletError::Encoding(e),
            VerificationError::MissingSignature | VerificationError::MissingId => {
                WalletError::Encoding(EncodingError::MissingField("signature"))
            }
            VerificationError::InvalidSignature { .. }
            | VerificationError::MissingSecondSignature
            | VerificationError::InvalidSecondSignature { .. }
            | VerificationError::IdMismatch { .. } => WalletError::InvalidPassphrase,
        }
    }
}
