//! # Signing Dispatch
//!
//! Picks the signing backend for an account and normalises the three
//! completion shapes into one [`SigningOutcome`]:
//!
//! | Mode                 | Backend                           | Completion       |
//! |----------------------|-----------------------------------|------------------|
//! | `Passphrase`         | [`LocalSigner`], in-process       | immediate        |
//! | `HardwareDevice`     | [`HardwareSigner`], device I/O    | async round-trip |
//! | `UnsupportedDevice`  | none                              | immediate error  |
//!
//! Secrets arrive in [`Credentials`], which the dispatcher takes by value.
//! They are dropped, and their buffers zeroed, when the call returns on any
//! path.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::MAX_MESSAGE_LENGTH;
use crate::crypto::keys::{Address, LiskKeypair, LiskPublicKey};
use crate::crypto::message::SignedMessage;
use crate::error::WalletError;
use crate::ledger::{ConfirmationObserver, DerivationPath, HardwareSigner, NoTransport};
use crate::transaction::signing::{derive_second, sign_second};
use crate::transaction::{EncodingError, LocalSigner, Transaction};

// ---------------------------------------------------------------------------
// Account model
// ---------------------------------------------------------------------------

/// How an account produces signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningMode {
    /// Keys derived from a passphrase, in process.
    Passphrase,
    /// A hardware device running the Lisk app.
    HardwareDevice,
    /// A device type this wallet cannot drive.
    UnsupportedDevice,
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SigningMode::Passphrase => "passphrase",
            SigningMode::HardwareDevice => "hardware-device",
            SigningMode::UnsupportedDevice => "unsupported-device",
        })
    }
}

impl FromStr for SigningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passphrase" => Ok(SigningMode::Passphrase),
            "hardware-device" | "hardware" | "ledger" => Ok(SigningMode::HardwareDevice),
            "unsupported-device" | "unsupported" | "trezor" => Ok(SigningMode::UnsupportedDevice),
            other => Err(format!("unknown signing mode {other:?}")),
        }
    }
}

/// The public side of an account. Holds no secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub public_key: LiskPublicKey,
    pub address: Address,
    pub signing_mode: SigningMode,
    /// Registered second signature key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_public_key: Option<LiskPublicKey>,
}

impl Account {
    pub fn new(public_key: LiskPublicKey, signing_mode: SigningMode) -> Self {
        Self {
            public_key,
            address: public_key.to_address(),
            signing_mode,
            second_public_key: None,
        }
    }

    /// Passphrase account for `passphrase`. Only the public key is kept.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::new(
            LiskKeypair::from_passphrase(passphrase).public_key(),
            SigningMode::Passphrase,
        )
    }

    pub fn with_second_public_key(mut self, second_public_key: LiskPublicKey) -> Self {
        self.second_public_key = Some(second_public_key);
        self
    }
}

/// Secrets for one request. Cleared from memory on drop.
#[derive(Default)]
pub struct Credentials {
    passphrase: Option<Zeroizing<String>>,
    second_passphrase: Option<Zeroizing<String>>,
}

impl Credentials {
    /// No secrets, e.g. for hardware accounts without a second signature.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn passphrase(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Some(Zeroizing::new(passphrase.into())),
            second_passphrase: None,
        }
    }

    pub fn with_second_passphrase(mut self, second: impl Into<String>) -> Self {
        self.second_passphrase = Some(Zeroizing::new(second.into()));
        self
    }

    /// Takes secrets that are already zeroizing, without copying them.
    pub fn from_secrets(
        passphrase: Option<Zeroizing<String>>,
        second_passphrase: Option<Zeroizing<String>>,
    ) -> Self {
        Self {
            passphrase,
            second_passphrase,
        }
    }

    fn primary(&self) -> Option<&str> {
        self.passphrase.as_deref().map(String::as_str)
    }

    fn second(&self) -> Option<&str> {
        self.second_passphrase.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field(
                "second_passphrase",
                &self.second_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Uniform result of a signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningOutcome {
    /// Signed, second-signed where required, and finalized with its id.
    Signed(Transaction),
    SigningFailed(WalletError),
}

impl SigningOutcome {
    pub fn into_result(self) -> Result<Transaction, WalletError> {
        match self {
            SigningOutcome::Signed(tx) => Ok(tx),
            SigningOutcome::SigningFailed(err) => Err(err),
        }
    }
}

impl From<Result<Transaction, WalletError>> for SigningOutcome {
    fn from(result: Result<Transaction, WalletError>) -> Self {
        match result {
            Ok(tx) => SigningOutcome::Signed(tx),
            Err(err) => SigningOutcome::SigningFailed(err),
        }
    }
}

/// Routes signing requests to the backend for the account's mode.
#[derive(Debug, Clone)]
pub struct SigningDispatcher {
    hardware: HardwareSigner,
}

impl SigningDispatcher {
    pub fn new(hardware: HardwareSigner) -> Self {
        Self { hardware }
    }

    /// Dispatcher for environments without device support. Hardware
    /// accounts fail with `NoTransportAvailable`.
    pub fn passphrase_only() -> Self {
        Self::new(HardwareSigner::new(
            Arc::new(NoTransport),
            DerivationPath::default(),
        ))
    }

    /// Whether hardware signing can be attempted here.
    pub fn hardware_available(&self) -> bool {
        self.hardware.is_available()
    }

    /// Signs `tx` for `account`. Always reaches a terminal outcome.
    pub async fn sign(
        &self,
        account: &Account,
        tx: Transaction,
        credentials: Credentials,
        observer: &dyn ConfirmationObserver,
    ) -> SigningOutcome {
        debug!(mode = %account.signing_mode, tx_type = %tx.kind(), "dispatching signing request");
        let result = match account.signing_mode {
            SigningMode::Passphrase => sign_with_passphrase(account, tx, &credentials),
            SigningMode::HardwareDevice => {
                self.sign_with_device(account, tx, &credentials, observer)
                    .await
            }
            SigningMode::UnsupportedDevice => Err(WalletError::UnsupportedSigningMode),
        };
        if let Err(err) = &result {
            warn!(mode = %account.signing_mode, error = %err, "signing failed");
        }
        result.into()
    }

    /// Signs a free-form message for `account`.
    pub async fn sign_message(
        &self,
        account: &Account,
        message: &str,
        credentials: Credentials,
        observer: &dyn ConfirmationObserver,
    ) -> Result<SignedMessage, WalletError> {
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(EncodingError::MessageTooLong {
                len: message.len(),
                max: MAX_MESSAGE_LENGTH,
            }
            .into());
        }
        match account.signing_mode {
            SigningMode::Passphrase => {
                let passphrase = credentials.primary().ok_or(WalletError::InvalidPassphrase)?;
                let signer = LocalSigner::from_passphrases(
                    passphrase,
                    None,
                    &account.public_key,
                    None,
                )?;
                Ok(signer.sign_message(message))
            }
            SigningMode::HardwareDevice => {
                let signature = self.hardware.sign_message(message, observer).await?;
                Ok(SignedMessage::from_detached(
                    message,
                    account.public_key,
                    &signature,
                ))
            }
            SigningMode::UnsupportedDevice => Err(WalletError::UnsupportedSigningMode),
        }
    }

    async fn sign_with_device(
        &self,
        account: &Account,
        mut tx: Transaction,
        credentials: &Credentials,
        observer: &dyn ConfirmationObserver,
    ) -> Result<Transaction, WalletError> {
        if tx.sender_public_key() != &account.public_key {
            return Err(WalletError::InvalidPassphrase);
        }
        // Resolve the second key before the device prompt so a missing or
        // wrong second passphrase never costs the user a confirmation.
        let second = derive_second(credentials.second(), account.second_public_key.as_ref())?;

        let canonical_bytes = tx.signable_bytes()?;
        let digest = tx.digest()?;
        // The device only ever produces the first signature; the second one
        // is made locally below.
        let signature = self
            .hardware
            .sign_transaction(canonical_bytes, false, observer)
            .await?;

        if !account.public_key.verify(&digest, &signature) {
            warn!(path = %self.hardware.path(), "device signed with a key other than the account's");
            return Err(WalletError::InvalidPassphrase);
        }

        tx.attach_signature(signature);
        match &second {
            Some(keypair) => {
                sign_second(&mut tx, keypair)?;
            }
            None => {
                tx.finalize()?;
            }
        }
        Ok(tx)
    }
}

fn sign_with_passphrase(
    account: &Account,
    mut tx: Transaction,
    credentials: &Credentials,
) -> Result<Transaction, WalletError> {
    let passphrase = credentials.primary().ok_or(WalletError::InvalidPassphrase)?;
    let signer = LocalSigner::from_passphrases(
        passphrase,
        credentials.second(),
        &account.public_key,
        account.second_public_key.as_ref(),
    )?;
    signer.sign(&mut tx)?;
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
