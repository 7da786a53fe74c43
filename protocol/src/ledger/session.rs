//! Hardware signer adapter.
//!
//! [`HardwareSigner`] runs one device interaction per call:
//!
//! ```text
//! Idle ──create transport──▶ TransportAcquired ──open app──▶ DeviceReady
//!      ──notify observer──▶ AwaitingConfirmation ──▶ Signed | Rejected
//! ```
//!
//! ## Concurrency
//!
//! One adapter drives one physical device. Calls queue on an async mutex,
//! so at most one session talks to the device at a time; a second request
//! simply waits its turn.
//!
//! ## Cancellation
//!
//! Dropping the future before the confirmation prompt abandons the request
//! cleanly. Once the observer has been told to look at the device, the
//! exchange runs in its own task holding the device lock, so the device
//! always gets to finish answering even if the caller stopped waiting.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::device::LiskDevice;
use super::path::DerivationPath;
use super::transport::{DeviceError, TransportFactory};
use crate::crypto::keys::{Address, LiskPublicKey, LiskSignature};

// ---------------------------------------------------------------------------
// Confirmation hook
// ---------------------------------------------------------------------------

/// What the device is about to ask the user to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Transaction { second_signature: bool },
    Message,
}

/// Passed to the observer when the device shows its confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub path: DerivationPath,
    pub kind: PromptKind,
}

/// Receives "look at your device" notifications.
///
/// Called synchronously, at most once per signing request, right before
/// the device request is sent. Human confirmation may take arbitrarily
/// long after this fires.
pub trait ConfirmationObserver: Send + Sync {
    fn awaiting_confirmation(&self, prompt: &ConfirmationPrompt);
}

impl<F> ConfirmationObserver for F
where
    F: Fn(&ConfirmationPrompt) + Send + Sync,
{
    fn awaiting_confirmation(&self, prompt: &ConfirmationPrompt) {
        self(prompt)
    }
}

/// Observer that ignores notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConfirmationObserver for NoopObserver {
    fn awaiting_confirmation(&self, _prompt: &ConfirmationPrompt) {}
}

// ---------------------------------------------------------------------------
// Signing session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    TransportAcquired,
    DeviceReady,
    AwaitingConfirmation,
    Signed,
    Rejected,
}

impl SessionState {
    fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, TransportAcquired)
                | (TransportAcquired, DeviceReady)
                | (DeviceReady, AwaitingConfirmation)
                | (AwaitingConfirmation, Signed)
                | (AwaitingConfirmation, Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Signed | SessionState::Rejected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Single-use record of one device interaction. Never leaves the adapter.
#[derive(Debug)]
pub(crate) struct SigningSession {
    path: DerivationPath,
    state: SessionState,
}

impl SigningSession {
    pub(crate) fn new(path: DerivationPath) -> Self {
        Self {
            path,
            state: SessionState::Idle,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal session transition {} -> {}",
            self.state,
            next
        );
        debug!(path = %self.path, from = %self.state, to = %next, "signing session");
        self.state = next;
    }
}

// ---------------------------------------------------------------------------
// HardwareSigner
// ---------------------------------------------------------------------------

enum DeviceRequest {
    Transaction {
        canonical_bytes: Vec<u8>,
        second_signature: bool,
    },
    Message(String),
}

impl DeviceRequest {
    fn prompt_kind(&self) -> PromptKind {
        match self {
            DeviceRequest::Transaction {
                second_signature, ..
            } => PromptKind::Transaction {
                second_signature: *second_signature,
            },
            DeviceRequest::Message(_) => PromptKind::Message,
        }
    }
}

/// Adapter between the signing dispatcher and one hardware device.
///
/// Cheap to clone; clones share the device lock.
#[derive(Clone)]
pub struct HardwareSigner {
    factory: Arc<dyn TransportFactory>,
    path: DerivationPath,
    device_lock: Arc<Mutex<()>>,
}

impl HardwareSigner {
    pub fn new(factory: Arc<dyn TransportFactory>, path: DerivationPath) -> Self {
        Self {
            factory,
            path,
            device_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> DerivationPath {
        self.path
    }

    /// Whether this environment can reach a device at all.
    pub fn is_available(&self) -> bool {
        self.factory.is_available()
    }

    /// Signs unsigned canonical transaction bytes on the device.
    pub async fn sign_transaction(
        &self,
        canonical_bytes: Vec<u8>,
        second_signature: bool,
        observer: &dyn ConfirmationObserver,
    ) -> Result<LiskSignature, DeviceError> {
        self.run(
            DeviceRequest::Transaction {
                canonical_bytes,
                second_signature,
            },
            observer,
        )
        .await
    }

    /// Signs a message on the device.
    pub async fn sign_message(
        &self,
        message: &str,
        observer: &dyn ConfirmationObserver,
    ) -> Result<LiskSignature, DeviceError> {
        self.run(DeviceRequest::Message(message.to_string()), observer)
            .await
    }

    /// Reads the public key and address of the configured path. No
    /// confirmation is involved.
    pub async fn public_key(&self) -> Result<(LiskPublicKey, Address), DeviceError> {
        if !self.is_available() {
            return Err(DeviceError::NoTransportAvailable);
        }
        let _guard = self.device_lock.lock().await;
        let mut device = LiskDevice::new(self.factory.create().await?);
        device.get_public_key(&self.path).await
    }

    async fn run(
        &self,
        request: DeviceRequest,
        observer: &dyn ConfirmationObserver,
    ) -> Result<LiskSignature, DeviceError> {
        if !self.is_available() {
            warn!(transport = self.factory.name(), "no device transport available");
            return Err(DeviceError::NoTransportAvailable);
        }

        let mut session = SigningSession::new(self.path);
        let guard = Arc::clone(&self.device_lock).lock_owned().await;

        let transport = self.factory.create().await.map_err(|e| {
            warn!(transport = self.factory.name(), error = %e, "could not open device transport");
            e
        })?;
        session.advance(SessionState::TransportAcquired);

        let mut device = LiskDevice::new(transport);
        session.advance(SessionState::DeviceReady);

        let prompt = ConfirmationPrompt {
            path: self.path,
            kind: request.prompt_kind(),
        };
        observer.awaiting_confirmation(&prompt);
        info!(path = %self.path, kind = ?prompt.kind, "awaiting confirmation on device");
        session.advance(SessionState::AwaitingConfirmation);

        let path = self.path;
        let exchange = tokio::spawn(async move {
            let result = match request {
                DeviceRequest::Transaction {
                    canonical_bytes,
                    second_signature,
                } => {
                    device
                        .sign_transaction(&path, &canonical_bytes, second_signature)
                        .await
                }
                DeviceRequest::Message(message) => device.sign_message(&path, &message).await,
            };
            drop(guard);
            result
        });

        let result = exchange
            .await
            .map_err(|e| DeviceError::TransportUnavailable(format!("device task failed: {e}")))?;

        match &result {
            Ok(_) => session.advance(SessionState::Signed),
            Err(e) => {
                warn!(path = %self.path, error = %e, "device signing failed");
                session.advance(SessionState::Rejected);
            }
        }
        debug_assert!(session.state().is_terminal());
        result
    }
}

impl fmt::Debug for HardwareSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareSigner")
            .field("transport", &self.factory.name())
            .field("path", &self.path)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
