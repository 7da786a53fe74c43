//! Device transport seam.
//!
//! A transport moves raw APDUs to the device and back. How depends on the
//! runtime: USB HID on a desktop, a TCP relay to an emulator, a scripted
//! device in tests. The adapter only needs two things from the
//! environment, exposed by [`TransportFactory`]: whether a transport can
//! exist at all, and a way to open one.

use async_trait::async_trait;
use thiserror::Error;

use super::apdu::{Apdu, ApduResponse};

/// Device-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The runtime has no way of reaching a device.
    #[error("no device transport is available in this environment")]
    NoTransportAvailable,

    /// A transport exists but could not be opened or broke mid-exchange.
    #[error("device transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("request was rejected on the device")]
    UserRejected,

    #[error("device did not answer within the transport timeout")]
    Timeout,

    /// The device answered with a status word other than success or denial.
    #[error("device returned status 0x{0:04X}")]
    Status(u16),

    #[error("unexpected device response: {0}")]
    InvalidResponse(String),
}

/// An open channel to one device.
#[async_trait]
pub trait ApduTransport: Send {
    /// Sends one APDU and waits for its response.
    async fn exchange(&mut self, apdu: &Apdu) -> Result<ApduResponse, DeviceError>;
}

/// Environment capability for reaching a device.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// `false` when this environment can never reach a device. Checked
    /// before any other device work.
    fn is_available(&self) -> bool;

    /// Opens a transport.
    async fn create(&self) -> Result<Box<dyn ApduTransport>, DeviceError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Factory for environments without device support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransport;

#[async_trait]
impl TransportFactory for NoTransport {
    fn is_available(&self) -> bool {
        false
    }

    async fn create(&self) -> Result<Box<dyn ApduTransport>, DeviceError> {
        Err(DeviceError::NoTransportAvailable)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
