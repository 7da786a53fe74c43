//! # Hardware Device Support
//!
//! Signing on an external device running the Lisk app.
//!
//! ## Architecture
//!
//! ```text
//! path.rs     : 44'/134'/<account>' derivation paths
//! apdu.rs     : command framing, chunking, status words
//! transport.rs: ApduTransport / TransportFactory seam, DeviceError
//! relay.rs    : TCP APDU relay transport (emulators, bridge daemons)
//! device.rs   : Lisk app command client
//! session.rs  : HardwareSigner adapter, signing sessions, confirmation hook
//! ```
//!
//! The private key never leaves the device. The host sends unsigned
//! canonical bytes and receives a detached signature; the device shows the
//! transaction and waits for the user to approve or reject it.

pub mod apdu;
pub mod device;
pub mod path;
pub mod relay;
pub mod session;
pub mod transport;

pub use device::LiskDevice;
pub use path::DerivationPath;
pub use relay::RelayTransportFactory;
pub use session::{
    ConfirmationObserver, ConfirmationPrompt, HardwareSigner, NoopObserver, PromptKind,
    SessionState,
};
pub use transport::{ApduTransport, DeviceError, NoTransport, TransportFactory};
