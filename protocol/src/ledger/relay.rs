//! TCP APDU relay transport.
//!
//! Device emulators and USB bridge daemons expose the device over a plain
//! TCP socket with length-prefixed frames:
//!
//! ```text
//! request     u32 BE length ‖ APDU bytes
//! response    u32 BE length ‖ data ‖ u16 BE status word
//! ```
//!
//! The length in the response counts `data` only. Every exchange is bounded
//! by the configured timeout, which covers the time a human needs to
//! confirm on the device.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::apdu::{Apdu, ApduResponse};
use super::transport::{ApduTransport, DeviceError, TransportFactory};

/// Upper bound on a response frame, to refuse garbage lengths.
const MAX_RESPONSE_LEN: usize = 4096;

/// Creates [`RelayTransport`]s for a configured relay address.
///
/// Unavailable when no address is configured.
#[derive(Debug, Clone)]
pub struct RelayTransportFactory {
    address: Option<String>,
    timeout: Duration,
}

impl RelayTransportFactory {
    pub fn new(address: Option<String>, timeout: Duration) -> Self {
        Self { address, timeout }
    }
}

#[async_trait]
impl TransportFactory for RelayTransportFactory {
    fn is_available(&self) -> bool {
        self.address.is_some()
    }

    async fn create(&self) -> Result<Box<dyn ApduTransport>, DeviceError> {
        let address = self
            .address
            .as_deref()
            .ok_or(DeviceError::NoTransportAvailable)?;
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(address))
            .await
            .map_err(|_| DeviceError::TransportUnavailable(format!("connect to {address} timed out")))?
            .map_err(|e| DeviceError::TransportUnavailable(format!("connect to {address}: {e}")))?;
        debug!(relay = %address, "device relay connected");
        Ok(Box::new(RelayTransport {
            stream,
            timeout: self.timeout,
        }))
    }

    fn name(&self) -> &'static str {
        "tcp-relay"
    }
}

/// One open relay connection.
pub struct RelayTransport {
    stream: TcpStream,
    timeout: Duration,
}

impl RelayTransport {
    async fn round_trip(&mut self, raw: &[u8]) -> std::io::Result<ApduResponse> {
        self.stream.write_u32(raw.len() as u32).await?;
        self.stream.write_all(raw).await?;
        self.stream.flush().await?;

        let len = self.stream.read_u32().await? as usize;
        if len > MAX_RESPONSE_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("response length {len} exceeds {MAX_RESPONSE_LEN}"),
            ));
        }
        let mut data = vec![0u8; len];
        self.stream.read_exact(&mut data).await?;
        let status = self.stream.read_u16().await?;
        Ok(ApduResponse { data, status })
    }
}

#[async_trait]
impl ApduTransport for RelayTransport {
    async fn exchange(&mut self, apdu: &Apdu) -> Result<ApduResponse, DeviceError> {
        let raw = apdu.to_bytes();
        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.round_trip(&raw)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(DeviceError::TransportUnavailable(e.to_string())),
            Err(_) => Err(DeviceError::Timeout),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::apdu::{Instruction, SW_OK};
    use tokio::net::TcpListener;

    fn sample_apdu() -> Apdu {
        Apdu {
            ins: Instruction::GetPublicKey,
            p1: 0,
            p2: 0,
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn unconfigured_factory_is_unavailable() {
        let factory = RelayTransportFactory::new(None, Duration::from_secs(1));
        assert!(!factory.is_available());
    }

    #[tokio::test]
    async fn exchanges_length_prefixed_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let len = sock.read_u32().await.unwrap() as usize;
            let mut apdu = vec![0u8; len];
            sock.read_exact(&mut apdu).await.unwrap();
            sock.write_u32(2).await.unwrap();
            sock.write_all(&[0xAB, 0xCD]).await.unwrap();
            sock.write_u16(SW_OK).await.unwrap();
            apdu
        });

        let factory = RelayTransportFactory::new(Some(addr), Duration::from_secs(5));
        assert!(factory.is_available());
        let mut transport = factory.create().await.unwrap();
        let response = transport.exchange(&sample_apdu()).await.unwrap();

        assert_eq!(response, ApduResponse::ok(vec![0xAB, 0xCD]));
        assert_eq!(server.await.unwrap(), sample_apdu().to_bytes());
    }

    #[tokio::test]
    async fn silent_device_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let _server = tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(sock);
        });

        let factory = RelayTransportFactory::new(Some(addr), Duration::from_millis(100));
        let mut transport = factory.create().await.unwrap();
        assert_eq!(
            transport.exchange(&sample_apdu()).await.err(),
            Some(DeviceError::Timeout)
        );
    }

    #[tokio::test]
    async fn unreachable_relay_is_transport_unavailable() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let factory = RelayTransportFactory::new(Some(addr), Duration::from_secs(1));
        assert!(matches!(
            factory.create().await.err(),
            Some(DeviceError::TransportUnavailable(_))
        ));
    }
}
