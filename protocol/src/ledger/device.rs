//! Client for the Lisk device app.
//!
//! Speaks the command set over any [`ApduTransport`]. Responses:
//!
//! - get public key: `len u8 ‖ public key ‖ len u8 ‖ address ASCII`
//! - sign transaction / sign message: the 64-byte signature
//!
//! Transactions are signed over their unsigned canonical bytes; the device
//! hashes them itself. Messages are signed over their UTF-8 bytes.

use tracing::debug;

use super::apdu::{self, Instruction};
use super::path::DerivationPath;
use super::transport::{ApduTransport, DeviceError};
use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::keys::{Address, LiskPublicKey, LiskSignature};

/// Device app client bound to one open transport.
pub struct LiskDevice {
    transport: Box<dyn ApduTransport>,
}

impl LiskDevice {
    pub fn new(transport: Box<dyn ApduTransport>) -> Self {
        Self { transport }
    }

    /// Public key and address for `path`. The reported address is checked
    /// against the one derived from the key.
    pub async fn get_public_key(
        &mut self,
        path: &DerivationPath,
    ) -> Result<(LiskPublicKey, Address), DeviceError> {
        let data = self.send(Instruction::GetPublicKey, path, 0, &[]).await?;

        let (key_len, rest) = data
            .split_first()
            .ok_or_else(|| invalid("empty public key response"))?;
        let key_len = *key_len as usize;
        if key_len != PUBLIC_KEY_LENGTH || rest.len() < key_len + 1 {
            return Err(invalid("truncated public key response"));
        }
        let public_key = LiskPublicKey::try_from_slice(&rest[..key_len])
            .map_err(|_| invalid("device returned an invalid public key"))?;

        let addr_len = rest[key_len] as usize;
        let addr_bytes = rest
            .get(key_len + 1..key_len + 1 + addr_len)
            .ok_or_else(|| invalid("truncated address"))?;
        let address = std::str::from_utf8(addr_bytes)
            .ok()
            .and_then(|s| s.parse::<Address>().ok())
            .ok_or_else(|| invalid("device returned an invalid address"))?;

        if address != public_key.to_address() {
            return Err(invalid("device address does not match its public key"));
        }
        Ok((public_key, address))
    }

    /// Asks the device to sign unsigned canonical transaction bytes.
    pub async fn sign_transaction(
        &mut self,
        path: &DerivationPath,
        canonical_bytes: &[u8],
        second_signature: bool,
    ) -> Result<LiskSignature, DeviceError> {
        let data = self
            .send(
                Instruction::SignTransaction,
                path,
                u8::from(second_signature),
                canonical_bytes,
            )
            .await?;
        parse_signature(&data)
    }

    /// Asks the device to sign a message.
    pub async fn sign_message(
        &mut self,
        path: &DerivationPath,
        message: &str,
    ) -> Result<LiskSignature, DeviceError> {
        let data = self
            .send(Instruction::SignMessage, path, 0, message.as_bytes())
            .await?;
        parse_signature(&data)
    }

    async fn send(
        &mut self,
        ins: Instruction,
        path: &DerivationPath,
        flag: u8,
        data: &[u8],
    ) -> Result<Vec<u8>, DeviceError> {
        let apdus = apdu::frame(ins, path, flag, data)?;
        let count = apdus.len();
        let mut last = Vec::new();
        for (i, command) in apdus.iter().enumerate() {
            debug!(ins = ?ins, chunk = i + 1, of = count, "apdu exchange");
            // Intermediate chunks answer with an empty success; only the
            // final chunk carries the result.
            last = self.transport.exchange(command).await?.into_result()?;
        }
        Ok(last)
    }
}

fn parse_signature(data: &[u8]) -> Result<LiskSignature, DeviceError> {
    let bytes = data
        .get(..SIGNATURE_LENGTH)
        .ok_or_else(|| invalid("signature response shorter than 64 bytes"))?;
    LiskSignature::try_from_slice(bytes).map_err(|_| invalid("malformed signature"))
}

fn invalid(reason: &str) -> DeviceError {
    DeviceError::InvalidResponse(reason.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LiskKeypair;
    use crate::ledger::apdu::{Apdu, ApduResponse, SW_DENIED};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Replies with canned responses and records what it was sent.
    struct Scripted {
        replies: Vec<ApduResponse>,
        sent: Arc<Mutex<Vec<Apdu>>>,
    }

    #[async_trait]
    impl ApduTransport for Scripted {
        async fn exchange(&mut self, apdu: &Apdu) -> Result<ApduResponse, DeviceError> {
            self.sent.lock().unwrap().push(apdu.clone());
            if self.replies.len() > 1 {
                Ok(self.replies.remove(0))
            } else {
                Ok(self.replies[0].clone())
            }
        }
    }

    fn device(replies: Vec<ApduResponse>) -> (LiskDevice, Arc<Mutex<Vec<Apdu>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = Scripted {
            replies,
            sent: Arc::clone(&sent),
        };
        (LiskDevice::new(Box::new(transport)), sent)
    }

    #[tokio::test]
    async fn get_public_key_parses_and_checks_address() {
        let kp = LiskKeypair::generate();
        let address = kp.address().to_string();
        let mut data = vec![32u8];
        data.extend_from_slice(kp.public_key().as_bytes());
        data.push(address.len() as u8);
        data.extend_from_slice(address.as_bytes());

        let (mut dev, _) = device(vec![ApduResponse::ok(data)]);
        let (pk, addr) = dev.get_public_key(&DerivationPath::default()).await.unwrap();
        assert_eq!(pk, kp.public_key());
        assert_eq!(addr, kp.address());
    }

    #[tokio::test]
    async fn mismatched_address_is_invalid() {
        let kp = LiskKeypair::generate();
        let mut data = vec![32u8];
        data.extend_from_slice(kp.public_key().as_bytes());
        let wrong = "1L";
        data.push(wrong.len() as u8);
        data.extend_from_slice(wrong.as_bytes());

        let (mut dev, _) = device(vec![ApduResponse::ok(data)]);
        assert!(matches!(
            dev.get_public_key(&DerivationPath::default()).await,
            Err(DeviceError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn sign_transaction_sends_all_chunks() {
        let kp = LiskKeypair::generate();
        let sig = kp.sign(b"whatever");
        let (mut dev, sent) = device(vec![
            ApduResponse::ok(vec![]),
            ApduResponse::ok(sig.as_bytes().to_vec()),
        ]);

        let bytes = vec![1u8; 300];
        let got = dev
            .sign_transaction(&DerivationPath::default(), &bytes, false)
            .await
            .unwrap();
        assert_eq!(got, sig);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|a| a.ins == Instruction::SignTransaction));
    }

    #[tokio::test]
    async fn denial_maps_to_user_rejected() {
        let (mut dev, _) = device(vec![ApduResponse {
            data: vec![],
            status: SW_DENIED,
        }]);
        assert_eq!(
            dev.sign_message(&DerivationPath::default(), "hi").await,
            Err(DeviceError::UserRejected)
        );
    }

    #[tokio::test]
    async fn short_signature_is_invalid() {
        let (mut dev, _) = device(vec![ApduResponse::ok(vec![0u8; 10])]);
        assert!(matches!(
            dev.sign_transaction(&DerivationPath::default(), b"tx", false).await,
            Err(DeviceError::InvalidResponse(_))
        ));
    }
}
