//! APDU framing for the Lisk device app.
//!
//! Every command carries the same payload shape, split across as many
//! APDUs as needed:
//!
//! ```text
//! path        count u8 ‖ components u32 BE
//! length      u16 BE, length of `data`
//! flag        u8 (second-signature flag for transaction signing)
//! data        command-specific bytes
//! ```
//!
//! Chunks carry at most 255 payload bytes. `P1` marks the first chunk
//! (`0x00`) or a continuation (`0x80`); `P2` is `0x80` while more chunks
//! follow and `0x00` on the last one.

use super::path::DerivationPath;
use super::transport::DeviceError;

pub const CLA: u8 = 0xE0;
pub const MAX_CHUNK: usize = 255;

const P1_FIRST: u8 = 0x00;
const P1_MORE: u8 = 0x80;
const P2_MORE: u8 = 0x80;
const P2_LAST: u8 = 0x00;

pub const SW_OK: u16 = 0x9000;
pub const SW_DENIED: u16 = 0x6985;

/// Device app instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    GetPublicKey = 0x04,
    SignTransaction = 0x05,
    SignMessage = 0x06,
}

/// One command APDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apdu {
    pub ins: Instruction,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl Apdu {
    /// `CLA INS P1 P2 Lc data`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 + self.data.len());
        out.extend_from_slice(&[CLA, self.ins as u8, self.p1, self.p2, self.data.len() as u8]);
        out.extend_from_slice(&self.data);
        out
    }
}

/// Response data plus status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    pub data: Vec<u8>,
    pub status: u16,
}

impl ApduResponse {
    pub fn ok(data: Vec<u8>) -> Self {
        Self { data, status: SW_OK }
    }

    /// Maps the status word onto the device error taxonomy.
    pub fn into_result(self) -> Result<Vec<u8>, DeviceError> {
        match self.status {
            SW_OK => Ok(self.data),
            SW_DENIED => Err(DeviceError::UserRejected),
            other => Err(DeviceError::Status(other)),
        }
    }
}

/// Builds the APDU sequence for one command.
pub fn frame(
    ins: Instruction,
    path: &DerivationPath,
    flag: u8,
    data: &[u8],
) -> Result<Vec<Apdu>, DeviceError> {
    let len = u16::try_from(data.len())
        .map_err(|_| DeviceError::InvalidResponse(format!("payload of {} bytes too large", data.len())))?;

    let mut payload = path.to_bytes();
    payload.extend_from_slice(&len.to_be_bytes());
    payload.push(flag);
    payload.extend_from_slice(data);

    let chunks: Vec<&[u8]> = payload.chunks(MAX_CHUNK).collect();
    let last = chunks.len() - 1;
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| Apdu {
            ins,
            p1: if i == 0 { P1_FIRST } else { P1_MORE },
            p2: if i == last { P2_LAST } else { P2_MORE },
            data: chunk.to_vec(),
        })
        .collect())
}
