//! BIP-44 derivation paths for the Lisk app.

use std::fmt;

use crate::config::{BIP44_PURPOSE, LISK_COIN_INDEX};

const HARDENED: u32 = 0x8000_0000;

/// `44'/134'/<account>'`. Every component is hardened, so only the account
/// index varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath {
    account: u32,
}

impl DerivationPath {
    pub fn new(account: u32) -> Self {
        Self {
            account: account & !HARDENED,
        }
    }

    pub fn account(&self) -> u32 {
        self.account
    }

    /// Path components with the hardened bit set.
    pub fn components(&self) -> [u32; 3] {
        [
            BIP44_PURPOSE | HARDENED,
            LISK_COIN_INDEX | HARDENED,
            self.account | HARDENED,
        ]
    }

    /// Wire form: component count, then each component as u32 big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let components = self.components();
        let mut out = Vec::with_capacity(1 + 4 * components.len());
        out.push(components.len() as u8);
        for c in components {
            out.extend_from_slice(&c.to_be_bytes());
        }
        out
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'/{}'/{}'", BIP44_PURPOSE, LISK_COIN_INDEX, self.account)
    }
}
