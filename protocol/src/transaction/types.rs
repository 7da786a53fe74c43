//! Core type definitions for transactions.
//!
//! These are the vocabulary of every transaction the wallet builds: the
//! kind discriminant, the kind-specific asset payload, vote deltas and
//! LSK amount conversions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{LSK_DECIMALS, RAW_UNITS_PER_LSK};
use crate::crypto::keys::{KeyError, LiskPublicKey};

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// The numeric value is the type tag written as the first canonical byte
/// and the `type` field of the wire JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransactionType {
    /// Value transfer to a recipient address.
    Send = 0,
    /// Registration of a second passphrase public key.
    SecondSignature = 1,
    /// Registration of the sender as a delegate under a username.
    RegisterDelegate = 2,
    /// Adding and removing votes for delegates.
    Vote = 3,
}

impl TransactionType {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Send),
            1 => Some(Self::SecondSignature),
            2 => Some(Self::RegisterDelegate),
            3 => Some(Self::Vote),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => write!(f, "Send"),
            Self::SecondSignature => write!(f, "SecondSignature"),
            Self::RegisterDelegate => write!(f, "RegisterDelegate"),
            Self::Vote => write!(f, "Vote"),
        }
    }
}

impl Serialize for TransactionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

impl<'de> Deserialize<'de> for TransactionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(deserializer)?;
        Self::from_tag(tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown transaction type {}", tag)))
    }
}

// ---------------------------------------------------------------------------
// VoteDelta
// ---------------------------------------------------------------------------

/// Whether a vote delta adds or removes a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    Add,
    Remove,
}

impl VoteDirection {
    pub fn prefix(self) -> char {
        match self {
            Self::Add => '+',
            Self::Remove => '-',
        }
    }
}

/// One entry of a vote asset: `+<delegate public key>` or `-<delegate public key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteDelta {
    pub direction: VoteDirection,
    pub delegate: LiskPublicKey,
}

impl VoteDelta {
    pub fn add(delegate: LiskPublicKey) -> Self {
        Self {
            direction: VoteDirection::Add,
            delegate,
        }
    }

    pub fn remove(delegate: LiskPublicKey) -> Self {
        Self {
            direction: VoteDirection::Remove,
            delegate,
        }
    }
}

impl fmt::Display for VoteDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.direction.prefix(), self.delegate)
    }
}

impl FromStr for VoteDelta {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let direction = match s.chars().next() {
            Some('+') => VoteDirection::Add,
            Some('-') => VoteDirection::Remove,
            _ => return Err(KeyError::InvalidPublicKey),
        };
        let delegate = LiskPublicKey::from_hex(&s[1..])?;
        Ok(Self {
            direction,
            delegate,
        })
    }
}

impl Serialize for VoteDelta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VoteDelta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Joins voted and unvoted delegates into one ordered delta list:
/// every `+` entry in caller order, then every `-` entry in caller order.
pub fn concat_vote_lists(voted: &[LiskPublicKey], unvoted: &[LiskPublicKey]) -> Vec<VoteDelta> {
    voted
        .iter()
        .copied()
        .map(VoteDelta::add)
        .chain(unvoted.iter().copied().map(VoteDelta::remove))
        .collect()
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// Kind-specific payload of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "AssetWire", try_from = "AssetWire")]
pub enum Asset {
    /// Transfers carry no asset.
    Empty,
    SecondSignature { public_key: LiskPublicKey },
    Delegate { username: String, public_key: LiskPublicKey },
    Votes(Vec<VoteDelta>),
}

impl Asset {
    /// The transaction kind this asset belongs to. `Empty` maps to `Send`.
    pub fn kind(&self) -> TransactionType {
        match self {
            Self::Empty => TransactionType::Send,
            Self::SecondSignature { .. } => TransactionType::SecondSignature,
            Self::Delegate { .. } => TransactionType::RegisterDelegate,
            Self::Votes(_) => TransactionType::Vote,
        }
    }
}

/// JSON shape of the asset object on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AssetWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<SignatureAssetWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delegate: Option<DelegateAssetWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    votes: Option<Vec<VoteDelta>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureAssetWire {
    public_key: LiskPublicKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DelegateAssetWire {
    username: String,
    public_key: LiskPublicKey,
}

impl From<Asset> for AssetWire {
    fn from(asset: Asset) -> Self {
        match asset {
            Asset::Empty => AssetWire::default(),
            Asset::SecondSignature { public_key } => AssetWire {
                signature: Some(SignatureAssetWire { public_key }),
                ..AssetWire::default()
            },
            Asset::Delegate {
                username,
                public_key,
            } => AssetWire {
                delegate: Some(DelegateAssetWire {
                    username,
                    public_key,
                }),
                ..AssetWire::default()
            },
            Asset::Votes(votes) => AssetWire {
                votes: Some(votes),
                ..AssetWire::default()
            },
        }
    }
}

impl TryFrom<AssetWire> for Asset {
    type Error = String;

    fn try_from(wire: AssetWire) -> Result<Self, Self::Error> {
        match (wire.signature, wire.delegate, wire.votes) {
            (None, None, None) => Ok(Asset::Empty),
            (Some(sig), None, None) => Ok(Asset::SecondSignature {
                public_key: sig.public_key,
            }),
            (None, Some(delegate), None) => Ok(Asset::Delegate {
                username: delegate.username,
                public_key: delegate.public_key,
            }),
            (None, None, Some(votes)) => Ok(Asset::Votes(votes)),
            _ => Err("asset carries more than one payload".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Errors converting between decimal LSK strings and raw units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount {0:?} is not a decimal number")]
    NotANumber(String),

    #[error("amount {0:?} has more than 8 fractional digits")]
    TooPrecise(String),

    #[error("amount {0:?} is too large")]
    Overflow(String),
}

/// Converts a decimal LSK string (`"1.5"`) into raw units (`150000000`).
///
/// Integer arithmetic only: no floating point anywhere near money.
pub fn parse_lsk(input: &str) -> Result<u64, AmountError> {
    let s = input.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(AmountError::NotANumber(input.to_string()));
    }
    if frac.len() > LSK_DECIMALS as usize {
        return Err(AmountError::TooPrecise(input.to_string()));
    }

    let overflow = || AmountError::Overflow(input.to_string());
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_raw: u64 = if frac.is_empty() {
        0
    } else {
        let scale = 10u64.pow(LSK_DECIMALS - frac.len() as u32);
        frac.parse::<u64>().map_err(|_| overflow())? * scale
    };

    whole
        .checked_mul(RAW_UNITS_PER_LSK)
        .and_then(|raw| raw.checked_add(frac_raw))
        .ok_or_else(overflow)
}

/// Renders raw units as a decimal LSK string with all eight decimals.
///
/// Example: `150_000_000` becomes `"1.50000000"`.
pub fn format_lsk(raw: u64) -> String {
    format!(
        "{}.{:0>width$}",
        raw / RAW_UNITS_PER_LSK,
        raw % RAW_UNITS_PER_LSK,
        width = LSK_DECIMALS as usize
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LiskKeypair;

    #[test]
    fn type_tags_match_network() {
        assert_eq!(TransactionType::Send.tag(), 0);
        assert_eq!(TransactionType::SecondSignature.tag(), 1);
        assert_eq!(TransactionType::RegisterDelegate.tag(), 2);
        assert_eq!(TransactionType::Vote.tag(), 3);
        assert_eq!(TransactionType::from_tag(4), None);
    }

    #[test]
    fn type_serializes_as_number() {
        assert_eq!(serde_json::to_string(&TransactionType::Vote).unwrap(), "3");
        let back: TransactionType = serde_json::from_str("2").unwrap();
        assert_eq!(back, TransactionType::RegisterDelegate);
        assert!(serde_json::from_str::<TransactionType>("9").is_err());
    }

    #[test]
    fn vote_delta_string_form() {
        let key = LiskKeypair::generate().public_key();
        let add = VoteDelta::add(key);
        assert_eq!(add.to_string(), format!("+{}", key));
        assert_eq!(add.to_string().parse::<VoteDelta>().unwrap(), add);

        let remove: VoteDelta = format!("-{}", key).parse().unwrap();
        assert_eq!(remove.direction, VoteDirection::Remove);
        assert!(format!("*{}", key).parse::<VoteDelta>().is_err());
        assert!("".parse::<VoteDelta>().is_err());
    }

    #[test]
    fn concat_puts_votes_before_unvotes_in_caller_order() {
        let a = LiskKeypair::generate().public_key();
        let b = LiskKeypair::generate().public_key();
        let c = LiskKeypair::generate().public_key();
        let deltas = concat_vote_lists(&[b, a], &[c]);
        assert_eq!(
            deltas,
            vec![VoteDelta::add(b), VoteDelta::add(a), VoteDelta::remove(c)]
        );
    }

    #[test]
    fn asset_json_shapes() {
        assert_eq!(serde_json::to_string(&Asset::Empty).unwrap(), "{}");

        let key = LiskKeypair::generate().public_key();
        let delegate = Asset::Delegate {
            username: "genesis_51".to_string(),
            public_key: key,
        };
        let json = serde_json::to_value(&delegate).unwrap();
        assert_eq!(json["delegate"]["username"], "genesis_51");
        assert_eq!(json["delegate"]["publicKey"], key.to_hex());

        let sig = Asset::SecondSignature { public_key: key };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["signature"]["publicKey"], key.to_hex());

        let votes = Asset::Votes(vec![VoteDelta::remove(key)]);
        let json = serde_json::to_value(&votes).unwrap();
        assert_eq!(json["votes"][0], format!("-{}", key));
    }

    #[test]
    fn asset_with_two_payloads_is_rejected() {
        let key = LiskKeypair::generate().public_key();
        let json = format!(
            r#"{{"signature":{{"publicKey":"{k}"}},"votes":["+{k}"]}}"#,
            k = key
        );
        assert!(serde_json::from_str::<Asset>(&json).is_err());
    }

    #[test]
    fn parse_lsk_conversions() {
        assert_eq!(parse_lsk("1"), Ok(100_000_000));
        assert_eq!(parse_lsk("1.5"), Ok(150_000_000));
        assert_eq!(parse_lsk("0.00000001"), Ok(1));
        assert_eq!(parse_lsk(".1"), Ok(10_000_000));
        assert_eq!(parse_lsk("25."), Ok(2_500_000_000));
    }

    #[test]
    fn parse_lsk_rejects_bad_input() {
        assert!(matches!(parse_lsk(""), Err(AmountError::NotANumber(_))));
        assert!(matches!(parse_lsk("."), Err(AmountError::NotANumber(_))));
        assert!(matches!(parse_lsk("-1"), Err(AmountError::NotANumber(_))));
        assert!(matches!(parse_lsk("1e5"), Err(AmountError::NotANumber(_))));
        assert!(matches!(
            parse_lsk("0.000000001"),
            Err(AmountError::TooPrecise(_))
        ));
        assert!(matches!(
            parse_lsk("999999999999999999999"),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn format_lsk_pads_decimals() {
        assert_eq!(format_lsk(150_000_000), "1.50000000");
        assert_eq!(format_lsk(1), "0.00000001");
        assert_eq!(format_lsk(0), "0.00000000");
    }
}
