//! Canonical binary encoding.
//!
//! The byte layout is what signatures and identifiers are computed over,
//! so it must match the network bit for bit:
//!
//! ```text
//! type        u8
//! timestamp   i32 little-endian, seconds since the network epoch
//! sender      32 bytes, Ed25519 public key
//! recipient   8 bytes, address number big-endian (zeros when absent, so
//!             `0L` is refused)
//! amount      i64 little-endian, raw units
//! asset       kind-specific, see below
//! signature   64 bytes, only when present and requested
//! signSig     64 bytes, only when present and requested
//! ```
//!
//! Asset bytes: transfers have none; second-signature registration writes
//! the 32 raw key bytes; delegate registration writes the UTF-8 username;
//! votes write the UTF-8 delta strings concatenated in list order.
//!
//! The fee is not encoded. Peers hash and verify exactly these bytes, and
//! the fee is checked against the fee table separately.
//!
//! Fields are written in a fixed order by hand. Nothing here goes through
//! serde, because a serializer's field order is not a contract.

use std::collections::HashSet;

use thiserror::Error;

use super::builder::Transaction;
use super::types::{Asset, TransactionType, VoteDelta};
use crate::config::{
    FeeSchedule, FIXED_HEADER_LENGTH, MAX_USERNAME_LENGTH, MAX_VOTES_PER_TRANSACTION,
    PUBLIC_KEY_LENGTH, RECIPIENT_LENGTH, SIGNATURE_LENGTH, USERNAME_EXTRA_CHARS,
};
use crate::crypto::keys::{Address, LiskPublicKey};

/// Length of one encoded vote delta: sign character plus 64 hex characters.
const VOTE_DELTA_LENGTH: usize = 1 + 2 * PUBLIC_KEY_LENGTH;

/// A field is missing or cannot be represented in its fixed-width slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// `0L` would encode as eight zero bytes, the same as no recipient.
    #[error("recipient 0L is indistinguishable from no recipient")]
    ZeroRecipient,

    #[error("{kind} transaction cannot carry a {asset_kind} asset")]
    AssetMismatch {
        kind: TransactionType,
        asset_kind: TransactionType,
    },

    #[error("amount {0} does not fit in a signed 64-bit field")]
    AmountOverflow(u64),

    #[error("timestamp {0} does not fit in a signed 32-bit field")]
    TimestampOverflow(u32),

    #[error("delegate username must not be empty")]
    EmptyUsername,

    #[error("delegate username is {len} bytes, maximum is {max}")]
    UsernameTooLong { len: usize, max: usize },

    #[error("delegate username {0:?} contains characters outside a-z, 0-9 and !@$&_.")]
    InvalidUsername(String),

    #[error("delegate username {0:?} looks like an address")]
    UsernameIsAddress(String),

    #[error("vote transaction must contain at least one vote")]
    NoVotes,

    #[error("{count} votes exceed the maximum of {max} per transaction")]
    TooManyVotes { count: usize, max: usize },

    #[error("delegate {0} appears more than once in the vote list")]
    DuplicateVote(String),

    #[error("message is {len} bytes, maximum is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("canonical bytes truncated: need at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unknown transaction type tag {0}")]
    UnknownType(u8),

    #[error("malformed {0} asset bytes")]
    MalformedAsset(&'static str),
}

/// Which signatures to append after the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureInclusion {
    None,
    First,
    All,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Checks every field can be encoded. Run by the builder and before every
/// encode, since deserialized transactions bypass the builder.
pub fn validate(tx: &Transaction) -> Result<(), EncodingError> {
    let asset_kind = tx.asset().kind();
    if asset_kind != tx.kind() {
        return Err(EncodingError::AssetMismatch {
            kind: tx.kind(),
            asset_kind,
        });
    }
    if tx.amount() > i64::MAX as u64 {
        return Err(EncodingError::AmountOverflow(tx.amount()));
    }
    if tx.timestamp() > i32::MAX as u32 {
        return Err(EncodingError::TimestampOverflow(tx.timestamp()));
    }
    if tx.recipient_id().map(|r| r.value()) == Some(0) {
        return Err(EncodingError::ZeroRecipient);
    }

    match tx.asset() {
        Asset::Empty => {
            if tx.recipient_id().is_none() {
                return Err(EncodingError::MissingField("recipientId"));
            }
        }
        Asset::SecondSignature { .. } => {}
        Asset::Delegate { username, .. } => validate_username(username)?,
        Asset::Votes(votes) => validate_votes(votes)?,
    }
    Ok(())
}

/// Username rules: 1..=20 bytes of `a-z`, `0-9` and `!@$&_.`, and not
/// shaped like an address.
pub fn validate_username(username: &str) -> Result<(), EncodingError> {
    if username.is_empty() {
        return Err(EncodingError::EmptyUsername);
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(EncodingError::UsernameTooLong {
            len: username.len(),
            max: MAX_USERNAME_LENGTH,
        });
    }
    let allowed = |c: char| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || USERNAME_EXTRA_CHARS.contains(c)
    };
    if !username.chars().all(allowed) {
        return Err(EncodingError::InvalidUsername(username.to_string()));
    }
    if let Some(digits) = username.strip_suffix('l') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EncodingError::UsernameIsAddress(username.to_string()));
        }
    }
    Ok(())
}

fn validate_votes(votes: &[VoteDelta]) -> Result<(), EncodingError> {
    if votes.is_empty() {
        return Err(EncodingError::NoVotes);
    }
    if votes.len() > MAX_VOTES_PER_TRANSACTION {
        return Err(EncodingError::TooManyVotes {
            count: votes.len(),
            max: MAX_VOTES_PER_TRANSACTION,
        });
    }
    let mut seen = HashSet::with_capacity(votes.len());
    for vote in votes {
        if !seen.insert(vote.delegate) {
            return Err(EncodingError::DuplicateVote(vote.delegate.to_hex()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Canonical bytes without any signature. This is what the first
/// signature covers and what hardware devices receive.
pub fn encode_unsigned(tx: &Transaction) -> Result<Vec<u8>, EncodingError> {
    encode(tx, SignatureInclusion::None)
}

/// Canonical bytes including the first signature (if present). This is
/// what the second signature covers.
pub fn encode_with_first_signature(tx: &Transaction) -> Result<Vec<u8>, EncodingError> {
    encode(tx, SignatureInclusion::First)
}

/// Canonical bytes including every present signature. The identifier is
/// computed over these.
pub fn encode_signed(tx: &Transaction) -> Result<Vec<u8>, EncodingError> {
    encode(tx, SignatureInclusion::All)
}

fn encode(tx: &Transaction, inclusion: SignatureInclusion) -> Result<Vec<u8>, EncodingError> {
    validate(tx)?;

    let asset = asset_bytes(tx.asset());
    let mut buf = Vec::with_capacity(FIXED_HEADER_LENGTH + asset.len() + 2 * SIGNATURE_LENGTH);

    buf.push(tx.kind().tag());
    buf.extend_from_slice(&(tx.timestamp() as i32).to_le_bytes());
    buf.extend_from_slice(tx.sender_public_key().as_bytes());

    // Recipient is the only big-endian field.
    match tx.recipient_id() {
        Some(address) => buf.extend_from_slice(&address.value().to_be_bytes()),
        None => buf.extend_from_slice(&[0u8; RECIPIENT_LENGTH]),
    }

    buf.extend_from_slice(&(tx.amount() as i64).to_le_bytes());
    buf.extend_from_slice(&asset);

    if inclusion != SignatureInclusion::None {
        if let Some(signature) = tx.signature() {
            buf.extend_from_slice(signature.as_bytes());
        }
    }
    if inclusion == SignatureInclusion::All {
        if let Some(signature) = tx.sign_signature() {
            buf.extend_from_slice(signature.as_bytes());
        }
    }

    Ok(buf)
}

fn asset_bytes(asset: &Asset) -> Vec<u8> {
    match asset {
        Asset::Empty => Vec::new(),
        Asset::SecondSignature { public_key } => public_key.as_bytes().to_vec(),
        Asset::Delegate { username, .. } => username.as_bytes().to_vec(),
        Asset::Votes(votes) => votes
            .iter()
            .map(VoteDelta::to_string)
            .collect::<String>()
            .into_bytes(),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes unsigned canonical bytes back into a transaction.
///
/// The fee is not part of the encoding, so it is taken from `fees` for
/// the decoded kind. An all-zero recipient field decodes as "no
/// recipient"; address `0L` is not representable on the wire.
pub fn decode_unsigned(bytes: &[u8], fees: &FeeSchedule) -> Result<Transaction, EncodingError> {
    if bytes.len() < FIXED_HEADER_LENGTH {
        return Err(EncodingError::Truncated {
            expected: FIXED_HEADER_LENGTH,
            actual: bytes.len(),
        });
    }

    let kind = TransactionType::from_tag(bytes[0]).ok_or(EncodingError::UnknownType(bytes[0]))?;
    let timestamp = i32::from_le_bytes(fixed(&bytes[1..5]));
    let sender = LiskPublicKey::try_from_slice(&bytes[5..37])
        .map_err(|_| EncodingError::MalformedAsset("sender public key"))?;
    let recipient = u64::from_be_bytes(fixed(&bytes[37..45]));
    let amount = i64::from_le_bytes(fixed(&bytes[45..53]));
    let asset_raw = &bytes[FIXED_HEADER_LENGTH..];

    if timestamp < 0 {
        return Err(EncodingError::MalformedAsset("timestamp"));
    }
    if amount < 0 {
        return Err(EncodingError::MalformedAsset("amount"));
    }

    let asset = decode_asset(kind, asset_raw, &sender)?;
    let recipient = (recipient != 0).then(|| Address::new(recipient));

    let tx = Transaction::from_parts(
        kind,
        sender,
        recipient,
        amount as u64,
        fees.fee_for(kind),
        timestamp as u32,
        asset,
    );
    validate(&tx)?;
    Ok(tx)
}

fn decode_asset(
    kind: TransactionType,
    raw: &[u8],
    sender: &LiskPublicKey,
) -> Result<Asset, EncodingError> {
    match kind {
        TransactionType::Send => {
            if raw.is_empty() {
                Ok(Asset::Empty)
            } else {
                Err(EncodingError::MalformedAsset("transfer"))
            }
        }
        TransactionType::SecondSignature => {
            let public_key = LiskPublicKey::try_from_slice(raw)
                .map_err(|_| EncodingError::MalformedAsset("second signature"))?;
            Ok(Asset::SecondSignature { public_key })
        }
        TransactionType::RegisterDelegate => {
            let username = std::str::from_utf8(raw)
                .map_err(|_| EncodingError::MalformedAsset("delegate"))?;
            Ok(Asset::Delegate {
                username: username.to_string(),
                public_key: *sender,
            })
        }
        TransactionType::Vote => {
            if raw.len() % VOTE_DELTA_LENGTH != 0 {
                return Err(EncodingError::MalformedAsset("vote"));
            }
            let votes = raw
                .chunks(VOTE_DELTA_LENGTH)
                .map(|chunk| {
                    std::str::from_utf8(chunk)
                        .ok()
                        .and_then(|s| s.parse::<VoteDelta>().ok())
                        .ok_or(EncodingError::MalformedAsset("vote"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Asset::Votes(votes))
        }
    }
}

fn fixed<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{LiskKeypair, LiskSignature};
    use crate::transaction::types::concat_vote_lists;

    const T0: u32 = 38_350_076;
    const PASSPHRASE: &str =
        "wagon stock borrow episode laundry kitten salute link globe zero feed marble";

    fn sender() -> LiskPublicKey {
        LiskKeypair::from_passphrase(PASSPHRASE).public_key()
    }

    fn fixture_send() -> Transaction {
        Transaction::send(
            sender(),
            "1859190791819301L".parse().unwrap(),
            100_000_000,
            &FeeSchedule::default(),
            T0,
        )
        .unwrap()
    }

    #[test]
    fn send_golden_bytes() {
        let bytes = encode_unsigned(&fixture_send()).unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "00fc2c4902c094ebee7ec0c50ebee32918655e089f6e1a604b83bcaa760293c61e0f18ab6f\
             00069aec96b7502500e1f50500000000"
        );
        assert_eq!(bytes.len(), FIXED_HEADER_LENGTH);
    }

    #[test]
    fn delegate_golden_bytes() {
        let tx = Transaction::register_delegate(sender(), "genesis_51", &FeeSchedule::default(), T0)
            .unwrap();
        assert_eq!(
            hex::encode(encode_unsigned(&tx).unwrap()),
            "02fc2c4902c094ebee7ec0c50ebee32918655e089f6e1a604b83bcaa760293c61e0f18ab6f\
             0000000000000000000000000000000067656e657369735f3531"
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(
            encode_unsigned(&fixture_send()).unwrap(),
            encode_unsigned(&fixture_send()).unwrap()
        );
    }

    #[test]
    fn fee_is_not_encoded() {
        let a = fixture_send();
        let b = Transaction::send(
            sender(),
            "1859190791819301L".parse().unwrap(),
            100_000_000,
            &FeeSchedule {
                send: 1,
                ..FeeSchedule::default()
            },
            T0,
        )
        .unwrap();
        assert_ne!(a.fee(), b.fee());
        assert_eq!(encode_unsigned(&a).unwrap(), encode_unsigned(&b).unwrap());
    }

    #[test]
    fn signatures_are_appended_by_inclusion() {
        let mut tx = fixture_send();
        let first = LiskSignature::from_bytes([1u8; 64]);
        let second = LiskSignature::from_bytes([2u8; 64]);
        tx.attach_signature(first);
        tx.attach_second_signature(second).unwrap();

        let unsigned = encode_unsigned(&tx).unwrap();
        let with_first = encode_with_first_signature(&tx).unwrap();
        let signed = encode_signed(&tx).unwrap();

        assert_eq!(unsigned.len(), 53);
        assert_eq!(&with_first[53..], &[1u8; 64][..]);
        assert_eq!(&signed[53..117], &[1u8; 64][..]);
        assert_eq!(&signed[117..], &[2u8; 64][..]);
    }

    #[test]
    fn vote_order_changes_bytes() {
        let a = LiskKeypair::generate().public_key();
        let b = LiskKeypair::generate().public_key();
        let fees = FeeSchedule::default();
        let ab = Transaction::vote(sender(), concat_vote_lists(&[a, b], &[]), &fees, T0).unwrap();
        let ba = Transaction::vote(sender(), concat_vote_lists(&[b, a], &[]), &fees, T0).unwrap();
        assert_ne!(encode_unsigned(&ab).unwrap(), encode_unsigned(&ba).unwrap());
    }

    #[test]
    fn vote_asset_is_concatenated_delta_strings() {
        let a = LiskKeypair::generate().public_key();
        let b = LiskKeypair::generate().public_key();
        let tx = Transaction::vote(
            sender(),
            concat_vote_lists(&[a], &[b]),
            &FeeSchedule::default(),
            T0,
        )
        .unwrap();
        let bytes = encode_unsigned(&tx).unwrap();
        let expected = format!("+{}-{}", a, b);
        assert_eq!(&bytes[FIXED_HEADER_LENGTH..], expected.as_bytes());
    }

    #[test]
    fn username_limits() {
        assert_eq!(validate_username(""), Err(EncodingError::EmptyUsername));
        assert_eq!(validate_username(&"a".repeat(20)), Ok(()));
        assert_eq!(
            validate_username(&"a".repeat(21)),
            Err(EncodingError::UsernameTooLong { len: 21, max: 20 })
        );
        assert!(matches!(
            validate_username("Genesis"),
            Err(EncodingError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("has space"),
            Err(EncodingError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("12345l"),
            Err(EncodingError::UsernameIsAddress(_))
        ));
        assert_eq!(validate_username("l"), Ok(()));
        assert_eq!(validate_username("dev!@$&_."), Ok(()));
    }

    #[test]
    fn oversized_username_fails_to_build() {
        let err = Transaction::register_delegate(
            sender(),
            "abcdefghijklmnopqrstu",
            &FeeSchedule::default(),
            T0,
        )
        .unwrap_err();
        assert_eq!(err, EncodingError::UsernameTooLong { len: 21, max: 20 });
    }

    #[test]
    fn vote_limits() {
        let fees = FeeSchedule::default();
        assert_eq!(
            Transaction::vote(sender(), vec![], &fees, T0).unwrap_err(),
            EncodingError::NoVotes
        );

        let keys: Vec<_> = (0..34).map(|_| LiskKeypair::generate().public_key()).collect();
        assert_eq!(
            Transaction::vote(sender(), concat_vote_lists(&keys, &[]), &fees, T0).unwrap_err(),
            EncodingError::TooManyVotes { count: 34, max: 33 }
        );

        let dup = keys[0];
        assert!(matches!(
            Transaction::vote(sender(), concat_vote_lists(&[dup], &[dup]), &fees, T0),
            Err(EncodingError::DuplicateVote(_))
        ));
    }

    #[test]
    fn send_requires_recipient() {
        let err = crate::transaction::TransactionBuilder::new(TransactionType::Send, sender())
            .timestamp(T0)
            .build()
            .unwrap_err();
        assert_eq!(err, EncodingError::MissingField("recipientId"));
    }

    #[test]
    fn zero_recipient_is_rejected() {
        let zero = "0L".parse().unwrap();
        assert_eq!(
            Transaction::send(sender(), zero, 1, &FeeSchedule::default(), T0).unwrap_err(),
            EncodingError::ZeroRecipient
        );

        let mut tx = fixture_send();
        tx.set_recipient(Some(zero));
        assert_eq!(encode_unsigned(&tx).unwrap_err(), EncodingError::ZeroRecipient);
    }

    #[test]
    fn amount_must_fit_i64() {
        let err = crate::transaction::TransactionBuilder::new(TransactionType::Send, sender())
            .recipient(sender().to_address())
            .amount(i64::MAX as u64 + 1)
            .timestamp(T0)
            .build()
            .unwrap_err();
        assert_eq!(err, EncodingError::AmountOverflow(i64::MAX as u64 + 1));
    }

    #[test]
    fn timestamp_must_fit_i32() {
        let err = crate::transaction::TransactionBuilder::new(TransactionType::Send, sender())
            .recipient(sender().to_address())
            .timestamp(u32::MAX)
            .build()
            .unwrap_err();
        assert_eq!(err, EncodingError::TimestampOverflow(u32::MAX));
    }

    #[test]
    fn decode_restores_logical_fields() {
        let fees = FeeSchedule::default();
        let delegate = LiskKeypair::generate().public_key();
        let originals = vec![
            fixture_send(),
            Transaction::register_delegate(sender(), "genesis_51", &fees, T0).unwrap(),
            Transaction::vote(sender(), concat_vote_lists(&[delegate], &[]), &fees, T0).unwrap(),
            Transaction::register_second_signature(sender(), delegate, &fees, T0).unwrap(),
        ];
        for original in originals {
            let bytes = encode_unsigned(&original).unwrap();
            let decoded = decode_unsigned(&bytes, &fees).unwrap();
            assert_eq!(decoded, original, "kind {}", original.kind());
        }
    }

    #[test]
    fn decode_rejects_bad_input() {
        let fees = FeeSchedule::default();
        assert!(matches!(
            decode_unsigned(&[0u8; 10], &fees),
            Err(EncodingError::Truncated { expected: 53, actual: 10 })
        ));

        let mut bytes = encode_unsigned(&fixture_send()).unwrap();
        bytes[0] = 9;
        assert_eq!(
            decode_unsigned(&bytes, &fees),
            Err(EncodingError::UnknownType(9))
        );

        let mut bytes = encode_unsigned(&fixture_send()).unwrap();
        bytes.push(0xFF);
        assert_eq!(
            decode_unsigned(&bytes, &fees),
            Err(EncodingError::MalformedAsset("transfer"))
        );
    }
}
