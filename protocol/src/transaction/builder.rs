//! Transaction construction.
//!
//! [`TransactionBuilder`] assembles the logical fields and validates them
//! against the canonical encoding rules before handing back an unsigned
//! [`Transaction`]. The per-kind constructors (`Transaction::send`,
//! `Transaction::vote`, ...) fill in the network conventions (fee from the
//! schedule, vote recipient, delegate public key) so callers only supply
//! intent.
//!
//! The builder does not sign. That happens in [`super::signing`] or on a
//! hardware device, which keeps construction testable without key material.

use serde::{Deserialize, Serialize};

use super::encoding::{self, EncodingError};
use super::id;
use super::types::{Asset, TransactionType, VoteDelta};
use crate::config::{self, FeeSchedule};
use crate::crypto::keys::{Address, LiskPublicKey, LiskSignature};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A transaction in the network's wire shape.
///
/// Serializes to `{type, amount, fee, senderPublicKey, recipientId,
/// timestamp, asset, signature, signSignature, id}`; the three trailing
/// fields are omitted until they are set.
///
/// Signature and id are only valid over the exact canonical encoding of
/// the other fields. Fields are therefore private: every setter that
/// touches a signed field drops the signatures and the id, so a stale
/// signature can never be broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: u64,
    fee: u64,
    sender_public_key: LiskPublicKey,
    recipient_id: Option<Address>,
    timestamp: u32,
    asset: Asset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<LiskSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sign_signature: Option<LiskSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl Transaction {
    /// A transfer of `amount` raw units to `recipient`.
    pub fn send(
        sender: LiskPublicKey,
        recipient: Address,
        amount: u64,
        fees: &FeeSchedule,
        timestamp: u32,
    ) -> Result<Self, EncodingError> {
        TransactionBuilder::new(TransactionType::Send, sender)
            .recipient(recipient)
            .amount(amount)
            .fee(fees.send)
            .timestamp(timestamp)
            .build()
    }

    /// Registers the sender as a delegate named `username`.
    pub fn register_delegate(
        sender: LiskPublicKey,
        username: &str,
        fees: &FeeSchedule,
        timestamp: u32,
    ) -> Result<Self, EncodingError> {
        TransactionBuilder::new(TransactionType::RegisterDelegate, sender)
            .asset(Asset::Delegate {
                username: username.to_string(),
                public_key: sender,
            })
            .fee(fees.delegate)
            .timestamp(timestamp)
            .build()
    }

    /// Casts the given vote deltas. The recipient of a vote is the voter's
    /// own address.
    pub fn vote(
        sender: LiskPublicKey,
        votes: Vec<VoteDelta>,
        fees: &FeeSchedule,
        timestamp: u32,
    ) -> Result<Self, EncodingError> {
        TransactionBuilder::new(TransactionType::Vote, sender)
            .recipient(sender.to_address())
            .asset(Asset::Votes(votes))
            .fee(fees.vote)
            .timestamp(timestamp)
            .build()
    }

    /// Registers `second_public_key` as the account's second signature key.
    pub fn register_second_signature(
        sender: LiskPublicKey,
        second_public_key: LiskPublicKey,
        fees: &FeeSchedule,
        timestamp: u32,
    ) -> Result<Self, EncodingError> {
        TransactionBuilder::new(TransactionType::SecondSignature, sender)
            .asset(Asset::SecondSignature {
                public_key: second_public_key,
            })
            .fee(fees.second_signature)
            .timestamp(timestamp)
            .build()
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn sender_public_key(&self) -> &LiskPublicKey {
        &self.sender_public_key
    }

    pub fn sender_address(&self) -> Address {
        self.sender_public_key.to_address()
    }

    pub fn recipient_id(&self) -> Option<Address> {
        self.recipient_id
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn signature(&self) -> Option<&LiskSignature> {
        self.signature.as_ref()
    }

    pub fn sign_signature(&self) -> Option<&LiskSignature> {
        self.sign_signature.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// `true` once a first signature is attached.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// `true` once signed and the identifier has been computed.
    pub fn is_finalized(&self) -> bool {
        self.signature.is_some() && self.id.is_some()
    }

    /// Changes the amount. Drops signatures and id.
    pub fn set_amount(&mut self, amount: u64) {
        self.amount = amount;
        self.invalidate();
    }

    /// Changes the recipient. Drops signatures and id.
    pub fn set_recipient(&mut self, recipient: Option<Address>) {
        self.recipient_id = recipient;
        self.invalidate();
    }

    /// Changes the timestamp. Drops signatures and id.
    pub fn set_timestamp(&mut self, timestamp: u32) {
        self.timestamp = timestamp;
        self.invalidate();
    }

    /// Canonical bytes without signatures: the input to the first signature
    /// and what a hardware device is asked to sign.
    pub fn signable_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        encoding::encode_unsigned(self)
    }

    /// SHA-256 of [`Transaction::signable_bytes`].
    pub fn digest(&self) -> Result<[u8; 32], EncodingError> {
        Ok(id::digest(&self.signable_bytes()?))
    }

    /// Digest the second signature covers: canonical bytes including the
    /// first signature.
    pub fn second_signature_digest(&self) -> Result<[u8; 32], EncodingError> {
        Ok(id::digest(&encoding::encode_with_first_signature(self)?))
    }

    /// Recomputes the identifier from the current fields and signatures.
    pub fn compute_id(&self) -> Result<String, EncodingError> {
        Ok(id::transaction_id(&encoding::encode_signed(self)?))
    }

    /// Attaches the first signature. Any second signature and the id are
    /// dropped because both cover the first signature.
    pub fn attach_signature(&mut self, signature: LiskSignature) {
        self.signature = Some(signature);
        self.sign_signature = None;
        self.id = None;
    }

    /// Attaches the second signature. Fails if there is no first signature.
    pub fn attach_second_signature(&mut self, signature: LiskSignature) -> Result<(), EncodingError> {
        if self.signature.is_none() {
            return Err(EncodingError::MissingField("signature"));
        }
        self.sign_signature = Some(signature);
        self.id = None;
        Ok(())
    }

    /// Computes and stores the identifier. Requires a first signature.
    pub fn finalize(&mut self) -> Result<&str, EncodingError> {
        if self.signature.is_none() {
            return Err(EncodingError::MissingField("signature"));
        }
        let id = self.compute_id()?;
        Ok(self.id.insert(id).as_str())
    }

    fn invalidate(&mut self) {
        self.signature = None;
        self.sign_signature = None;
        self.id = None;
    }

    /// Assembles a transaction from decoded canonical fields. Used by the
    /// decoder, which has already validated the layout.
    pub(crate) fn from_parts(
        kind: TransactionType,
        sender_public_key: LiskPublicKey,
        recipient_id: Option<Address>,
        amount: u64,
        fee: u64,
        timestamp: u32,
        asset: Asset,
    ) -> Self {
        Self {
            kind,
            amount,
            fee,
            sender_public_key,
            recipient_id,
            timestamp,
            asset,
            signature: None,
            sign_signature: None,
            id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`] instances.
///
/// # Usage
///
/// ```rust,no_run
/// use lisk_wallet_protocol::crypto::LiskKeypair;
/// use lisk_wallet_protocol::transaction::{TransactionBuilder, TransactionType};
///
/// let sender = LiskKeypair::generate().public_key();
/// let tx = TransactionBuilder::new(TransactionType::Send, sender)
///     .recipient("1859190791819301L".parse().unwrap())
///     .amount(100_000_000)
///     .fee(10_000_000)
///     .build()
///     .unwrap();
/// ```
///
/// `timestamp` defaults to the current network time at build.
pub struct TransactionBuilder {
    kind: TransactionType,
    sender_public_key: LiskPublicKey,
    recipient_id: Option<Address>,
    amount: u64,
    fee: u64,
    timestamp: Option<u32>,
    asset: Asset,
}

impl TransactionBuilder {
    /// Starts a builder. Defaults: no recipient, zero amount, zero fee,
    /// empty asset.
    pub fn new(kind: TransactionType, sender_public_key: LiskPublicKey) -> Self {
        Self {
            kind,
            sender_public_key,
            recipient_id: None,
            amount: 0,
            fee: 0,
            timestamp: None,
            asset: Asset::Empty,
        }
    }

    pub fn recipient(mut self, recipient: Address) -> Self {
        self.recipient_id = Some(recipient);
        self
    }

    /// Sets the amount in raw units.
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the timestamp in seconds since the network epoch.
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn asset(mut self, asset: Asset) -> Self {
        self.asset = asset;
        self
    }

    /// Validates the fields against the encoding rules and produces an
    /// unsigned transaction.
    pub fn build(self) -> Result<Transaction, EncodingError> {
        let timestamp = self.timestamp.unwrap_or_else(config::current_slot_time);
        let tx = Transaction::from_parts(
            self.kind,
            self.sender_public_key,
            self.recipient_id,
            self.amount,
            self.fee,
            timestamp,
            self.asset,
        );
        encoding::validate(&tx)?;
        Ok(tx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LiskKeypair;
    use crate::transaction::types::concat_vote_lists;

    const T0: u32 = 38_350_076;

    fn sender() -> LiskPublicKey {
        LiskKeypair::from_passphrase("sender").public_key()
    }

    fn sample_send() -> Transaction {
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
    fn send_uses_send_fee_and_no_asset() {
        let tx = sample_send();
        assert_eq!(tx.kind(), TransactionType::Send);
        assert_eq!(tx.fee(), 10_000_000);
        assert_eq!(tx.asset(), &Asset::Empty);
        assert!(!tx.is_signed());
        assert!(tx.id().is_none());
    }

    #[test]
    fn vote_recipient_is_sender_address() {
        let delegate = LiskKeypair::generate().public_key();
        let tx = Transaction::vote(
            sender(),
            concat_vote_lists(&[delegate], &[]),
            &FeeSchedule::default(),
            T0,
        )
        .unwrap();
        assert_eq!(tx.recipient_id(), Some(sender().to_address()));
        assert_eq!(tx.fee(), 100_000_000);
        assert_eq!(tx.amount(), 0);
    }

    #[test]
    fn delegate_asset_carries_sender_key() {
        let tx = Transaction::register_delegate(sender(), "genesis_51", &FeeSchedule::default(), T0)
            .unwrap();
        assert_eq!(
            tx.asset(),
            &Asset::Delegate {
                username: "genesis_51".to_string(),
                public_key: sender(),
            }
        );
        assert_eq!(tx.recipient_id(), None);
        assert_eq!(tx.fee(), 2_500_000_000);
    }

    #[test]
    fn builder_rejects_mismatched_asset() {
        let err = TransactionBuilder::new(TransactionType::Send, sender())
            .recipient(sender().to_address())
            .asset(Asset::Votes(vec![]))
            .build()
            .unwrap_err();
        assert!(matches!(err, EncodingError::AssetMismatch { .. }));
    }

    #[test]
    fn builder_uses_current_time_if_not_set() {
        let before = config::current_slot_time();
        let tx = TransactionBuilder::new(TransactionType::Send, sender())
            .recipient(sender().to_address())
            .build()
            .unwrap();
        let after = config::current_slot_time();
        assert!(tx.timestamp() >= before && tx.timestamp() <= after);
    }

    fn fully_signed(mut tx: Transaction) -> Transaction {
        let kp = LiskKeypair::from_passphrase("sender");
        let second = LiskKeypair::from_passphrase("second");
        tx.attach_signature(kp.sign(&tx.digest().unwrap()));
        tx.attach_second_signature(second.sign(&tx.second_signature_digest().unwrap()))
            .unwrap();
        tx.finalize().unwrap();
        assert!(tx.is_finalized());
        tx
    }

    fn assert_unsigned(tx: &Transaction) {
        assert!(!tx.is_signed());
        assert!(tx.sign_signature().is_none());
        assert!(tx.id().is_none());
    }

    #[test]
    fn mutation_after_signing_drops_signature_and_id() {
        let mut tx = fully_signed(sample_send());
        tx.set_amount(1);
        assert_unsigned(&tx);
    }

    #[test]
    fn changing_recipient_drops_signatures_and_id() {
        let original = fully_signed(sample_send());
        let mut tx = original.clone();
        tx.set_recipient(Some(sender().to_address()));
        assert_unsigned(&tx);

        let resigned = fully_signed(tx);
        assert_ne!(resigned.id(), original.id());
    }

    #[test]
    fn changing_timestamp_drops_signatures_and_id() {
        let original = fully_signed(sample_send());
        let mut tx = original.clone();
        tx.set_timestamp(T0 + 1);
        assert_unsigned(&tx);
        assert_ne!(tx.signable_bytes().unwrap(), original.signable_bytes().unwrap());

        let resigned = fully_signed(tx);
        assert_ne!(resigned.id(), original.id());
    }

    #[test]
    fn finalize_requires_signature() {
        let mut tx = sample_send();
        assert_eq!(
            tx.finalize().unwrap_err(),
            EncodingError::MissingField("signature")
        );
    }

    #[test]
    fn second_signature_requires_first() {
        let kp = LiskKeypair::generate();
        let mut tx = sample_send();
        assert!(tx.attach_second_signature(kp.sign(b"x")).is_err());
    }

    #[test]
    fn reattaching_first_signature_drops_second() {
        let kp = LiskKeypair::generate();
        let mut tx = sample_send();
        tx.attach_signature(kp.sign(b"a"));
        tx.attach_second_signature(kp.sign(b"b")).unwrap();
        tx.attach_signature(kp.sign(b"c"));
        assert!(tx.sign_signature().is_none());
    }

    #[test]
    fn unsigned_json_omits_signature_and_id() {
        let json = serde_json::to_value(sample_send()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["type"], 0);
        assert_eq!(obj["amount"], 100_000_000u64);
        assert_eq!(obj["recipientId"], "1859190791819301L");
        assert_eq!(obj["asset"], serde_json::json!({}));
        assert!(!obj.contains_key("signature"));
        assert!(!obj.contains_key("id"));
    }

    #[test]
    fn delegate_json_has_null_recipient() {
        let tx = Transaction::register_delegate(sender(), "abc", &FeeSchedule::default(), T0)
            .unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json["recipientId"].is_null());
    }

    #[test]
    fn transaction_json_roundtrip() {
        let kp = LiskKeypair::from_passphrase("sender");
        let mut tx = sample_send();
        tx.attach_signature(kp.sign(&tx.digest().unwrap()));
        tx.finalize().unwrap();
        let json = serde_json::to_string(&tx).unwrap();
        let recovered: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, recovered);
    }
}
