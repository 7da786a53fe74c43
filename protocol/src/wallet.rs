//! # Wallet API
//!
//! The operations a user interface calls. Each request runs the same
//! strictly sequential pipeline:
//!
//! ```text
//! build ─▶ dispatch signing ─▶ verify ─▶ broadcast ─▶ Receipt
//! ```
//!
//! and fails with a [`WalletError`] at the first step that does not
//! succeed. A transaction that failed to sign never reaches the peer.

use std::sync::Arc;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::broadcast::{self, PeerClient, Receipt};
use crate::config::{self, FeeSchedule};
use crate::crypto::keys::{Address, LiskKeypair, LiskPublicKey};
use crate::crypto::message::SignedMessage;
use crate::dispatch::{Account, Credentials, SigningDispatcher};
use crate::error::WalletError;
use crate::ledger::{ConfirmationObserver, NoopObserver};
use crate::transaction::{concat_vote_lists, verify_transaction, Transaction};

/// Caller-facing entry point.
pub struct Wallet {
    dispatcher: SigningDispatcher,
    peer: Arc<dyn PeerClient>,
    observer: Arc<dyn ConfirmationObserver>,
    fees: FeeSchedule,
    fixed_timestamp: Option<u32>,
}

impl Wallet {
    pub fn new(dispatcher: SigningDispatcher, peer: Arc<dyn PeerClient>) -> Self {
        Self {
            dispatcher,
            peer,
            observer: Arc::new(NoopObserver),
            fees: FeeSchedule::default(),
            fixed_timestamp: None,
        }
    }

    /// Receives "confirm on your device" notifications.
    pub fn with_observer(mut self, observer: Arc<dyn ConfirmationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    /// Pins every transaction timestamp. Used for reproducible fixtures.
    pub fn with_fixed_timestamp(mut self, timestamp: u32) -> Self {
        self.fixed_timestamp = Some(timestamp);
        self
    }

    pub fn dispatcher(&self) -> &SigningDispatcher {
        &self.dispatcher
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Transfers `amount` raw units to `recipient`.
    pub async fn request_send(
        &self,
        account: &Account,
        recipient: Address,
        amount: u64,
        credentials: Credentials,
    ) -> Result<Receipt, WalletError> {
        let tx = Transaction::send(
            account.public_key,
            recipient,
            amount,
            &self.fees,
            self.timestamp(),
        )?;
        self.sign_and_broadcast(account, tx, credentials).await
    }

    /// Registers the account as a delegate named `username`.
    pub async fn request_delegate_registration(
        &self,
        account: &Account,
        username: &str,
        credentials: Credentials,
    ) -> Result<Receipt, WalletError> {
        let tx = Transaction::register_delegate(
            account.public_key,
            username,
            &self.fees,
            self.timestamp(),
        )?;
        self.sign_and_broadcast(account, tx, credentials).await
    }

    /// Votes for `voted` and removes votes from `unvoted`, in the given
    /// order. Order is significant: it changes the id.
    pub async fn request_vote(
        &self,
        account: &Account,
        voted: &[LiskPublicKey],
        unvoted: &[LiskPublicKey],
        credentials: Credentials,
    ) -> Result<Receipt, WalletError> {
        let tx = Transaction::vote(
            account.public_key,
            concat_vote_lists(voted, unvoted),
            &self.fees,
            self.timestamp(),
        )?;
        self.sign_and_broadcast(account, tx, credentials).await
    }

    /// Registers the key derived from `second_passphrase` as the account's
    /// second signature key.
    pub async fn request_second_passphrase_registration(
        &self,
        account: &Account,
        second_passphrase: Zeroizing<String>,
        credentials: Credentials,
    ) -> Result<Receipt, WalletError> {
        let second_public_key = LiskKeypair::from_passphrase(&second_passphrase).public_key();
        drop(second_passphrase);
        let tx = Transaction::register_second_signature(
            account.public_key,
            second_public_key,
            &self.fees,
            self.timestamp(),
        )?;
        self.sign_and_broadcast(account, tx, credentials).await
    }

    /// Signs a message with the account key. Nothing is broadcast.
    pub async fn sign_message(
        &self,
        account: &Account,
        message: &str,
        credentials: Credentials,
    ) -> Result<SignedMessage, WalletError> {
        self.dispatcher
            .sign_message(account, message, credentials, self.observer.as_ref())
            .await
    }

    async fn sign_and_broadcast(
        &self,
        account: &Account,
        tx: Transaction,
        credentials: Credentials,
    ) -> Result<Receipt, WalletError> {
        debug!(tx_type = %tx.kind(), mode = %account.signing_mode, "processing wallet request");
        let tx = self
            .dispatcher
            .sign(account, tx, credentials, self.observer.as_ref())
            .await
            .into_result()?;

        verify_transaction(&tx, account.second_public_key.as_ref())?;

        let receipt = broadcast::broadcast(&tx, self.peer.as_ref()).await?;
        info!(
            tx_id = %receipt.transaction_id,
            tx_type = %receipt.kind,
            sender = %receipt.sender_id,
            "wallet request completed"
        );
        Ok(receipt)
    }

    fn timestamp(&self) -> u32 {
        self.fixed_timestamp
            .unwrap_or_else(config::current_slot_time)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{BroadcastError, BroadcastRequest, PeerError, PeerResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const PASSPHRASE: &str =
        "wagon stock borrow episode laundry kitten salute link globe zero feed marble";

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<Transaction>>,
        reject_with: Option<String>,
    }

    #[async_trait]
    impl PeerClient for Recording {
        async fn submit(&self, request: &BroadcastRequest) -> Result<PeerResponse, PeerError> {
            self.seen.lock().unwrap().push(request.transaction.clone());
            Ok(match &self.reject_with {
                Some(msg) => PeerResponse::rejected(msg.clone()),
                None => PeerResponse::accepted(request.transaction.id().unwrap_or_default()),
            })
        }
    }

    fn wallet(peer: Arc<Recording>) -> Wallet {
        Wallet::new(SigningDispatcher::passphrase_only(), peer).with_fixed_timestamp(38_350_076)
    }

    #[tokio::test]
    async fn send_produces_golden_receipt() {
        let peer = Arc::new(Recording::default());
        let account = Account::from_passphrase(PASSPHRASE);
        let receipt = wallet(Arc::clone(&peer))
            .request_send(
                &account,
                "1859190791819301L".parse().unwrap(),
                100_000_000,
                Credentials::passphrase(PASSPHRASE),
            )
            .await
            .unwrap();
        assert_eq!(receipt.transaction_id, "16587916646302268319");
        assert_eq!(peer.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delegate_registration_golden_id() {
        let peer = Arc::new(Recording::default());
        let account = Account::from_passphrase(PASSPHRASE);
        let receipt = wallet(Arc::clone(&peer))
            .request_delegate_registration(&account, "genesis_51", Credentials::passphrase(PASSPHRASE))
            .await
            .unwrap();
        assert_eq!(receipt.transaction_id, "16370465705851979034");
        assert_eq!(receipt.fee, 2_500_000_000);
    }

    #[tokio::test]
    async fn wrong_passphrase_never_broadcasts() {
        let peer = Arc::new(Recording::default());
        let account = Account::from_passphrase(PASSPHRASE);
        let err = wallet(Arc::clone(&peer))
            .request_send(
                &account,
                account.address,
                1,
                Credentials::passphrase("wrong"),
            )
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::InvalidPassphrase);
        assert!(peer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn peer_rejection_surfaces_message() {
        let peer = Arc::new(Recording {
            reject_with: Some("Account does not have enough LSK".into()),
            ..Recording::default()
        });
        let account = Account::from_passphrase(PASSPHRASE);
        let err = wallet(peer)
            .request_send(&account, account.address, 1, Credentials::passphrase(PASSPHRASE))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::Broadcast(BroadcastError::Rejected(
                "Account does not have enough LSK".into()
            ))
        );
    }

    #[tokio::test]
    async fn second_passphrase_registration_carries_second_key() {
        let peer = Arc::new(Recording::default());
        let account = Account::from_passphrase(PASSPHRASE);
        wallet(Arc::clone(&peer))
            .request_second_passphrase_registration(
                &account,
                Zeroizing::new("second secret passphrase for signing".to_string()),
                Credentials::passphrase(PASSPHRASE),
            )
            .await
            .unwrap();

        let seen = peer.seen.lock().unwrap();
        let json = serde_json::to_value(&seen[0]).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(
            json["asset"]["signature"]["publicKey"],
            "7834976cef17507ed9ee09377b91eee7c664505fd84227bcf641d3f97598c041"
        );
        assert_eq!(json["fee"], 500_000_000u64);
    }

    #[tokio::test]
    async fn account_with_second_key_gets_both_signatures() {
        let peer = Arc::new(Recording::default());
        let second = LiskKeypair::from_passphrase("second secret passphrase for signing");
        let account = Account::from_passphrase(PASSPHRASE).with_second_public_key(second.public_key());
        let receipt = wallet(Arc::clone(&peer))
            .request_send(
                &account,
                "1859190791819301L".parse().unwrap(),
                100_000_000,
                Credentials::passphrase(PASSPHRASE)
                    .with_second_passphrase("second secret passphrase for signing"),
            )
            .await
            .unwrap();
        assert_eq!(receipt.transaction_id, "15946436797255162336");
        assert!(peer.seen.lock().unwrap()[0].sign_signature().is_some());
    }
}
