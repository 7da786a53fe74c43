// Copyright (c) 2026 Lisk Wallet Contributors. MIT License.
// See LICENSE for details.

//! # Lisk Wallet CLI
//!
//! Entry point for the `lisk-wallet` binary. Parses arguments, initializes
//! logging, builds the wallet for the configured signing backend and runs
//! one request.
//!
//! Exit codes follow the error category of a failed request:
//!
//! - `0`: success
//! - `1`: usage or I/O problem outside a wallet request
//! - `2`: validation (bad input, wrong passphrase, unsupported mode)
//! - `3`: hardware device
//! - `4`: network peer

mod cli;
mod logging;

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use zeroize::Zeroizing;

use lisk_wallet_protocol::config::NetworkParams;
use lisk_wallet_protocol::crypto::{
    Address, KeyError, LiskKeypair, LiskPublicKey, MessageError, SignedMessage,
};
use lisk_wallet_protocol::ledger::{
    ConfirmationPrompt, DerivationPath, HardwareSigner, RelayTransportFactory,
};
use lisk_wallet_protocol::transaction::{parse_lsk, AmountError};
use lisk_wallet_protocol::{
    Account, Credentials, ErrorCategory, HttpPeer, SigningDispatcher, SigningMode, Wallet,
    WalletError,
};

use cli::{Commands, GlobalArgs, Network, WalletCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = WalletCli::parse();
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&cli.global.log_format),
    );

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<WalletError>().map(WalletError::category) {
        Some(ErrorCategory::Validation) => 2,
        Some(ErrorCategory::Device) => 3,
        Some(ErrorCategory::Network) => 4,
        None if is_input_error(err) => 2,
        None => 1,
    }
}

fn is_input_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<KeyError>().is_some()
        || err.downcast_ref::<AmountError>().is_some()
        || err.downcast_ref::<MessageError>().is_some()
}

async fn run(cli: WalletCli) -> Result<()> {
    let mut global = cli.global;
    let secrets = Secrets::take(&mut global);
    match cli.command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Address => {
            let keypair = LiskKeypair::from_passphrase(secrets.required_passphrase()?);
            print_account(&keypair.public_key(), &keypair.address());
            Ok(())
        }
        Commands::LedgerAddress => {
            let signer = hardware_signer(&global);
            let (public_key, address) = signer
                .public_key()
                .await
                .map_err(WalletError::from)
                .context("could not read the device account")?;
            print_account(&public_key, &address);
            Ok(())
        }
        Commands::VerifyMessage(args) => {
            let block = match args.file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            let signed = SignedMessage::parse_printable(&block)?;
            signed.verify()?;
            println!("Signature is valid for {}", signed.public_key.to_address());
            Ok(())
        }
        command => run_request(&global, secrets, command).await,
    }
}

/// Subcommands that go through the wallet pipeline.
async fn run_request(global: &GlobalArgs, secrets: Secrets, command: Commands) -> Result<()> {
    let mode: SigningMode = global
        .signing_mode
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let hardware = hardware_signer(global);
    let account = resolve_account(global, &secrets, mode, &hardware).await?;
    let credentials = secrets.into_credentials();

    let params = match global.network {
        Network::Mainnet => NetworkParams::mainnet(),
        Network::Testnet => NetworkParams::testnet(),
    };
    let peer = HttpPeer::new(&global.peer_url, params)?;
    let wallet = Wallet::new(SigningDispatcher::new(hardware), Arc::new(peer)).with_observer(
        Arc::new(|prompt: &ConfirmationPrompt| {
            eprintln!("Look at your device for confirmation ({})", prompt.path);
        }),
    );

    tracing::info!(address = %account.address, mode = %mode, "wallet ready");

    match command {
        Commands::Send(args) => {
            let recipient: Address = args.to.parse()?;
            let amount = parse_lsk(&args.amount)?;
            let receipt = wallet
                .request_send(&account, recipient, amount, credentials)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::RegisterDelegate(args) => {
            let receipt = wallet
                .request_delegate_registration(&account, &args.username, credentials)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::Vote(args) => {
            if args.add.is_empty() && args.remove.is_empty() {
                bail!("nothing to vote: pass --add and/or --remove");
            }
            let voted = parse_keys(&args.add)?;
            let unvoted = parse_keys(&args.remove)?;
            let receipt = wallet
                .request_vote(&account, &voted, &unvoted, credentials)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::SecondPassphrase(args) => {
            let second = Zeroizing::new(args.new_second_passphrase);
            let receipt = wallet
                .request_second_passphrase_registration(&account, second, credentials)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::SignMessage(args) => {
            let signed = wallet
                .sign_message(&account, &args.message, credentials)
                .await?;
            println!("{}", signed.to_printable());
        }
        other => bail!("{other:?} is not a wallet request"),
    }
    Ok(())
}

fn hardware_signer(global: &GlobalArgs) -> HardwareSigner {
    let factory = RelayTransportFactory::new(
        global.ledger_relay.clone(),
        Duration::from_secs(global.ledger_timeout_secs),
    );
    HardwareSigner::new(Arc::new(factory), DerivationPath::new(global.ledger_account))
}

/// Builds the public account for the configured mode.
async fn resolve_account(
    global: &GlobalArgs,
    secrets: &Secrets,
    mode: SigningMode,
    hardware: &HardwareSigner,
) -> Result<Account> {
    let mut account = match mode {
        SigningMode::Passphrase => Account::from_passphrase(secrets.required_passphrase()?),
        SigningMode::HardwareDevice => {
            let (public_key, _) = hardware
                .public_key()
                .await
                .map_err(WalletError::from)
                .context("could not read the device account")?;
            Account::new(public_key, mode)
        }
        // Any key will do: the dispatcher refuses before touching it.
        SigningMode::UnsupportedDevice => {
            Account::new(LiskKeypair::generate().public_key(), mode)
        }
    };

    let second_key = match (&global.second_public_key, secrets.second_passphrase()) {
        (Some(hex), _) => Some(LiskPublicKey::from_hex(hex).context("invalid --second-public-key")?),
        (None, Some(second)) => Some(LiskKeypair::from_passphrase(second).public_key()),
        (None, None) => None,
    };
    if let Some(key) = second_key {
        account = account.with_second_public_key(key);
    }
    Ok(account)
}

/// Passphrases moved out of the parsed arguments. Cleared on drop.
struct Secrets {
    passphrase: Option<Zeroizing<String>>,
    second_passphrase: Option<Zeroizing<String>>,
}

impl Secrets {
    /// Leaves `None` behind in `global`.
    fn take(global: &mut GlobalArgs) -> Self {
        Self {
            passphrase: global.passphrase.take().map(Zeroizing::new),
            second_passphrase: global.second_passphrase.take().map(Zeroizing::new),
        }
    }

    fn required_passphrase(&self) -> Result<&str> {
        self.passphrase
            .as_deref()
            .map(String::as_str)
            .ok_or_else(|| anyhow!(WalletError::InvalidPassphrase))
            .context("a passphrase is required (--passphrase or LISK_PASSPHRASE)")
    }

    fn second_passphrase(&self) -> Option<&str> {
        self.second_passphrase.as_deref().map(String::as_str)
    }

    fn into_credentials(self) -> Credentials {
        Credentials::from_secrets(self.passphrase, self.second_passphrase)
    }
}

fn parse_keys(keys: &[String]) -> Result<Vec<LiskPublicKey>> {
    keys.iter()
        .map(|k| LiskPublicKey::from_hex(k).with_context(|| format!("invalid public key {k:?}")))
        .collect()
}

fn print_account(public_key: &LiskPublicKey, address: &Address) {
    println!("Public key : {public_key}");
    println!("Address    : {address}");
}

/// Prints version information to stdout.
fn print_version() {
    println!("lisk-wallet {}", env!("CARGO_PKG_VERSION"));
    println!(
        "peer api    {}",
        lisk_wallet_protocol::config::PEER_API_VERSION
    );
}
