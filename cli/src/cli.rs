//! # CLI Interface
//!
//! Command-line structure for `lisk-wallet`, via `clap` derive. Global
//! options pick the peer, network and signing backend; every option that
//! carries a secret can come from the environment instead of argv.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lisk_wallet_protocol::config::DEFAULT_DEVICE_TIMEOUT_SECS;

/// Lisk wallet.
///
/// Builds, signs and broadcasts Lisk transactions using a passphrase or a
/// hardware device.
#[derive(Parser, Debug)]
#[command(
    name = "lisk-wallet",
    about = "Lisk wallet: send, vote, register and sign",
    version,
    propagate_version = true
)]
pub struct WalletCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Base URL of the peer to broadcast to.
    #[arg(long, global = true, env = "LISK_PEER_URL", default_value = "https://hub21.lisk.io")]
    pub peer_url: String,

    /// Network whose nethash is announced to the peer.
    #[arg(long, global = true, env = "LISK_NETWORK", value_enum, default_value_t = Network::Mainnet)]
    pub network: Network,

    /// How the account signs: passphrase, ledger or trezor.
    #[arg(long, global = true, env = "LISK_SIGNING_MODE", default_value = "passphrase")]
    pub signing_mode: String,

    /// Account passphrase (passphrase mode).
    #[arg(long, global = true, env = "LISK_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Second passphrase, for accounts with a registered second signature.
    #[arg(long, global = true, env = "LISK_SECOND_PASSPHRASE", hide_env_values = true)]
    pub second_passphrase: Option<String>,

    /// Registered second public key (hex). Derived from the second
    /// passphrase when omitted.
    #[arg(long, global = true)]
    pub second_public_key: Option<String>,

    /// host:port of a TCP APDU relay reaching the hardware device.
    #[arg(long, global = true, env = "LISK_LEDGER_RELAY")]
    pub ledger_relay: Option<String>,

    /// Seconds to wait for the device, including user confirmation.
    #[arg(long, global = true, env = "LISK_LEDGER_TIMEOUT_SECS", default_value_t = DEFAULT_DEVICE_TIMEOUT_SECS)]
    pub ledger_timeout_secs: u64,

    /// Device account index in 44'/134'/<index>'.
    #[arg(long, global = true, default_value_t = 0)]
    pub ledger_account: u32,

    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "LISK_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send LSK to an address.
    Send(SendArgs),
    /// Register the account as a delegate.
    RegisterDelegate(RegisterDelegateArgs),
    /// Vote for and/or unvote delegates.
    Vote(VoteArgs),
    /// Register a second passphrase on the account.
    SecondPassphrase(SecondPassphraseArgs),
    /// Sign a message and print the signed-message block.
    SignMessage(SignMessageArgs),
    /// Verify a signed-message block.
    VerifyMessage(VerifyMessageArgs),
    /// Print the public key and address for the passphrase.
    Address,
    /// Print the public key and address held by the hardware device.
    LedgerAddress,
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Recipient address, e.g. 1859190791819301L.
    #[arg(long)]
    pub to: String,

    /// Amount in LSK, e.g. 1.5.
    #[arg(long)]
    pub amount: String,
}

#[derive(Args, Debug)]
pub struct RegisterDelegateArgs {
    #[arg(long)]
    pub username: String,
}

#[derive(Args, Debug)]
pub struct VoteArgs {
    /// Delegate public keys to vote for, in order.
    #[arg(long = "add", value_delimiter = ',')]
    pub add: Vec<String>,

    /// Delegate public keys to unvote, in order.
    #[arg(long = "remove", value_delimiter = ',')]
    pub remove: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SecondPassphraseArgs {
    /// The new second passphrase.
    #[arg(long, env = "LISK_NEW_SECOND_PASSPHRASE", hide_env_values = true)]
    pub new_second_passphrase: String,
}

#[derive(Args, Debug)]
pub struct SignMessageArgs {
    #[arg(long)]
    pub message: String,
}

#[derive(Args, Debug)]
pub struct VerifyMessageArgs {
    /// File holding the signed-message block. Reads stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        WalletCli::command().debug_assert();
    }

    #[test]
    fn parses_send_with_globals_after_subcommand() {
        let cli = WalletCli::try_parse_from([
            "lisk-wallet",
            "send",
            "--to",
            "1859190791819301L",
            "--amount",
            "1.5",
            "--network",
            "testnet",
        ])
        .unwrap();
        assert_eq!(cli.global.network, Network::Testnet);
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.to, "1859190791819301L");
                assert_eq!(args.amount, "1.5");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn vote_lists_accept_commas() {
        let cli = WalletCli::try_parse_from([
            "lisk-wallet",
            "vote",
            "--add",
            "aa,bb",
            "--remove",
            "cc",
        ])
        .unwrap();
        match cli.command {
            Commands::Vote(args) => {
                assert_eq!(args.add, vec!["aa", "bb"]);
                assert_eq!(args.remove, vec!["cc"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
