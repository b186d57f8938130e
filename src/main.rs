//! Ledger-Wallet CLI Application
//!
//! A command-line interface over one wallet file: initialize an
//! identity, inspect state, queue transfers, and export the record.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ledger_wallet::storage::{LoadOutcome, WalletStore};
use ledger_wallet::wallet::{TransferPolicy, Wallet, WalletConfig, DEFAULT_PRECISION};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "wallet")]
#[command(version = "0.1.0")]
#[command(about = "Ledger wallet: keys, signed operations, persistence", long_about = None)]
struct Cli {
    /// Wallet file path
    #[arg(short, long, default_value = "wallet.json")]
    wallet_file: PathBuf,

    /// Smallest units per whole token (display only)
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the wallet identity and queue its registration
    Init,

    /// Show the public wallet summary
    Info,

    /// Queue a signed value transfer
    Send {
        /// Recipient address
        to: String,

        /// Amount in smallest units
        amount: u64,

        /// Activation timestamp (Unix milliseconds, UTC); defaults to now
        #[arg(long)]
        activates_at: Option<i64>,

        /// Skip the registration and balance checks (system-issued value)
        #[arg(long)]
        privileged: bool,
    },

    /// List pending operations in creation order
    Pending,

    /// Acknowledge operations from the front of the queue
    Ack {
        /// Number of operations to remove
        #[arg(default_value = "1")]
        count: usize,
    },

    /// Address book operations
    Book {
        #[command(subcommand)]
        action: BookCommands,
    },

    /// Print the full wallet record, private key included
    Export,
}

#[derive(Subcommand)]
enum BookCommands {
    /// Save an address under a label
    Add { label: String, address: String },
    /// Look up an address by its label
    Get { label: String },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let store = WalletStore::with_config(
        &cli.wallet_file,
        WalletConfig {
            precision: cli.precision,
        },
    );
    let (mut wallet, outcome) = store.load_or_default();
    if outcome == LoadOutcome::Corrupted {
        eprintln!(
            "Warning: wallet file {} is corrupt, starting empty",
            cli.wallet_file.display()
        );
    }

    if let Err(err) = run(cli.command, &mut wallet, &store) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(
    command: Commands,
    wallet: &mut Wallet,
    store: &WalletStore,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Init => {
            wallet.initialize()?;
            store.save(wallet)?;
            println!("Wallet address: {}", wallet.address());
        }

        Commands::Info => {
            let summary = wallet.summary();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Send {
            to,
            amount,
            activates_at,
            privileged,
        } => {
            let activates_at = match activates_at {
                Some(millis) => Some(
                    DateTime::<Utc>::from_timestamp_millis(millis)
                        .ok_or("invalid activation timestamp")?,
                ),
                None => None,
            };
            let policy = if privileged {
                TransferPolicy::Privileged
            } else {
                TransferPolicy::Standard
            };

            let transfer = wallet.create_transfer(&to, amount, activates_at, policy)?;
            store.save(wallet)?;
            println!("{}", serde_json::to_string_pretty(&transfer)?);
        }

        Commands::Pending => {
            println!("{}", serde_json::to_string_pretty(wallet.pending_operations())?);
        }

        Commands::Ack { count } => {
            let removed = wallet.acknowledge(count);
            store.save(wallet)?;
            println!("Acknowledged {} operation(s)", removed.len());
        }

        Commands::Book { action } => match action {
            BookCommands::Add { label, address } => {
                wallet.add_address_book_entry(&label, &address);
                store.save(wallet)?;
                println!("Saved {} -> {}", label, address);
            }
            BookCommands::Get { label } => match wallet.lookup_address_book(&label) {
                Some(address) => println!("{}", address),
                None => {
                    eprintln!("No address saved under '{}'", label);
                    process::exit(1);
                }
            },
        },

        Commands::Export => {
            // Privileged surface: includes the private key.
            println!("{}", serde_json::to_string_pretty(&wallet.export_record())?);
        }
    }

    Ok(())
}
