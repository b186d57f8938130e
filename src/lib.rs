//! Ledger-Wallet: the wallet core of a ledger node
//!
//! This crate manages a single cryptographic account inside a larger
//! ledger, featuring:
//! - ECDSA key management (secp256k1) with SHA-256 address derivation
//! - Signed ledger operations (registration and value transfers)
//! - A wallet state machine enforcing registration-before-spend and
//!   balance checks, with a privileged bypass for system-issued value
//! - A FIFO queue of pending signed operations awaiting the ledger
//! - JSON persistence with atomic writes and parse-or-default loads
//!
//! # Example
//!
//! ```rust
//! use ledger_wallet::wallet::{TransferPolicy, Wallet};
//!
//! // Create and initialize a wallet: this generates an identity and
//! // queues a signed registration operation for the ledger.
//! let mut wallet = Wallet::new();
//! wallet.initialize().unwrap();
//! println!("Address: {}", wallet.address());
//!
//! // The ledger confirms registration and reports a balance.
//! wallet.set_registration_block(42);
//! wallet.record_balance(1_000_000);
//!
//! // Spend: validated, signed, and queued.
//! let transfer = wallet
//!     .create_transfer("recipient-address", 250_000, None, TransferPolicy::Standard)
//!     .unwrap();
//! println!("Queued transfer of {} to {}", transfer.amount, transfer.to);
//! ```

pub mod crypto;
pub mod operations;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use crypto::{KeyError, KeyPair};
pub use operations::{
    verify_operation, Operation, OperationError, OperationSignature, RegistrationOp, Signable,
    TransferOp,
};
pub use storage::{LoadOutcome, StorageError, WalletStore};
pub use wallet::{
    TransferPolicy, Wallet, WalletConfig, WalletError, WalletRecord, WalletSummary,
};
