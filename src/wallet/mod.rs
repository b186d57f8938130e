//! Wallet state machine and display formatting

pub mod format;
pub mod wallet;

pub use format::format_amount;
pub use wallet::{
    KeysPairRecord, TransferPolicy, Wallet, WalletConfig, WalletError, WalletRecord,
    WalletSummary, DEFAULT_PRECISION,
};
