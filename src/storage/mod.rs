//! Storage module for wallet persistence

pub mod persistence;

pub use persistence::{LoadOutcome, StorageError, WalletStore};
