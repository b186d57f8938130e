//! Wallet persistence layer
//!
//! Saves and loads the wallet record as one JSON object. Writes are
//! all-or-nothing: the record lands in a temp file first and is renamed
//! over the previous copy, so a failed save never mutates the on-disk
//! state. Loads are parse-or-default: a missing or corrupt file yields
//! an empty unregistered wallet, surfaced through [`LoadOutcome`].

use crate::wallet::{Wallet, WalletConfig, WalletError, WalletRecord};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] WalletError),
    #[error("Wallet file not found: {0}")]
    NotFound(PathBuf),
}

/// How a wallet came back from [`WalletStore::load_or_default`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The stored record parsed and the wallet was restored from it
    Restored,
    /// No wallet file existed; this is a fresh, empty wallet
    Fresh,
    /// The file existed but could not be used; fell back to an empty
    /// wallet without touching the broken file
    Corrupted,
}

/// Wallet storage manager bound to one wallet file
pub struct WalletStore {
    path: PathBuf,
    config: WalletConfig,
}

impl WalletStore {
    /// Create a store for the given wallet file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, WalletConfig::default())
    }

    /// Create a store with an explicit wallet configuration
    pub fn with_config(path: impl Into<PathBuf>, config: WalletConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// The wallet file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a saved wallet exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Save the wallet record to disk (full-record overwrite)
    pub fn save(&self, wallet: &Wallet) -> Result<(), StorageError> {
        let record = wallet.export_record();

        // Write to a temporary file first, then rename atomically
        let temp_path = self.path.with_extension("tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &record)?;

        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    /// Load the wallet from disk, failing on a missing or corrupt file
    pub fn load(&self) -> Result<Wallet, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::NotFound(self.path.clone()));
        }

        let file = fs::File::open(&self.path)?;
        let reader = BufReader::new(file);
        let record: WalletRecord = serde_json::from_reader(reader)?;

        Ok(Wallet::from_record(record, self.config.clone())?)
    }

    /// Load the wallet, defaulting to an empty one on any failure
    ///
    /// A corrupt file is never fatal: the error is logged and the
    /// caller gets a fresh wallet plus the outcome telling the two
    /// cases apart. Callers should run `initialize()` on anything that
    /// is not `Restored`.
    pub fn load_or_default(&self) -> (Wallet, LoadOutcome) {
        if !self.path.exists() {
            return (Wallet::with_config(self.config.clone()), LoadOutcome::Fresh);
        }

        match self.load() {
            Ok(wallet) => (wallet, LoadOutcome::Restored),
            Err(err) => {
                log::error!("Invalid wallet file {}: {}", self.path.display(), err);
                (
                    Wallet::with_config(self.config.clone()),
                    LoadOutcome::Corrupted,
                )
            }
        }
    }

    /// Delete the saved wallet file
    pub fn delete(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
