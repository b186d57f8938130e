//! Wallet state machine
//!
//! Aggregates the wallet identity, cached balance, registration status,
//! address book, and the FIFO queue of pending signed operations, and
//! enforces the lifecycle invariants: registration before spending,
//! balance-vs-spend consistency, and idempotent signing.
//!
//! A wallet moves through three states: Unregistered (no identity, or no
//! registration block yet), PendingRegistration (a signed registration
//! operation is queued), and Registered (the ledger has reported the
//! block number the wallet was defined in).

use crate::crypto::{KeyError, KeyPair};
use crate::operations::{
    Operation, OperationError, OperationSignature, RegistrationOp, Signable, TransferOp,
};
use crate::wallet::format::format_amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Default smallest-units-per-token divisor
pub const DEFAULT_PRECISION: u64 = 1_000_000;

// =============================================================================
// Error Types
// =============================================================================

/// Wallet-related errors
///
/// `create_transfer` failures come back as these variants so a frontend
/// can map them straight to a user-facing reason code.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet is not registered on the ledger")]
    Unregistered,
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Wallet has no identity; initialize it first")]
    MissingIdentity,
    #[error("Invalid operation: {0}")]
    InvalidOperation(#[from] OperationError),
    #[error("Key error: {0}")]
    KeyError(#[from] KeyError),
}

// =============================================================================
// Configuration
// =============================================================================

/// Wallet configuration
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Smallest units per whole token, used for display formatting
    pub precision: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

// =============================================================================
// Transfer Policy
// =============================================================================

/// How strictly a transfer is checked before it is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPolicy {
    /// Enforce registration and the cached-balance check
    Standard,
    /// Skip both guards for system-issued value (rewards, genesis
    /// grants). The transfer is still fully signed.
    Privileged,
}

impl TransferPolicy {
    /// Whether this policy bypasses the registration and balance guards
    pub fn is_privileged(&self) -> bool {
        matches!(self, TransferPolicy::Privileged)
    }
}

// =============================================================================
// Wallet
// =============================================================================

/// A ledger wallet: one identity, one cached balance, one pending queue
pub struct Wallet {
    /// The signing key pair; absent until `initialize` or a record load
    key_pair: Option<KeyPair>,
    /// Address derived from the public key; empty without an identity
    address: String,
    /// Block number assigned by the ledger once registration is accepted
    registration_block: Option<u64>,
    /// Cached balance in smallest units; the ledger is authoritative
    balance: u64,
    /// Free-form caller data carried with the wallet record
    data: serde_json::Value,
    /// Saved addresses, label -> address
    address_book: HashMap<String, String>,
    /// Signed operations awaiting ledger submission, in creation order
    pending: Vec<Operation>,
    /// Whether the ledger has accepted the wallet
    accepted: bool,
    /// Display precision divisor
    precision: u64,
}

impl Wallet {
    /// Create an empty, identity-less wallet with default configuration
    pub fn new() -> Self {
        Self::with_config(WalletConfig::default())
    }

    /// Create an empty wallet with the given configuration
    pub fn with_config(config: WalletConfig) -> Self {
        Self {
            key_pair: None,
            address: String::new(),
            registration_block: None,
            balance: 0,
            data: serde_json::Value::Object(serde_json::Map::new()),
            address_book: HashMap::new(),
            pending: Vec::new(),
            accepted: false,
            precision: config.precision,
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Initialize the wallet identity if it does not exist yet
    ///
    /// Generates a fresh key pair, derives the address, and queues a
    /// signed registration operation. Idempotent: a wallet that already
    /// has an address is returned untouched — regenerating keys would
    /// orphan a ledger-recognized address.
    pub fn initialize(&mut self) -> Result<(), WalletError> {
        if !self.address.is_empty() {
            return Ok(());
        }

        let key_pair = KeyPair::generate();
        self.address = key_pair.address();
        self.key_pair = Some(key_pair);
        log::info!("Generated new wallet identity: {}", self.address);

        let mut registration = RegistrationOp::new(self.address.clone())?;
        self.sign_operation(&mut registration)?;
        self.pending.push(Operation::Registration(registration));

        Ok(())
    }

    /// Whether the wallet holds signing key material
    pub fn has_identity(&self) -> bool {
        self.key_pair.is_some()
    }

    /// The wallet address (empty until initialized or loaded)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Hex-encoded public key, if an identity exists
    pub fn public_key_hex(&self) -> Option<String> {
        self.key_pair.as_ref().map(|kp| kp.public_key_hex())
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Record the block number the ledger assigned to this wallet
    ///
    /// Non-positive block numbers are ignored, so a malformed ledger
    /// notification cannot corrupt state. The block is set exactly once;
    /// a duplicate notification is ignored with a warning.
    pub fn set_registration_block(&mut self, block: i64) {
        if block <= 0 {
            log::debug!("Ignoring non-positive registration block {}", block);
            return;
        }

        if let Some(existing) = self.registration_block {
            log::warn!(
                "Registration block already set to {}, ignoring {}",
                existing,
                block
            );
            return;
        }

        self.registration_block = Some(block as u64);
        self.accepted = true;
        log::info!("Wallet registered in block {}", block);
    }

    /// The block number the wallet was registered in, if any
    pub fn registration_block(&self) -> Option<u64> {
        self.registration_block
    }

    /// Whether the ledger has confirmed the wallet registration
    pub fn is_registered(&self) -> bool {
        self.registration_block.is_some()
    }

    /// Whether the ledger has accepted the wallet
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Render the wallet address for display
    ///
    /// A short `BL_<block>` alias is only available once registered: it
    /// trades the globally-unique hash for the ledger-local block
    /// number. Registered full addresses carry a `_<block>` suffix.
    pub fn display_address(&self, prefer_short: bool) -> String {
        match self.registration_block {
            Some(block) if prefer_short => format!("BL_{}", block),
            Some(block) => format!("{}_{}", self.address, block),
            None => self.address.clone(),
        }
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Cached balance in smallest units
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Overwrite the cached balance with the ledger-reported value
    ///
    /// No reconciliation against the pending queue happens here: queued
    /// operations are "sent, not yet confirmed" and the ledger stays
    /// authoritative for funds.
    pub fn record_balance(&mut self, new_balance: u64) {
        self.balance = new_balance;
        log::info!("Wallet balance: {}", self.format_balance());
    }

    /// The cached balance rendered with the configured precision
    pub fn format_balance(&self) -> String {
        format_amount(self.balance, self.precision)
    }

    /// The configured display precision divisor
    pub fn precision(&self) -> u64 {
        self.precision
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Sign an operation with the wallet identity
    ///
    /// Idempotent: an already-signed operation is left untouched, so a
    /// double sign can neither mutate the payload nor re-key the
    /// operation.
    pub fn sign_operation<S: Signable>(&self, op: &mut S) -> Result<(), WalletError> {
        if op.is_signed() {
            return Ok(());
        }

        let key_pair = self.key_pair.as_ref().ok_or(WalletError::MissingIdentity)?;
        let signature = key_pair.sign(&op.payload())?;
        op.set_signature(OperationSignature {
            signature: hex::encode(signature),
            public_key: key_pair.public_key_hex(),
        });

        Ok(())
    }

    /// Sign an opaque payload with the wallet key, returning the hex signature
    pub fn sign_payload(&self, payload: &[u8]) -> Result<String, WalletError> {
        let key_pair = self.key_pair.as_ref().ok_or(WalletError::MissingIdentity)?;
        Ok(hex::encode(key_pair.sign(payload)?))
    }

    /// Verify a hex signature over a payload against the wallet's own key
    pub fn verify_payload(&self, payload: &[u8], signature_hex: &str) -> Result<bool, WalletError> {
        let key_pair = self.key_pair.as_ref().ok_or(WalletError::MissingIdentity)?;
        let signature = hex::decode(signature_hex).map_err(|_| KeyError::InvalidSignature)?;
        Ok(key_pair.verify(payload, &signature)?)
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Build, sign, and queue a value transfer
    ///
    /// Under [`TransferPolicy::Standard`] the wallet must be registered
    /// and the cached balance must cover the amount.
    /// [`TransferPolicy::Privileged`] skips both guards for
    /// system-issued value; the operation is still fully signed, so an
    /// identity is required either way.
    ///
    /// `activates_at` defaults to the creation time; a future timestamp
    /// defers when the ledger treats the transfer as executable.
    pub fn create_transfer(
        &mut self,
        to: &str,
        amount: u64,
        activates_at: Option<DateTime<Utc>>,
        policy: TransferPolicy,
    ) -> Result<TransferOp, WalletError> {
        if !policy.is_privileged() {
            if !self.is_registered() {
                return Err(WalletError::Unregistered);
            }
            if amount > self.balance {
                return Err(WalletError::InsufficientFunds {
                    have: self.balance,
                    need: amount,
                });
            }
        }

        let created_at = Utc::now();
        let activates_at = activates_at.unwrap_or(created_at);

        let mut transfer = TransferOp::new(self.address.clone(), to, amount, created_at, activates_at)?;
        self.sign_operation(&mut transfer)?;
        self.pending.push(Operation::Transfer(transfer.clone()));

        log::info!(
            "Queued transfer of {} to {}",
            format_amount(amount, self.precision),
            to
        );

        Ok(transfer)
    }

    // =========================================================================
    // Pending Queue
    // =========================================================================

    /// Signed operations awaiting ledger submission, in creation order
    pub fn pending_operations(&self) -> &[Operation] {
        &self.pending
    }

    /// Remove up to `count` operations from the front of the queue
    ///
    /// Acknowledgement is strictly FIFO: an operation can only be
    /// confirmed after every predecessor, so the removed operations are
    /// returned in their original order.
    pub fn acknowledge(&mut self, count: usize) -> Vec<Operation> {
        let count = count.min(self.pending.len());
        self.pending.drain(..count).collect()
    }

    // =========================================================================
    // Address Book
    // =========================================================================

    /// Save an address under a label, returning any address it replaced
    pub fn add_address_book_entry(
        &mut self,
        label: impl Into<String>,
        address: impl Into<String>,
    ) -> Option<String> {
        self.address_book.insert(label.into(), address.into())
    }

    /// Look up a saved address by its label
    pub fn lookup_address_book(&self, label: &str) -> Option<&str> {
        self.address_book.get(label).map(|s| s.as_str())
    }

    /// The full address book
    pub fn address_book(&self) -> &HashMap<String, String> {
        &self.address_book
    }

    // =========================================================================
    // Caller Data
    // =========================================================================

    /// Free-form caller data carried with the wallet record
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// Replace the free-form caller data
    pub fn set_data(&mut self, data: serde_json::Value) {
        self.data = data;
    }

    // =========================================================================
    // Snapshots & Records
    // =========================================================================

    /// Public wallet snapshot, safe to hand to any caller
    pub fn summary(&self) -> WalletSummary {
        WalletSummary {
            address: self.display_address(false),
            short_address: self.display_address(true),
            balance: self.balance,
            formatted_balance: self.format_balance(),
            registration_block: self.registration_block,
            accepted: self.accepted,
            pending_operations: self.pending.len(),
        }
    }

    /// Full wallet record, private key included
    ///
    /// This is the one privileged surface that exposes secret material;
    /// callers own keeping the result out of unprivileged hands.
    pub fn export_record(&self) -> WalletRecord {
        WalletRecord {
            id: self.address.clone(),
            block: self
                .registration_block
                .map(|b| b as i64)
                .unwrap_or(-1),
            keys_pair: KeysPairRecord {
                public: self.public_key_hex().unwrap_or_default(),
                private: self
                    .key_pair
                    .as_ref()
                    .map(|kp| kp.private_key_hex())
                    .unwrap_or_default(),
            },
            data: self.data.clone(),
            balance: self.balance,
            address_book: self.address_book.clone(),
            accepted: self.accepted,
        }
    }

    /// Rebuild a wallet from a persisted record
    ///
    /// The address is recomputed from the stored key material rather
    /// than trusted from the record; a mismatching stored id is logged.
    /// The pending queue is not part of the record and starts empty.
    pub fn from_record(record: WalletRecord, config: WalletConfig) -> Result<Self, WalletError> {
        let key_pair = if record.keys_pair.private.is_empty() {
            None
        } else {
            Some(KeyPair::from_private_key_hex(&record.keys_pair.private)?)
        };

        let address = match &key_pair {
            Some(kp) => {
                let derived = kp.address();
                if !record.id.is_empty() && record.id != derived {
                    log::warn!(
                        "Stored wallet id {} does not match derived address {}",
                        record.id,
                        derived
                    );
                }
                derived
            }
            None => record.id,
        };

        Ok(Self {
            key_pair,
            address,
            registration_block: (record.block > 0).then(|| record.block as u64),
            balance: record.balance,
            data: record.data,
            address_book: record.address_book,
            pending: Vec::new(),
            accepted: record.accepted,
            precision: config.precision,
        })
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Snapshot & Record Types
// =============================================================================

/// Public wallet information (never includes key material)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummary {
    pub address: String,
    pub short_address: String,
    pub balance: u64,
    pub formatted_balance: String,
    pub registration_block: Option<u64>,
    pub accepted: bool,
    pub pending_operations: usize,
}

/// Stored key pair, hex-encoded
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeysPairRecord {
    pub public: String,
    pub private: String,
}

/// The persisted wallet record
///
/// Field names match the on-disk format: `block` is `-1` while the
/// wallet is unregistered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: String,
    pub block: i64,
    #[serde(rename = "keysPair")]
    pub keys_pair: KeysPairRecord,
    #[serde(default)]
    pub data: serde_json::Value,
    pub balance: u64,
    #[serde(rename = "addressBook", default)]
    pub address_book: HashMap<String, String>,
    #[serde(default)]
    pub accepted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::verify_operation;

    fn registered_wallet(balance: u64) -> Wallet {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();
        wallet.set_registration_block(7);
        wallet.record_balance(balance);
        wallet
    }

    #[test]
    fn test_initialize_queues_signed_registration() {
        let mut wallet = Wallet::new();
        assert!(!wallet.has_identity());

        wallet.initialize().unwrap();
        assert!(wallet.has_identity());
        assert!(!wallet.address().is_empty());
        assert_eq!(wallet.pending_operations().len(), 1);

        let op = &wallet.pending_operations()[0];
        assert!(op.is_signed());
        assert!(matches!(op, Operation::Registration(r) if r.address == wallet.address()));
        assert!(verify_operation(op).unwrap());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();
        let address = wallet.address().to_string();

        wallet.initialize().unwrap();
        assert_eq!(wallet.address(), address);
        assert_eq!(wallet.pending_operations().len(), 1);
    }

    #[test]
    fn test_set_registration_block_guards() {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();

        wallet.set_registration_block(0);
        assert!(!wallet.is_registered());
        wallet.set_registration_block(-5);
        assert!(!wallet.is_registered());

        wallet.set_registration_block(42);
        assert_eq!(wallet.registration_block(), Some(42));
        assert!(wallet.is_accepted());

        // set exactly once: a duplicate notification is ignored
        wallet.set_registration_block(99);
        assert_eq!(wallet.registration_block(), Some(42));
    }

    #[test]
    fn test_display_address() {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();
        let address = wallet.address().to_string();

        assert_eq!(wallet.display_address(true), address);
        assert_eq!(wallet.display_address(false), address);

        wallet.set_registration_block(42);
        assert_eq!(wallet.display_address(true), "BL_42");
        assert_eq!(wallet.display_address(false), format!("{}_42", address));
    }

    #[test]
    fn test_transfer_requires_registration() {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();

        let result = wallet.create_transfer("recipient", 50, None, TransferPolicy::Standard);
        assert!(matches!(result, Err(WalletError::Unregistered)));
        assert_eq!(wallet.pending_operations().len(), 1);
    }

    #[test]
    fn test_privileged_transfer_bypasses_guards() {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();
        // unregistered, zero balance

        let transfer = wallet
            .create_transfer("recipient", 50, None, TransferPolicy::Privileged)
            .unwrap();
        assert!(transfer.is_signed());
        assert!(verify_operation(&transfer).unwrap());
        assert_eq!(wallet.pending_operations().len(), 2);
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let mut wallet = registered_wallet(10);

        let result = wallet.create_transfer("recipient", 50, None, TransferPolicy::Standard);
        match result {
            Err(WalletError::InsufficientFunds { have, need }) => {
                assert_eq!(have, 10);
                assert_eq!(need, 50);
            }
            other => panic!("expected InsufficientFunds, got {:?}", other.map(|_| ())),
        }
        assert_eq!(wallet.pending_operations().len(), 1);
    }

    #[test]
    fn test_transfer_appends_exactly_one() {
        let mut wallet = registered_wallet(100);
        let before: Vec<Operation> = wallet.pending_operations().to_vec();

        let transfer = wallet
            .create_transfer("recipient", 50, None, TransferPolicy::Standard)
            .unwrap();

        let pending = wallet.pending_operations();
        assert_eq!(pending.len(), before.len() + 1);
        assert_eq!(&pending[..before.len()], &before[..]);
        assert_eq!(pending.last(), Some(&Operation::Transfer(transfer.clone())));
        assert_eq!(transfer.from, wallet.address());
        assert_eq!(transfer.to, "recipient");
    }

    #[test]
    fn test_transfer_activation_defaults_to_creation() {
        let mut wallet = registered_wallet(100);

        let transfer = wallet
            .create_transfer("recipient", 50, None, TransferPolicy::Standard)
            .unwrap();
        assert_eq!(transfer.activates_at, transfer.created_at);

        let later = Utc::now() + chrono::Duration::hours(1);
        let deferred = wallet
            .create_transfer("recipient", 25, Some(later), TransferPolicy::Standard)
            .unwrap();
        assert_eq!(deferred.activates_at, later);
        assert!(deferred.activates_at > deferred.created_at);
    }

    #[test]
    fn test_transfer_rejects_invalid_fields() {
        let mut wallet = registered_wallet(100);

        assert!(matches!(
            wallet.create_transfer("", 50, None, TransferPolicy::Standard),
            Err(WalletError::InvalidOperation(OperationError::EmptyRecipient))
        ));
        assert!(matches!(
            wallet.create_transfer("recipient", 0, None, TransferPolicy::Standard),
            Err(WalletError::InvalidOperation(OperationError::ZeroAmount))
        ));
        assert_eq!(wallet.pending_operations().len(), 1);
    }

    #[test]
    fn test_signing_is_idempotent() {
        let mut wallet = registered_wallet(100);
        let mut transfer = wallet
            .create_transfer("recipient", 50, None, TransferPolicy::Standard)
            .unwrap();

        let payload = transfer.payload();
        let seal = transfer.signature().unwrap().clone();

        wallet.sign_operation(&mut transfer).unwrap();
        assert_eq!(transfer.payload(), payload);
        assert_eq!(transfer.signature(), Some(&seal));
    }

    #[test]
    fn test_signing_without_identity_fails() {
        let wallet = Wallet::new();
        let mut op = RegistrationOp::new("somebody").unwrap();
        assert!(matches!(
            wallet.sign_operation(&mut op),
            Err(WalletError::MissingIdentity)
        ));
    }

    #[test]
    fn test_sign_and_verify_payload() {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();

        let signature = wallet.sign_payload(b"opaque bytes").unwrap();
        assert!(wallet.verify_payload(b"opaque bytes", &signature).unwrap());
        assert!(!wallet.verify_payload(b"other bytes", &signature).unwrap());
    }

    #[test]
    fn test_acknowledge_is_fifo() {
        let mut wallet = registered_wallet(100);
        wallet
            .create_transfer("first", 10, None, TransferPolicy::Standard)
            .unwrap();
        wallet
            .create_transfer("second", 20, None, TransferPolicy::Standard)
            .unwrap();
        assert_eq!(wallet.pending_operations().len(), 3);

        let removed = wallet.acknowledge(2);
        assert_eq!(removed.len(), 2);
        assert!(matches!(removed[0], Operation::Registration(_)));
        assert!(matches!(&removed[1], Operation::Transfer(t) if t.to == "first"));
        assert!(
            matches!(&wallet.pending_operations()[0], Operation::Transfer(t) if t.to == "second")
        );

        // draining past the end is bounded
        let rest = wallet.acknowledge(10);
        assert_eq!(rest.len(), 1);
        assert!(wallet.pending_operations().is_empty());
    }

    #[test]
    fn test_address_book() {
        let mut wallet = Wallet::new();
        assert!(wallet.add_address_book_entry("alice", "addr1").is_none());
        assert_eq!(wallet.lookup_address_book("alice"), Some("addr1"));
        assert_eq!(wallet.lookup_address_book("bob"), None);

        let replaced = wallet.add_address_book_entry("alice", "addr2");
        assert_eq!(replaced.as_deref(), Some("addr1"));
        assert_eq!(wallet.lookup_address_book("alice"), Some("addr2"));
    }

    #[test]
    fn test_summary_has_no_secrets() {
        let wallet = registered_wallet(1_500_000);
        let summary = wallet.summary();

        assert_eq!(summary.short_address, "BL_7");
        assert_eq!(summary.balance, 1_500_000);
        assert_eq!(summary.formatted_balance, "1.500000");
        assert_eq!(summary.registration_block, Some(7));
        assert_eq!(summary.pending_operations, 1);

        let json = serde_json::to_string(&summary).unwrap();
        let private = wallet.export_record().keys_pair.private;
        assert!(!json.contains(&private));
    }

    #[test]
    fn test_record_round_trip() {
        let mut wallet = registered_wallet(250);
        wallet.add_address_book_entry("alice", "addr1");

        let record = wallet.export_record();
        assert_eq!(record.block, 7);
        assert!(!record.keys_pair.private.is_empty());

        let restored = Wallet::from_record(record, WalletConfig::default()).unwrap();
        assert_eq!(restored.address(), wallet.address());
        assert_eq!(restored.balance(), 250);
        assert_eq!(restored.registration_block(), Some(7));
        assert_eq!(restored.lookup_address_book("alice"), Some("addr1"));
        assert_eq!(
            restored.export_record().keys_pair.private,
            wallet.export_record().keys_pair.private
        );
        // the pending queue is not persisted
        assert!(restored.pending_operations().is_empty());
    }

    #[test]
    fn test_unregistered_record_uses_sentinel() {
        let mut wallet = Wallet::new();
        wallet.initialize().unwrap();

        let record = wallet.export_record();
        assert_eq!(record.block, -1);

        let restored = Wallet::from_record(record, WalletConfig::default()).unwrap();
        assert!(!restored.is_registered());
    }
}
