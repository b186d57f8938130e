//! Signable ledger operations
//!
//! This module provides:
//! - The `Signable` contract shared by every operation
//! - Registration operations (bind an address into the ledger)
//! - Transfer operations (move value between addresses)
//! - The closed `Operation` set queued by the wallet

pub mod operation;
pub mod registration;
pub mod transfer;

pub use operation::{verify_operation, Operation, OperationError, OperationSignature, Signable};
pub use registration::RegistrationOp;
pub use transfer::TransferOp;
