//! The signable-operation contract and the closed operation set
//!
//! Every operation the wallet can queue is a value of the `Operation`
//! enum. An operation starts unsigned, gets signed exactly once, and its
//! payload is immutable from that point on. The signature covers the
//! payload bytes only, never the signature fields themselves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{public_key_from_hex, verify_signature, KeyError};

use super::registration::RegistrationOp;
use super::transfer::TransferOp;

/// Errors raised by operation constructors
///
/// An operation that violates its own field constraints is rejected
/// before it can ever be signed or queued.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OperationError {
    #[error("Registration address must not be empty")]
    EmptyAddress,
    #[error("Transfer sender must not be empty")]
    EmptySender,
    #[error("Transfer recipient must not be empty")]
    EmptyRecipient,
    #[error("Transfer amount must be greater than zero")]
    ZeroAmount,
}

/// A detached signature plus the public key that produced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationSignature {
    /// Hex-encoded compact ECDSA signature over the operation payload
    pub signature: String,
    /// Hex-encoded public key of the signer
    pub public_key: String,
}

/// Contract implemented by every signable operation
pub trait Signable {
    /// The exact bytes that get signed
    fn payload(&self) -> Vec<u8>;

    /// The attached signature, if the operation has been signed
    fn signature(&self) -> Option<&OperationSignature>;

    /// Attach a signature, transitioning the operation to Signed
    fn set_signature(&mut self, seal: OperationSignature);

    /// Whether the operation has been signed
    fn is_signed(&self) -> bool {
        self.signature().is_some()
    }
}

/// The closed set of operations the wallet can produce
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// One-time intent binding the wallet address into the ledger
    Registration(RegistrationOp),
    /// Intent moving value from the wallet to another address
    Transfer(TransferOp),
}

impl Signable for Operation {
    fn payload(&self) -> Vec<u8> {
        match self {
            Operation::Registration(op) => op.payload(),
            Operation::Transfer(op) => op.payload(),
        }
    }

    fn signature(&self) -> Option<&OperationSignature> {
        match self {
            Operation::Registration(op) => op.signature(),
            Operation::Transfer(op) => op.signature(),
        }
    }

    fn set_signature(&mut self, seal: OperationSignature) {
        match self {
            Operation::Registration(op) => op.set_signature(seal),
            Operation::Transfer(op) => op.set_signature(seal),
        }
    }
}

/// Verify an operation's signature against its embedded signer key
///
/// Unsigned operations verify false. `Err` is reserved for malformed
/// signature or key material.
pub fn verify_operation<S: Signable>(op: &S) -> Result<bool, KeyError> {
    let seal = match op.signature() {
        Some(seal) => seal,
        None => return Ok(false),
    };

    let public_key = public_key_from_hex(&seal.public_key)?;
    let signature = hex::decode(&seal.signature).map_err(|_| KeyError::InvalidSignature)?;

    verify_signature(&public_key, &op.payload(), &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_operation_delegates_signable() {
        let mut op = Operation::Registration(RegistrationOp::new("abc123").unwrap());
        assert!(!op.is_signed());
        assert_eq!(op.payload(), b"abc123");

        op.set_signature(OperationSignature {
            signature: "00ff".to_string(),
            public_key: "02aa".to_string(),
        });
        assert!(op.is_signed());
        assert_eq!(op.signature().unwrap().public_key, "02aa");
    }

    #[test]
    fn test_operation_serde_tagging() {
        let now = Utc::now();
        let op = Operation::Transfer(TransferOp::new("from", "to", 5, now, now).unwrap());

        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"type\":\"transfer\""));

        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_verify_operation() {
        use crate::crypto::KeyPair;

        let kp = KeyPair::generate();
        let mut op = Operation::Registration(RegistrationOp::new(kp.address()).unwrap());
        assert!(!verify_operation(&op).unwrap());

        let signature = kp.sign(&op.payload()).unwrap();
        op.set_signature(OperationSignature {
            signature: hex::encode(signature),
            public_key: kp.public_key_hex(),
        });
        assert!(verify_operation(&op).unwrap());

        // a different signer key does not verify
        let other = KeyPair::generate();
        let sig_hex = op.signature().unwrap().signature.clone();
        op.set_signature(OperationSignature {
            signature: sig_hex,
            public_key: other.public_key_hex(),
        });
        assert!(!verify_operation(&op).unwrap());
    }
}
