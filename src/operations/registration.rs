//! Wallet registration operation

use serde::{Deserialize, Serialize};

use super::operation::{OperationError, OperationSignature, Signable};

/// One-time signed intent that binds an address into the ledger
///
/// The ledger answers an accepted registration with the block number the
/// wallet was defined in; the wallet records it via
/// [`Wallet::set_registration_block`](crate::wallet::Wallet::set_registration_block).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationOp {
    /// The address being registered
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<OperationSignature>,
}

impl RegistrationOp {
    /// Create a registration intent for the given address
    pub fn new(address: impl Into<String>) -> Result<Self, OperationError> {
        let address = address.into();
        if address.is_empty() {
            return Err(OperationError::EmptyAddress);
        }
        Ok(Self {
            address,
            signature: None,
        })
    }
}

impl Signable for RegistrationOp {
    fn payload(&self) -> Vec<u8> {
        self.address.as_bytes().to_vec()
    }

    fn signature(&self) -> Option<&OperationSignature> {
        self.signature.as_ref()
    }

    fn set_signature(&mut self, seal: OperationSignature) {
        self.signature = Some(seal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_the_address_bytes() {
        let op = RegistrationOp::new("deadbeef").unwrap();
        assert_eq!(op.payload(), b"deadbeef");
        assert!(!op.is_signed());
    }

    #[test]
    fn test_empty_address_rejected() {
        assert_eq!(RegistrationOp::new("").unwrap_err(), OperationError::EmptyAddress);
    }
}
