//! Value-transfer operation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::operation::{OperationError, OperationSignature, Signable};

/// Signed intent moving value from one address to another
///
/// `activates_at` time-gates the transfer: a future timestamp tells the
/// ledger when the transfer becomes executable. The wallet only stamps
/// the field; interpreting it is the ledger's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferOp {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Amount in smallest units
    pub amount: u64,
    /// Creation timestamp (UTC)
    pub created_at: DateTime<Utc>,
    /// Activation timestamp (UTC); equals `created_at` when not deferred
    pub activates_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<OperationSignature>,
}

impl TransferOp {
    /// Create a transfer intent, validating its field constraints
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: u64,
        created_at: DateTime<Utc>,
        activates_at: DateTime<Utc>,
    ) -> Result<Self, OperationError> {
        let from = from.into();
        let to = to.into();

        if from.is_empty() {
            return Err(OperationError::EmptySender);
        }
        if to.is_empty() {
            return Err(OperationError::EmptyRecipient);
        }
        if amount == 0 {
            return Err(OperationError::ZeroAmount);
        }

        Ok(Self {
            from,
            to,
            amount,
            created_at,
            activates_at,
            signature: None,
        })
    }
}

impl Signable for TransferOp {
    /// Deterministic encoding of the transfer fields
    ///
    /// Timestamps are fixed to millisecond precision so the payload is
    /// byte-stable across serialization round trips.
    fn payload(&self) -> Vec<u8> {
        format!(
            "{}:{}:{}:{}:{}",
            self.from,
            self.to,
            self.amount,
            self.created_at.timestamp_millis(),
            self.activates_at.timestamp_millis()
        )
        .into_bytes()
    }

    fn signature(&self) -> Option<&OperationSignature> {
        self.signature.as_ref()
    }

    fn set_signature(&mut self, seal: OperationSignature) {
        self.signature = Some(seal);
    }
}
