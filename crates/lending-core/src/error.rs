use thiserror::Error;

use crate::types::{ClientId, InstallmentId};

#[derive(Debug, Error)]
pub enum LendingError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No rate configured for {requested} installments (table covers up to {max_configured})")]
    RateNotConfigured { requested: u32, max_configured: u32 },

    #[error("Invalid rate table: tier {tier_index} — {reason}")]
    InvalidRateTable { tier_index: usize, reason: String },

    #[error("Invalid state transition: cannot {action} a request in status '{from}'")]
    InvalidStateTransition { action: String, from: String },

    #[error("Not permitted: {action}")]
    PermissionDenied { action: String },

    #[error("Client {client_id} has no principal bank account on file")]
    NoPrincipalAccount { client_id: ClientId },

    #[error("Installment {installment_id} is already paid")]
    AlreadyPaid { installment_id: InstallmentId },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LendingError {
    fn from(e: serde_json::Error) -> Self {
        LendingError::Serialization(e.to_string())
    }
}
