use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::recommendation::EmploymentCategory;
use crate::types::{ClientId, Money};
use crate::LendingResult;

/// A client's designated payout account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank: String,
    pub branch: String,
    pub number: String,
    pub account_type: String,
}

impl BankAccount {
    /// Human-readable destination used in the disbursement channel text.
    pub fn channel_description(&self) -> String {
        format!(
            "{} / branch {} / account {} ({})",
            self.bank, self.branch, self.number, self.account_type
        )
    }
}

/// The slice of client master data the lending core needs. Full client CRUD
/// lives with the external directory, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: ClientId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment: Option<EmploymentCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_account: Option<BankAccount>,
}

/// Collaborator contract for client lookups.
pub trait ClientDirectory {
    fn get_client(&self, id: ClientId) -> LendingResult<ClientProfile>;
}

/// In-memory directory for tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    clients: HashMap<ClientId, ClientProfile>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, client: ClientProfile) {
        self.clients.insert(client.id, client);
    }
}

impl ClientDirectory for MemoryDirectory {
    fn get_client(&self, id: ClientId) -> LendingResult<ClientProfile> {
        self.clients
            .get(&id)
            .cloned()
            .ok_or(LendingError::NotFound {
                entity: "client",
                id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_description_format() {
        let account = BankAccount {
            bank: "001".into(),
            branch: "1234".into(),
            number: "55667-8".into(),
            account_type: "checking".into(),
        };
        assert_eq!(
            account.channel_description(),
            "001 / branch 1234 / account 55667-8 (checking)"
        );
    }

    #[test]
    fn test_memory_directory_lookup() {
        let mut dir = MemoryDirectory::new();
        dir.upsert(ClientProfile {
            id: 9,
            name: "Ana".into(),
            monthly_income: None,
            employment: None,
            principal_account: None,
        });
        assert_eq!(dir.get_client(9).unwrap().name, "Ana");
        assert!(matches!(
            dir.get_client(10),
            Err(LendingError::NotFound { entity: "client", .. })
        ));
    }
}
