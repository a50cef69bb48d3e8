use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

/// Opaque account handle. Assigned by the operator when the account is opened
/// and echoed verbatim in audit text, so it stays a plain string rather than
/// a numeric key.
pub type AccountId = String;

/// The holder of a running balance. Mutated only by the ledger service inside
/// a transaction scope that also touches the payment history, never directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Current balance in cents. Kept equal to the signed sum of the
    /// account's existing payments; never driven negative by a create.
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Open an account with a zero starting balance.
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            balance: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_starts_at_zero() {
        let account = Account::new("u1");
        assert_eq!(account.id, "u1");
        assert_eq!(account.balance, 0);
    }
}
