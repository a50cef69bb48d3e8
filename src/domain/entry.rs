use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents, format_cents};

pub type PaymentId = Uuid;

/// Direction of a payment's effect on the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Deposit,
    #[serde(rename = "withdraw")]
    Withdrawal,
}

impl EntryKind {
    /// Storage token, matching the wire values operators already use.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Withdrawal => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(EntryKind::Deposit),
            "withdraw" | "withdrawal" => Some(EntryKind::Withdrawal),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    /// Capitalized form used in synthesized audit descriptions.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Deposit => write!(f, "Deposit"),
            EntryKind::Withdrawal => write!(f, "Withdraw"),
        }
    }
}

/// How the money physically moved. Informational only; no effect on balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "bank" => Some(PaymentMethod::Bank),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded deposit or withdrawal against an account.
/// Amount and description are correctable after the fact; everything else is
/// immutable once created. Removal reverses the entry's effect on the balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: PaymentId,
    pub account_id: AccountId,
    pub kind: EntryKind,
    /// Always positive; the signed effect on the balance comes from `kind`.
    pub amount_cents: Cents,
    pub description: String,
    /// Optional settlement channel (cash or bank).
    pub method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry. A blank description is replaced by the synthesized
    /// default so every stored entry carries human-readable audit text.
    pub fn new(
        account_id: impl Into<AccountId>,
        kind: EntryKind,
        amount_cents: Cents,
        description: Option<String>,
    ) -> Self {
        assert!(amount_cents > 0, "Payment amount must be positive");
        let account_id = account_id.into();
        let description = match description {
            Some(text) if !text.trim().is_empty() => text,
            _ => default_description(kind, amount_cents, &account_id),
        };
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount_cents,
            description,
            method: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Signed effect of this entry on the account balance:
    /// +amount for a deposit, -amount for a withdrawal.
    pub fn signed_effect(&self) -> Cents {
        match self.kind {
            EntryKind::Deposit => self.amount_cents,
            EntryKind::Withdrawal => -self.amount_cents,
        }
    }
}

/// Deterministic audit text for entries created without a description.
pub fn default_description(kind: EntryKind, amount_cents: Cents, account_id: &str) -> String {
    format!(
        "{} operation with amount {} for user {}",
        kind,
        format_cents(amount_cents),
        account_id
    )
}
