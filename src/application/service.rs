use std::sync::Arc;

use crate::domain::{
    Account, AuditReport, Cents, EntryKind, LedgerEntry, PaymentId, PaymentMethod,
    build_audit_report,
};
use crate::storage::{CommitOutcome, Repository, ReversalOutcome};

use super::LedgerError;

/// Hook for side-effecting consumers (notification feeds and the like).
/// Called after a commit has landed; never part of the invariant-preserving
/// path, and a failure here cannot undo a committed payment.
pub trait NotificationSink: Send + Sync {
    fn payment_created(&self, payment: &LedgerEntry, balance: Cents);
    fn payment_reversed(&self, payment: &LedgerEntry, balance: Cents);
}

/// Default sink: discards every event.
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn payment_created(&self, _payment: &LedgerEntry, _balance: Cents) {}
    fn payment_reversed(&self, _payment: &LedgerEntry, _balance: Cents) {}
}

/// Result of recording a payment
#[derive(Debug)]
pub struct PaymentResult {
    pub payment: LedgerEntry,
    pub balance: Cents,
}

/// Result of deleting (reversing) a payment
#[derive(Debug)]
pub struct DeletionResult {
    pub payment: LedgerEntry,
    pub balance: Cents,
}

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, RPC facade, tests).
pub struct LedgerService {
    repo: Repository,
    notifier: Arc<dyn NotificationSink>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            notifier: Arc::new(NoopSink),
        }
    }

    /// Attach a notification sink. Events fire after successful commits.
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account with a zero balance.
    pub async fn open_account(&self, id: &str) -> Result<Account, LedgerError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(LedgerError::InvalidInput(
                "Missing or invalid account id".to_string(),
            ));
        }
        if self.repo.get_account(id).await?.is_some() {
            return Err(LedgerError::AccountAlreadyExists(id.to_string()));
        }

        let account = Account::new(id);
        self.repo.create_account(&account).await?;
        Ok(account)
    }

    /// Get an account by id.
    pub async fn get_account(&self, id: &str) -> Result<Account, LedgerError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.repo.list_accounts().await?)
    }

    // ========================
    // Payment operations
    // ========================

    /// Record a new payment against an account.
    ///
    /// The balance guard and the entry insert are one atomic unit: either the
    /// entry exists and the balance reflects it, or neither happened. A
    /// withdrawal that would drive the balance negative is rejected with no
    /// effect.
    pub async fn create_payment(
        &self,
        account_id: &str,
        kind: EntryKind,
        amount_cents: Cents,
        description: Option<String>,
        method: Option<PaymentMethod>,
    ) -> Result<PaymentResult, LedgerError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(LedgerError::InvalidInput(
                "Missing or invalid account id".to_string(),
            ));
        }
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidInput(
                "Missing or invalid amount".to_string(),
            ));
        }

        let mut entry = LedgerEntry::new(account_id, kind, amount_cents, description);
        if let Some(method) = method {
            entry = entry.with_method(method);
        }

        match self.repo.commit_payment(&entry).await? {
            CommitOutcome::Committed(balance) => {
                self.notifier.payment_created(&entry, balance);
                Ok(PaymentResult {
                    payment: entry,
                    balance,
                })
            }
            CommitOutcome::InsufficientBalance(balance) => {
                Err(LedgerError::InsufficientBalance {
                    account_id: account_id.to_string(),
                    balance,
                    requested: amount_cents,
                })
            }
            CommitOutcome::AccountMissing => {
                Err(LedgerError::AccountNotFound(account_id.to_string()))
            }
        }
    }

    /// Get all payments for one account. Read-only; trusts the stored balance
    /// rather than recomputing it. An account with no history yields an empty
    /// list.
    pub async fn get_payments(&self, account_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(LedgerError::InvalidInput(
                "Missing or invalid account id".to_string(),
            ));
        }
        Ok(self.repo.list_payments_for_account(account_id).await?)
    }

    /// Get all payments across accounts (administrative read). Each entry
    /// carries its owning account id.
    pub async fn get_all_payments(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.repo.list_payments().await?)
    }

    /// Get one payment by id.
    pub async fn get_payment(&self, id: PaymentId) -> Result<LedgerEntry, LedgerError> {
        self.repo
            .get_payment(id)
            .await?
            .ok_or_else(|| LedgerError::PaymentNotFound(id.to_string()))
    }

    /// Correct a payment's amount and/or description.
    ///
    /// Deliberately leaves the account balance as it was when the entry was
    /// first created, for parity with the system this ledger replaces. The
    /// resulting drift between stored and derived balance is surfaced by
    /// `check_audit`.
    pub async fn update_payment(
        &self,
        id: PaymentId,
        amount_cents: Option<Cents>,
        description: Option<String>,
    ) -> Result<LedgerEntry, LedgerError> {
        if let Some(amount) = amount_cents {
            if amount <= 0 {
                return Err(LedgerError::InvalidInput(
                    "Missing or invalid amount".to_string(),
                ));
            }
        }

        self.repo
            .update_payment(id, amount_cents, description.as_deref())
            .await?
            .ok_or_else(|| LedgerError::PaymentNotFound(id.to_string()))
    }

    /// Delete a payment and reverse its effect on the owning account's
    /// balance, as one atomic unit. The reversal is unguarded: deleting a
    /// deposit that has since been spent may leave the balance negative.
    pub async fn delete_payment(&self, id: PaymentId) -> Result<DeletionResult, LedgerError> {
        match self.repo.reverse_payment(id).await? {
            ReversalOutcome::Reversed { payment, balance } => {
                self.notifier.payment_reversed(&payment, balance);
                Ok(DeletionResult { payment, balance })
            }
            ReversalOutcome::PaymentMissing => Err(LedgerError::PaymentNotFound(id.to_string())),
            ReversalOutcome::AccountMissing { account_id } => {
                Err(LedgerError::AccountNotFound(account_id))
            }
        }
    }

    // ========================
    // Audit operations
    // ========================

    /// Compare every stored balance against the balance derived from payment
    /// history and report the differences.
    pub async fn check_audit(&self) -> Result<AuditReport, LedgerError> {
        let balances = self.repo.load_balances().await?;
        let derived = self.repo.derive_balances().await?;
        let payment_count = self.repo.count_payments().await?;
        let invalid_amounts = self.repo.count_invalid_amounts().await?;

        Ok(build_audit_report(
            &balances,
            &derived,
            payment_count,
            invalid_amounts,
        ))
    }
}
