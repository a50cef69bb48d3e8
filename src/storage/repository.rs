use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Account, AccountId, Cents, EntryKind, LedgerEntry, PaymentId, PaymentMethod};

use super::MIGRATION_001_INITIAL;

/// Outcome of an atomic payment commit (balance update + entry insert).
#[derive(Debug)]
pub enum CommitOutcome {
    /// Both writes landed; carries the post-commit balance.
    Committed(Cents),
    /// The candidate balance would have been negative; nothing was written.
    InsufficientBalance(Cents),
    /// The referenced account does not exist; nothing was written.
    AccountMissing,
}

/// Outcome of an atomic payment reversal (entry delete + inverse balance delta).
#[derive(Debug)]
pub enum ReversalOutcome {
    /// Entry removed and balance adjusted; carries the removed entry and the
    /// post-commit balance (which may legitimately be negative).
    Reversed {
        payment: LedgerEntry,
        balance: Cents,
    },
    PaymentMissing,
    /// The entry referenced an account that no longer exists; the delete was
    /// rolled back.
    AccountMissing { account_id: AccountId },
}

/// Repository for persisting and querying accounts and payments.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account.
    pub async fn create_account(&self, account: &Account) -> Result<()> {
        sqlx::query("INSERT INTO accounts (id, balance, created_at) VALUES (?, ?, ?)")
            .bind(&account.id)
            .bind(account.balance)
            .bind(account.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by id.
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT id, balance, created_at FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT id, balance, created_at FROM accounts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Overwrite the stored balance. Pure persistence; callers must have
    /// already validated the new value. Returns false when the account is
    /// unknown.
    pub async fn set_balance(&self, id: &str, new_balance: Cents) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET balance = ? WHERE id = ?")
            .bind(new_balance)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to set balance")?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Payment operations
    // ========================

    /// Get a payment by id.
    pub async fn get_payment(&self, id: PaymentId) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, kind, amount_cents, description, method, created_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch payment")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_payment(&row)?)),
            None => Ok(None),
        }
    }

    /// List payments for one account, oldest first. Each call is a fresh
    /// snapshot of the current history.
    pub async fn list_payments_for_account(&self, account_id: &str) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, kind, amount_cents, description, method, created_at
            FROM payments
            WHERE account_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments for account")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    /// List all payments across accounts, oldest first.
    pub async fn list_payments(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, kind, amount_cents, description, method, created_at
            FROM payments
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    /// Patch a payment's amount and/or description. Does not touch the owning
    /// account; balance reconciliation is the service's concern.
    pub async fn update_payment(
        &self,
        id: PaymentId,
        amount_cents: Option<Cents>,
        description: Option<&str>,
    ) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            r#"
            UPDATE payments
            SET amount_cents = COALESCE(?, amount_cents),
                description = COALESCE(?, description)
            WHERE id = ?
            RETURNING id, account_id, kind, amount_cents, description, method, created_at
            "#,
        )
        .bind(amount_cents)
        .bind(description)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update payment")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_payment(&row)?)),
            None => Ok(None),
        }
    }

    // ========================
    // Atomic commit units
    // ========================

    /// Apply a new payment as one transaction: guarded balance update first,
    /// then the entry insert. The guard (`balance + delta >= 0`) is evaluated
    /// by the database against the latest committed balance, so concurrent
    /// commits against the same account cannot lose updates or slip below
    /// zero.
    pub async fn commit_payment(&self, entry: &LedgerEntry) -> Result<CommitOutcome> {
        let delta = entry.signed_effect();

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + ?1
            WHERE id = ?2 AND balance + ?1 >= 0
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(&entry.account_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to apply balance delta")?;

        let Some(row) = updated else {
            // Guard rejected: distinguish a missing account from an
            // insufficient balance, then drop the transaction (no writes yet).
            let existing = sqlx::query("SELECT balance FROM accounts WHERE id = ?")
                .bind(&entry.account_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to fetch account during commit")?;

            return Ok(match existing {
                Some(row) => CommitOutcome::InsufficientBalance(row.get("balance")),
                None => CommitOutcome::AccountMissing,
            });
        };
        let balance: Cents = row.get("balance");

        sqlx::query(
            r#"
            INSERT INTO payments (id, account_id, kind, amount_cents, description, method, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.account_id)
        .bind(entry.kind.as_str())
        .bind(entry.amount_cents)
        .bind(&entry.description)
        .bind(entry.method.map(|m| m.as_str()))
        .bind(entry.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save payment")?;

        tx.commit().await.context("Failed to commit payment")?;

        Ok(CommitOutcome::Committed(balance))
    }

    /// Remove a payment and apply the inverse of its original effect to the
    /// owning account, as one transaction. No floor check: a reversal may
    /// legitimately drive the balance negative.
    pub async fn reverse_payment(&self, id: PaymentId) -> Result<ReversalOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM payments
            WHERE id = ?
            RETURNING id, account_id, kind, amount_cents, description, method, created_at
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to delete payment")?;

        let Some(row) = deleted else {
            return Ok(ReversalOutcome::PaymentMissing);
        };
        let payment = Self::row_to_payment(&row)?;

        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance - ?
            WHERE id = ?
            RETURNING balance
            "#,
        )
        .bind(payment.signed_effect())
        .bind(&payment.account_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to reverse balance delta")?;

        let Some(row) = updated else {
            // Orphaned entry: rolling back keeps the delete from landing.
            tx.rollback().await.context("Failed to roll back reversal")?;
            return Ok(ReversalOutcome::AccountMissing {
                account_id: payment.account_id,
            });
        };
        let balance: Cents = row.get("balance");

        tx.commit().await.context("Failed to commit reversal")?;

        Ok(ReversalOutcome::Reversed { payment, balance })
    }

    // ========================
    // Audit queries
    // ========================

    /// Stored balance per account.
    pub async fn load_balances(&self) -> Result<Vec<(AccountId, Cents)>> {
        let rows = sqlx::query("SELECT id, balance FROM accounts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load balances")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("id"), row.get("balance")))
            .collect())
    }

    /// Balance per account derived from payment history via SQL aggregation.
    pub async fn derive_balances(&self) -> Result<Vec<(AccountId, Cents)>> {
        let rows = sqlx::query(
            r#"
            SELECT
                account_id,
                COALESCE(SUM(CASE WHEN kind = 'deposit' THEN amount_cents ELSE -amount_cents END), 0) as derived
            FROM payments
            GROUP BY account_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to derive balances")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("account_id"), row.get("derived")))
            .collect())
    }

    /// Count all payments.
    pub async fn count_payments(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM payments")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count payments")?;
        Ok(row.get("count"))
    }

    /// Count payments with a non-positive amount (corrupt history rows).
    pub async fn count_invalid_amounts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM payments WHERE amount_cents <= 0")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count invalid amounts")?;
        Ok(row.get("count"))
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: row.get("id"),
            balance: row.get("balance"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let method_str: Option<String> = row.get("method");
        let created_at_str: String = row.get("created_at");

        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            account_id: row.get("account_id"),
            kind: EntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid payment kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
            method: method_str
                .map(|s| {
                    PaymentMethod::from_str(&s)
                        .ok_or_else(|| anyhow::anyhow!("Invalid payment method: {}", s))
                })
                .transpose()?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
