// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use saldo::application::LedgerService;
use saldo::domain::{Cents, EntryKind, signed_sum};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Open an account and seed it with a single deposit.
pub async fn funded_account(service: &LedgerService, id: &str, amount: Cents) -> Result<()> {
    service.open_account(id).await?;
    service
        .create_payment(id, EntryKind::Deposit, amount, None, None)
        .await?;
    Ok(())
}

/// Assert the ledger invariant for one account: the stored balance must equal
/// the signed sum of the account's existing payments.
pub async fn assert_invariant(service: &LedgerService, account_id: &str) -> Result<()> {
    let account = service.get_account(account_id).await?;
    let payments = service.get_payments(account_id).await?;
    assert_eq!(
        account.balance,
        signed_sum(&payments),
        "balance of {} diverged from its payment history",
        account_id
    );
    Ok(())
}
