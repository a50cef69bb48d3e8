mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{assert_invariant, test_service};
use saldo::domain::EntryKind;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_lose_no_updates() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.open_account("u1").await?;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_payment("u1", EntryKind::Deposit, 1, None, None)
                .await
        }));
    }
    for handle in handles {
        handle.await?.expect("deposit must succeed");
    }

    let account = service.get_account("u1").await?;
    assert_eq!(account.balance, 10, "every unit deposit must be counted");
    assert_eq!(service.get_payments("u1").await?.len(), 10);
    assert_invariant(&service, "u1").await?;

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.open_account("u1").await?;
    service
        .create_payment("u1", EntryKind::Deposit, 5, None, None)
        .await?;
    let service = Arc::new(service);

    // Ten racing unit withdrawals against a balance of five: exactly five can
    // commit, the rest must fail the floor check against a fresh balance.
    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_payment("u1", EntryKind::Withdrawal, 1, None, None)
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await?.is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 5);
    let account = service.get_account("u1").await?;
    assert_eq!(account.balance, 0);
    assert_invariant(&service, "u1").await?;

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_operations_on_different_accounts_are_independent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    for i in 0..4 {
        service.open_account(&format!("u{}", i)).await?;
    }
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..4 {
        for _ in 0..5 {
            let service = service.clone();
            let id = format!("u{}", i);
            handles.push(tokio::spawn(async move {
                service
                    .create_payment(&id, EntryKind::Deposit, 100, None, None)
                    .await
            }));
        }
    }
    for handle in handles {
        handle.await?.expect("deposit must succeed");
    }

    for i in 0..4 {
        let id = format!("u{}", i);
        assert_eq!(service.get_account(&id).await?.balance, 500);
        assert_invariant(&service, &id).await?;
    }

    Ok(())
}
