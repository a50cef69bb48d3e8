use thiserror::Error;

use crate::domain::{AccountId, Cents};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Insufficient balance in account {account_id}: balance {balance}, requested {requested}"
    )]
    InsufficientBalance {
        account_id: AccountId,
        balance: Cents,
        requested: Cents,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
