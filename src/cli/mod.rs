use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{EntryKind, LedgerEntry, PaymentMethod, format_cents, parse_cents};

/// Saldo - operator-driven user balance ledger
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "A user balance ledger with an append-style payment history")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "saldo.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Show balance for an account or all accounts
    Balance {
        /// Account id (omit for all accounts)
        account: Option<String>,
    },

    /// Payment management commands
    #[command(subcommand)]
    Payment(PaymentCommands),

    /// Verify that stored balances match payment history
    Check,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account with a zero balance
    Open {
        /// Account id (must be unique)
        id: String,
    },

    /// List all accounts
    List,
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Record a payment against an account
    Create {
        /// Account id
        account: String,

        /// Payment kind: deposit, withdraw
        #[arg(short, long)]
        kind: String,

        /// Amount (e.g., "50.00" or "50")
        #[arg(short, long)]
        amount: String,

        /// Description (a default is synthesized when omitted)
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// Settlement method: cash, bank
        #[arg(short, long)]
        method: Option<String>,
    },

    /// List payments for one account
    List {
        /// Account id
        account: String,
    },

    /// List all payments across accounts (administrative)
    All {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Correct a payment's amount and/or description
    Update {
        /// Payment id
        id: String,

        /// New amount (e.g., "50.00")
        #[arg(short, long)]
        amount: Option<String>,

        /// New description
        #[arg(short = 'D', long)]
        description: Option<String>,
    },

    /// Delete a payment and reverse its effect on the balance
    Delete {
        /// Payment id
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Balance { account } => {
                let service = LedgerService::connect(&self.database).await?;
                run_balance_command(&service, account).await?;
            }

            Commands::Payment(payment_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_payment_command(&service, payment_cmd).await?;
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Open { id } => {
            let account = service.open_account(&id).await?;
            println!("Opened account: {}", account.id);
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<24} {:>12}", "ACCOUNT", "BALANCE");
                println!("{}", "-".repeat(37));
                for account in accounts {
                    println!("{:<24} {:>12}", account.id, format_cents(account.balance));
                }
            }
        }
    }
    Ok(())
}

async fn run_balance_command(service: &LedgerService, account: Option<String>) -> Result<()> {
    match account {
        Some(id) => {
            let account = service.get_account(&id).await?;
            println!("{}: {}", account.id, format_cents(account.balance));
        }
        None => {
            let accounts = service.list_accounts().await?;
            for account in accounts {
                println!("{}: {}", account.id, format_cents(account.balance));
            }
        }
    }
    Ok(())
}

async fn run_payment_command(service: &LedgerService, cmd: PaymentCommands) -> Result<()> {
    match cmd {
        PaymentCommands::Create {
            account,
            kind,
            amount,
            description,
            method,
        } => {
            let kind = EntryKind::from_str(&kind).with_context(|| {
                format!("Invalid payment kind '{}'. Valid kinds: deposit, withdraw", kind)
            })?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let method = method
                .map(|m| {
                    PaymentMethod::from_str(&m).with_context(|| {
                        format!("Invalid payment method '{}'. Valid methods: cash, bank", m)
                    })
                })
                .transpose()?;

            let result = service
                .create_payment(&account, kind, amount_cents, description, method)
                .await?;

            println!(
                "Recorded {}: {} for {} ({})",
                result.payment.kind.as_str(),
                format_cents(result.payment.amount_cents),
                result.payment.account_id,
                result.payment.id
            );
            println!("New balance: {}", format_cents(result.balance));
        }

        PaymentCommands::List { account } => {
            let payments = service.get_payments(&account).await?;
            print_payment_table(&payments);
        }

        PaymentCommands::All { format } => {
            let payments = service.get_all_payments().await?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&payments)?),
                "table" => print_payment_table(&payments),
                other => anyhow::bail!("Invalid format '{}'. Valid formats: table, json", other),
            }
        }

        PaymentCommands::Update {
            id,
            amount,
            description,
        } => {
            let payment_id =
                Uuid::parse_str(&id).context("Invalid payment ID format (expected UUID)")?;
            let amount_cents = amount
                .map(|a| parse_cents(&a))
                .transpose()
                .context("Invalid amount format. Use '50.00' or '50'")?;

            let payment = service
                .update_payment(payment_id, amount_cents, description)
                .await?;

            println!(
                "Updated payment {}: {} {} ({})",
                payment.id,
                payment.kind.as_str(),
                format_cents(payment.amount_cents),
                payment.description
            );
        }

        PaymentCommands::Delete { id } => {
            let payment_id =
                Uuid::parse_str(&id).context("Invalid payment ID format (expected UUID)")?;

            let result = service.delete_payment(payment_id).await?;

            println!(
                "Deleted {}: {} for {}",
                result.payment.kind.as_str(),
                format_cents(result.payment.amount_cents),
                result.payment.account_id
            );
            println!("New balance: {}", format_cents(result.balance));
        }
    }
    Ok(())
}

fn print_payment_table(payments: &[LedgerEntry]) {
    if payments.is_empty() {
        println!("No payments found.");
        return;
    }

    println!(
        "{:<36} {:<16} {:<10} {:>12}  {}",
        "ID", "ACCOUNT", "KIND", "AMOUNT", "DESCRIPTION"
    );
    println!("{}", "-".repeat(90));
    for payment in payments {
        println!(
            "{:<36} {:<16} {:<10} {:>12}  {}",
            payment.id,
            payment.account_id,
            payment.kind.as_str(),
            format_cents(payment.amount_cents),
            payment.description
        );
    }
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    let report = service.check_audit().await?;

    println!(
        "Accounts: {}, payments: {}",
        report.account_count, report.payment_count
    );

    if report.is_clean() {
        println!("OK: all stored balances match payment history.");
        return Ok(());
    }

    for mismatch in &report.mismatches {
        println!(
            "MISMATCH {}: stored {}, derived {} (drift {})",
            mismatch.account_id,
            format_cents(mismatch.stored),
            format_cents(mismatch.derived),
            format_cents(mismatch.drift())
        );
    }
    for account_id in &report.negative_balances {
        println!("NEGATIVE balance on account {}", account_id);
    }
    if report.invalid_amounts > 0 {
        println!("{} payment(s) with non-positive amounts", report.invalid_amounts);
    }

    Ok(())
}
