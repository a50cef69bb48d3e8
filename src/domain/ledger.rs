use super::{AccountId, Cents, LedgerEntry};

/// Signed sum of a set of entries: what the owning account's balance should
/// be if every entry took full effect.
pub fn signed_sum(entries: &[LedgerEntry]) -> Cents {
    entries.iter().map(|e| e.signed_effect()).sum()
}

/// One account whose stored balance disagrees with its payment history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceMismatch {
    pub account_id: AccountId,
    pub stored: Cents,
    pub derived: Cents,
}

impl BalanceMismatch {
    pub fn drift(&self) -> Cents {
        self.stored - self.derived
    }
}

/// Result of an audit pass over the whole ledger.
/// Amount corrections deliberately leave the stored balance untouched, so a
/// non-empty mismatch list is how that drift becomes visible.
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub account_count: i64,
    pub payment_count: i64,
    pub mismatches: Vec<BalanceMismatch>,
    pub negative_balances: Vec<AccountId>,
    pub invalid_amounts: i64,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
            && self.negative_balances.is_empty()
            && self.invalid_amounts == 0
    }
}

/// Compare stored balances against balances derived from payment history.
pub fn build_audit_report(
    balances: &[(AccountId, Cents)],
    derived: &[(AccountId, Cents)],
    payment_count: i64,
    invalid_amounts: i64,
) -> AuditReport {
    let derived_map: std::collections::HashMap<&str, Cents> = derived
        .iter()
        .map(|(id, sum)| (id.as_str(), *sum))
        .collect();

    let mut mismatches = Vec::new();
    let mut negative_balances = Vec::new();

    for (account_id, stored) in balances {
        let derived = derived_map.get(account_id.as_str()).copied().unwrap_or(0);
        if *stored != derived {
            mismatches.push(BalanceMismatch {
                account_id: account_id.clone(),
                stored: *stored,
                derived,
            });
        }
        if *stored < 0 {
            negative_balances.push(account_id.clone());
        }
    }

    AuditReport {
        account_count: balances.len() as i64,
        payment_count,
        mismatches,
        negative_balances,
        invalid_amounts,
    }
}
