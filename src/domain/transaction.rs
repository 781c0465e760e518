use crate::domain::account::{AccountId, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debit,
    Credit,
}

/// Append-only ledger entry. Never mutated or deleted once committed.
///
/// `actor` is the account whose action caused the entry; `counterparty` is
/// the other side of the movement and equals `actor` for holds and refunds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub actor: AccountId,
    pub counterparty: AccountId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds the balanced pair for a transfer: a debit on the source and a
    /// credit on the destination, equal amount, same instant.
    pub fn pair(
        source: &AccountId,
        dest: &AccountId,
        amount: Amount,
        description: &str,
    ) -> [Transaction; 2] {
        let at = Utc::now();
        [
            Transaction {
                id: TransactionId::new(),
                actor: source.clone(),
                counterparty: dest.clone(),
                kind: TransactionKind::Debit,
                amount,
                description: description.to_string(),
                created_at: at,
            },
            Transaction {
                id: TransactionId::new(),
                actor: dest.clone(),
                counterparty: source.clone(),
                kind: TransactionKind::Credit,
                amount,
                description: description.to_string(),
                created_at: at,
            },
        ]
    }

    /// Single self-referential entry used for campaign holds and refunds.
    pub fn self_entry(
        account: &AccountId,
        kind: TransactionKind,
        amount: Amount,
        description: &str,
    ) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            actor: account.clone(),
            counterparty: account.clone(),
            kind,
            amount,
            description: description.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn is_self_referential(&self) -> bool {
        self.actor == self.counterparty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_balanced() {
        let source = AccountId::new();
        let dest = AccountId::new();
        let amount = Amount::new(20).unwrap();

        let [debit, credit] = Transaction::pair(&source, &dest, amount, "transfer");

        assert_eq!(debit.kind, TransactionKind::Debit);
        assert_eq!(credit.kind, TransactionKind::Credit);
        assert_eq!(debit.amount, credit.amount);
        assert_eq!(debit.created_at, credit.created_at);
        assert_eq!(debit.actor, source);
        assert_eq!(debit.counterparty, dest);
        assert_eq!(credit.actor, dest);
        assert_eq!(credit.counterparty, source);
        assert!(!debit.is_self_referential());
    }

    #[test]
    fn test_self_entry() {
        let account = AccountId::new();
        let entry = Transaction::self_entry(
            &account,
            TransactionKind::Debit,
            Amount::new(5).unwrap(),
            "campaign hold: launch",
        );

        assert!(entry.is_self_referential());
        assert_eq!(entry.actor, account);
        assert_eq!(entry.kind, TransactionKind::Debit);
    }
}
