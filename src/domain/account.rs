use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque account identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// Represents a positive credit quantity moved by a single operation.
///
/// Construction rejects zero, so every committed ledger entry carries a
/// meaningful amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: u64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Amount {
    type Error = LedgerError;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Non-negative credit balance. The type itself cannot go below zero; a debit
/// that would do so returns `None` and the caller reports
/// `InsufficientCredits`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(u64);

impl Credits {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn can_cover(&self, amount: Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Guarded decrement; `None` when the balance cannot cover the amount.
    pub fn debited(self, amount: Amount) -> Option<Self> {
        self.0.checked_sub(amount.value()).map(Self)
    }

    pub fn credited(self, amount: Amount) -> Self {
        Self(self.0 + amount.value())
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Balance-holding identity (user or admin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub credits: Credits,
}

impl Account {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            email: email.into(),
            role,
            credits: Credits::ZERO,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authenticated caller identity, established by the boundary layer.
/// Authorization here is only a capability check against the carried role.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub account: AccountId,
    pub role: Role,
}

impl Caller {
    pub fn new(account: AccountId, role: Role) -> Self {
        Self { account, role }
    }

    pub fn for_account(account: &Account) -> Self {
        Self {
            account: account.id.clone(),
            role: account.role,
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(
                "admin role required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(1).is_ok());
        assert!(matches!(
            Amount::new(0),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_credits_guarded_debit() {
        let balance = Credits::new(10);
        let amount = Amount::new(4).unwrap();
        assert_eq!(balance.debited(amount), Some(Credits::new(6)));

        let too_much = Amount::new(11).unwrap();
        assert_eq!(balance.debited(too_much), None);
    }

    #[test]
    fn test_credits_credit() {
        let balance = Credits::ZERO.credited(Amount::new(5).unwrap());
        assert_eq!(balance, Credits::new(5));
    }

    #[test]
    fn test_caller_require_admin() {
        let admin = Caller::new(AccountId::new(), Role::Admin);
        assert!(admin.require_admin().is_ok());

        let user = Caller::new(AccountId::new(), Role::User);
        assert!(matches!(
            user.require_admin(),
            Err(LedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_amount_serde_rejects_zero() {
        assert!(serde_json::from_str::<Amount>("0").is_err());
        let amount: Amount = serde_json::from_str("3").unwrap();
        assert_eq!(amount.value(), 3);
    }
}
