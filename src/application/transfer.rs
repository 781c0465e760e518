use crate::domain::account::{Account, AccountId, Amount, Caller, Credits};
use crate::domain::ports::{LedgerStoreRef, WriteUnit};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub source_balance: Credits,
    pub dest_balance: Credits,
}

/// Result of a privileged signed-amount adjustment: the admin's new balance
/// plus the updated target account, so the caller can refresh both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustOutcome {
    pub admin_balance: Credits,
    pub target: Account,
}

/// Moves a fixed positive amount of credits between exactly two accounts as
/// one atomic unit, recording a balanced transaction pair. Partial state is
/// never visible: balance changes and ledger entries commit together.
pub struct CreditTransferEngine {
    store: LedgerStoreRef,
}

impl CreditTransferEngine {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// Transfers `amount` from `source` to `dest`.
    ///
    /// The guarded decrement on `source` is evaluated inside the commit
    /// critical section, so concurrent transfers on the same account cannot
    /// both pass a guard only one could satisfy.
    pub async fn transfer(
        &self,
        source: &AccountId,
        dest: &AccountId,
        amount: Amount,
        description: &str,
    ) -> Result<TransferOutcome> {
        if source == dest {
            return Err(LedgerError::Validation(
                "self-transfer is not permitted".to_string(),
            ));
        }

        // Resolve both sides before building the unit so a bad id fails
        // before any write.
        let source = self
            .store
            .account(source)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(source.to_string()))?;
        let dest = self
            .store
            .account(dest)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(dest.to_string()))?;

        let [debit, credit] = Transaction::pair(&source.id, &dest.id, amount, description);
        let unit = WriteUnit::new()
            .debit_guarded(source.id.clone(), amount)
            .credit(dest.id.clone(), amount)
            .append(debit)
            .append(credit);

        let receipt = self.store.commit(unit).await?;
        info!(
            source = %source.id,
            dest = %dest.id,
            amount = amount.value(),
            "credits transferred"
        );

        Ok(TransferOutcome {
            source_balance: receipt.balance_of(&source.id)?,
            dest_balance: receipt.balance_of(&dest.id)?,
        })
    }

    /// Admin-only signed adjustment toward a target addressed by email.
    /// Positive amounts flow admin -> target, negative amounts flow
    /// target -> admin (absolute value). Zero is rejected, as is targeting
    /// the caller's own account.
    pub async fn adjust(
        &self,
        caller: &Caller,
        target_email: &str,
        signed_amount: i64,
        description: &str,
    ) -> Result<AdjustOutcome> {
        caller.require_admin()?;

        if signed_amount == 0 {
            return Err(LedgerError::Validation(
                "adjustment amount must be non-zero".to_string(),
            ));
        }
        let amount = Amount::new(signed_amount.unsigned_abs())?;

        let mut target = self
            .store
            .account_by_email(target_email)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(target_email.to_string()))?;
        if target.id == caller.account {
            return Err(LedgerError::Validation(
                "cannot adjust the caller's own balance".to_string(),
            ));
        }

        let outcome = if signed_amount > 0 {
            self.transfer(&caller.account, &target.id, amount, description)
                .await?
        } else {
            self.transfer(&target.id, &caller.account, amount, description)
                .await?
        };

        let (admin_balance, target_balance) = if signed_amount > 0 {
            (outcome.source_balance, outcome.dest_balance)
        } else {
            (outcome.dest_balance, outcome.source_balance)
        };
        target.credits = target_balance;

        Ok(AdjustOutcome {
            admin_balance,
            target,
        })
    }
}
