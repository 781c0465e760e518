use crate::domain::account::{Account, AccountId, Credits};
use crate::domain::campaign::{Campaign, CampaignId};
use crate::domain::ports::{LedgerStore, Receipt, WriteOp, WriteUnit};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    campaigns: HashMap<CampaignId, Campaign>,
}

/// In-memory ledger store.
///
/// A single `RwLock` over the whole state gives serializable isolation:
/// `commit` holds the write lock for validation and application, so a
/// guarded decrement is always checked against all prior committed writes.
/// `Clone` shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn account(&self, id: &AccountId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(id).cloned())
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn campaign(&self, id: &CampaignId) -> Result<Option<Campaign>> {
        let state = self.state.read().await;
        Ok(state.campaigns.get(id).cloned())
    }

    async fn campaigns(&self) -> Result<Vec<Campaign>> {
        let state = self.state.read().await;
        Ok(state.campaigns.values().cloned().collect())
    }

    async fn transactions(&self) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.clone())
    }

    async fn insert_account(&self, account: Account) -> Result<()> {
        let mut state = self.state.write().await;
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(LedgerError::Conflict(format!(
                "email already registered: {}",
                account.email
            )));
        }
        state.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn commit(&self, unit: WriteUnit) -> Result<Receipt> {
        let mut state = self.state.write().await;

        // Phase 1: validate every op against current state plus the balances
        // accumulated so far in this unit. Nothing is mutated on failure.
        let mut balances: HashMap<AccountId, Credits> = HashMap::new();
        for op in &unit.ops {
            match op {
                WriteOp::DebitGuarded { account, amount } => {
                    let current = effective_balance(&state, &balances, account)?;
                    let next = current.debited(*amount).ok_or_else(|| {
                        LedgerError::InsufficientCredits {
                            account: account.to_string(),
                            required: amount.value(),
                            available: current.value(),
                        }
                    })?;
                    balances.insert(account.clone(), next);
                }
                WriteOp::Credit { account, amount } => {
                    let current = effective_balance(&state, &balances, account)?;
                    balances.insert(account.clone(), current.credited(*amount));
                }
                WriteOp::AppendTransaction(_) => {}
                WriteOp::InsertCampaign(campaign) => {
                    if state.campaigns.contains_key(&campaign.id) {
                        return Err(LedgerError::Conflict(format!(
                            "campaign already exists: {}",
                            campaign.id
                        )));
                    }
                }
                WriteOp::UpdateCampaign {
                    expect_status,
                    campaign,
                } => {
                    let existing = state.campaigns.get(&campaign.id).ok_or_else(|| {
                        LedgerError::CampaignNotFound(campaign.id.to_string())
                    })?;
                    if existing.status != *expect_status {
                        return Err(LedgerError::Conflict(format!(
                            "campaign {} was modified concurrently",
                            campaign.id
                        )));
                    }
                }
            }
        }

        // Phase 2: apply. Accounts were proven present above and the write
        // lock is held throughout.
        for (id, credits) in &balances {
            if let Some(account) = state.accounts.get_mut(id) {
                account.credits = *credits;
            }
        }
        for op in unit.ops {
            match op {
                WriteOp::AppendTransaction(tx) => state.transactions.push(tx),
                WriteOp::InsertCampaign(campaign)
                | WriteOp::UpdateCampaign { campaign, .. } => {
                    state.campaigns.insert(campaign.id.clone(), campaign);
                }
                WriteOp::DebitGuarded { .. } | WriteOp::Credit { .. } => {}
            }
        }

        Ok(Receipt { balances })
    }
}

fn effective_balance(
    state: &LedgerState,
    pending: &HashMap<AccountId, Credits>,
    account: &AccountId,
) -> Result<Credits> {
    if let Some(credits) = pending.get(account) {
        return Ok(*credits);
    }
    state
        .accounts
        .get(account)
        .map(|a| a.credits)
        .ok_or_else(|| LedgerError::AccountNotFound(account.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Amount, Role};
    use crate::domain::transaction::TransactionKind;

    fn account_with(credits: u64) -> Account {
        let mut account = Account::new("maya", "maya@acme.io", Role::User);
        account.credits = Credits::new(credits);
        account
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryLedger::new();
        let account = account_with(0);
        store.insert_account(account.clone()).await.unwrap();

        let by_id = store.account(&account.id).await.unwrap().unwrap();
        assert_eq!(by_id, account);
        let by_email = store.account_by_email("maya@acme.io").await.unwrap().unwrap();
        assert_eq!(by_email, account);
        assert!(store.account_by_email("ghost@acme.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflict() {
        let store = InMemoryLedger::new();
        store.insert_account(account_with(0)).await.unwrap();
        let err = store.insert_account(account_with(0)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_commit_all_or_nothing() {
        let store = InMemoryLedger::new();
        let account = account_with(10);
        store.insert_account(account.clone()).await.unwrap();

        // second debit in the unit overdraws; the first must not stick
        let unit = WriteUnit::new()
            .debit_guarded(account.id.clone(), Amount::new(6).unwrap())
            .append(Transaction::self_entry(
                &account.id,
                TransactionKind::Debit,
                Amount::new(6).unwrap(),
                "hold",
            ))
            .debit_guarded(account.id.clone(), Amount::new(6).unwrap());

        let err = store.commit(unit).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientCredits { .. }));

        let account = store.account(&account.id).await.unwrap().unwrap();
        assert_eq!(account.credits, Credits::new(10));
        assert!(store.transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_sees_earlier_ops_in_unit() {
        let store = InMemoryLedger::new();
        let account = account_with(0);
        store.insert_account(account.clone()).await.unwrap();

        // credit then debit within one unit balances out
        let unit = WriteUnit::new()
            .credit(account.id.clone(), Amount::new(5).unwrap())
            .debit_guarded(account.id.clone(), Amount::new(5).unwrap());
        let receipt = store.commit(unit).await.unwrap();
        assert_eq!(receipt.balance_of(&account.id).unwrap(), Credits::ZERO);
    }

    #[tokio::test]
    async fn test_update_campaign_cas() {
        use crate::domain::campaign::{Campaign, CampaignStatus};

        let store = InMemoryLedger::new();
        let campaign = Campaign::new(
            AccountId::new(),
            "t",
            "m",
            vec!["+15550000001".to_string()],
            vec![],
        );
        store
            .commit(WriteUnit::new().insert_campaign(campaign.clone()))
            .await
            .unwrap();

        let mut updated = campaign.clone();
        updated.status = CampaignStatus::Processing;
        store
            .commit(WriteUnit::new().update_campaign(CampaignStatus::Pending, updated.clone()))
            .await
            .unwrap();

        // stale expectation loses cleanly
        let mut stale = campaign.clone();
        stale.status = CampaignStatus::Rejected;
        let err = store
            .commit(WriteUnit::new().update_campaign(CampaignStatus::Pending, stale))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        let current = store.campaign(&campaign.id).await.unwrap().unwrap();
        assert_eq!(current.status, CampaignStatus::Processing);
    }

    #[tokio::test]
    async fn test_commit_unknown_account() {
        let store = InMemoryLedger::new();
        let err = store
            .commit(WriteUnit::new().credit(AccountId::new(), Amount::new(1).unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }
}
