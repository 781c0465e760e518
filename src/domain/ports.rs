use crate::domain::account::{Account, AccountId, Amount, Credits};
use crate::domain::campaign::{Campaign, CampaignId, CampaignStatus, StorageProvider};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Reference returned by a blob-store upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub url: String,
    pub key: String,
}

/// Opaque media/report storage. Accessed at most once per upload, outside
/// the ledger's transactional boundary.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn provider(&self) -> StorageProvider;
    async fn put_object(&self, bytes: &[u8], content_type: &str) -> Result<StoredObject>;
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String>;
}

/// One write inside an atomic unit. Ops are applied in order; a guard failure
/// anywhere aborts the whole unit with nothing committed.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Decrement guarded by `balance >= amount`; fails the unit with
    /// `InsufficientCredits` otherwise.
    DebitGuarded { account: AccountId, amount: Amount },
    /// Unguarded increment; destinations have no upper bound.
    Credit { account: AccountId, amount: Amount },
    AppendTransaction(Transaction),
    InsertCampaign(Campaign),
    /// Full-record replacement guarded on the status the caller observed;
    /// a mismatch fails the unit with `Conflict`.
    UpdateCampaign {
        expect_status: CampaignStatus,
        campaign: Campaign,
    },
}

/// Ordered batch of writes committed as one atomic, isolated unit.
#[derive(Debug, Clone, Default)]
pub struct WriteUnit {
    pub ops: Vec<WriteOp>,
}

impl WriteUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debit_guarded(mut self, account: AccountId, amount: Amount) -> Self {
        self.ops.push(WriteOp::DebitGuarded { account, amount });
        self
    }

    pub fn credit(mut self, account: AccountId, amount: Amount) -> Self {
        self.ops.push(WriteOp::Credit { account, amount });
        self
    }

    pub fn append(mut self, tx: Transaction) -> Self {
        self.ops.push(WriteOp::AppendTransaction(tx));
        self
    }

    pub fn insert_campaign(mut self, campaign: Campaign) -> Self {
        self.ops.push(WriteOp::InsertCampaign(campaign));
        self
    }

    pub fn update_campaign(mut self, expect_status: CampaignStatus, campaign: Campaign) -> Self {
        self.ops.push(WriteOp::UpdateCampaign {
            expect_status,
            campaign,
        });
        self
    }
}

/// Post-commit balances of every account touched by a unit, captured inside
/// the commit critical section so engines never re-read racily.
#[derive(Debug, Clone, Default)]
pub struct Receipt {
    pub balances: HashMap<AccountId, Credits>,
}

impl Receipt {
    pub fn balance_of(&self, account: &AccountId) -> Result<Credits> {
        self.balances.get(account).copied().ok_or_else(|| {
            LedgerError::internal(format!("commit receipt missing balance for {account}"))
        })
    }
}

/// Persistent record of accounts, campaigns and the append-only transaction
/// log. `commit` is the only mutation path besides account registration and
/// provides serializable all-or-nothing application of a [`WriteUnit`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn account(&self, id: &AccountId) -> Result<Option<Account>>;
    async fn account_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn accounts(&self) -> Result<Vec<Account>>;
    async fn campaign(&self, id: &CampaignId) -> Result<Option<Campaign>>;
    async fn campaigns(&self) -> Result<Vec<Campaign>>;
    async fn transactions(&self) -> Result<Vec<Transaction>>;

    /// Registers a new account. Fails with `Conflict` if the email is taken.
    async fn insert_account(&self, account: Account) -> Result<()>;

    /// Applies the unit atomically: every op commits or none does, and no
    /// reader ever observes an intermediate state.
    async fn commit(&self, unit: WriteUnit) -> Result<Receipt>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type BlobStoreRef = Arc<dyn BlobStore>;
