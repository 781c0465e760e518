use crate::domain::account::{Account, AccountId, Credits};
use crate::domain::campaign::{Campaign, CampaignId};
use crate::domain::ports::{LedgerStore, Receipt, WriteOp, WriteUnit};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family for account records.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family for the append-only transaction log.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column family for campaign records.
pub const CF_CAMPAIGNS: &str = "campaigns";

/// Persistent ledger store backed by RocksDB.
///
/// Each commit is validated and applied while holding `commit_lock`, which
/// serializes units, and written with a single `WriteBatch`, which makes the
/// unit atomic on disk. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CAMPAIGNS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::internal(format!("column family not found: {name}")))
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| LedgerError::internal(format!("deserialization error: {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn scan_json<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, bytes) = item?;
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| LedgerError::internal(format!("deserialization error: {e}")))?;
            values.push(value);
        }
        Ok(values)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| LedgerError::internal(format!("serialization error: {e}")))
}

/// Log keys sort by creation time so iteration preserves append order.
fn transaction_key(tx: &Transaction) -> Vec<u8> {
    format!("{:020}-{}", tx.created_at.timestamp_micros(), tx.id).into_bytes()
}

#[async_trait]
impl LedgerStore for RocksDbLedger {
    async fn account(&self, id: &AccountId) -> Result<Option<Account>> {
        self.get_json(CF_ACCOUNTS, id.as_str().as_bytes())
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let accounts: Vec<Account> = self.scan_json(CF_ACCOUNTS)?;
        Ok(accounts.into_iter().find(|a| a.email == email))
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        self.scan_json(CF_ACCOUNTS)
    }

    async fn campaign(&self, id: &CampaignId) -> Result<Option<Campaign>> {
        self.get_json(CF_CAMPAIGNS, id.as_str().as_bytes())
    }

    async fn campaigns(&self) -> Result<Vec<Campaign>> {
        self.scan_json(CF_CAMPAIGNS)
    }

    async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.scan_json(CF_TRANSACTIONS)
    }

    async fn insert_account(&self, account: Account) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        if self.account_by_email(&account.email).await?.is_some() {
            return Err(LedgerError::Conflict(format!(
                "email already registered: {}",
                account.email
            )));
        }
        let cf = self.cf(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, account.id.as_str().as_bytes(), to_json(&account)?)?;
        Ok(())
    }

    async fn commit(&self, unit: WriteUnit) -> Result<Receipt> {
        let _guard = self.commit_lock.lock().await;

        // Validate against committed state; accumulate the new balances and
        // records, then flush everything with one atomic batch.
        let mut accounts: HashMap<AccountId, Account> = HashMap::new();
        let mut balances: HashMap<AccountId, Credits> = HashMap::new();
        let load_account = |cache: &mut HashMap<AccountId, Account>,
                            id: &AccountId|
         -> Result<Account> {
            if let Some(account) = cache.get(id) {
                return Ok(account.clone());
            }
            let account: Account = self
                .get_json(CF_ACCOUNTS, id.as_str().as_bytes())?
                .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
            cache.insert(id.clone(), account.clone());
            Ok(account)
        };

        let mut batch = WriteBatch::default();
        for op in &unit.ops {
            match op {
                WriteOp::DebitGuarded { account, amount } => {
                    let mut record = load_account(&mut accounts, account)?;
                    let next = record.credits.debited(*amount).ok_or_else(|| {
                        LedgerError::InsufficientCredits {
                            account: account.to_string(),
                            required: amount.value(),
                            available: record.credits.value(),
                        }
                    })?;
                    record.credits = next;
                    balances.insert(account.clone(), next);
                    accounts.insert(account.clone(), record);
                }
                WriteOp::Credit { account, amount } => {
                    let mut record = load_account(&mut accounts, account)?;
                    record.credits = record.credits.credited(*amount);
                    balances.insert(account.clone(), record.credits);
                    accounts.insert(account.clone(), record);
                }
                WriteOp::AppendTransaction(tx) => {
                    let cf = self.cf(CF_TRANSACTIONS)?;
                    batch.put_cf(cf, transaction_key(tx), to_json(tx)?);
                }
                WriteOp::InsertCampaign(campaign) => {
                    let existing: Option<Campaign> =
                        self.get_json(CF_CAMPAIGNS, campaign.id.as_str().as_bytes())?;
                    if existing.is_some() {
                        return Err(LedgerError::Conflict(format!(
                            "campaign already exists: {}",
                            campaign.id
                        )));
                    }
                    let cf = self.cf(CF_CAMPAIGNS)?;
                    batch.put_cf(cf, campaign.id.as_str().as_bytes(), to_json(campaign)?);
                }
                WriteOp::UpdateCampaign {
                    expect_status,
                    campaign,
                } => {
                    let existing: Campaign = self
                        .get_json(CF_CAMPAIGNS, campaign.id.as_str().as_bytes())?
                        .ok_or_else(|| LedgerError::CampaignNotFound(campaign.id.to_string()))?;
                    if existing.status != *expect_status {
                        return Err(LedgerError::Conflict(format!(
                            "campaign {} was modified concurrently",
                            campaign.id
                        )));
                    }
                    let cf = self.cf(CF_CAMPAIGNS)?;
                    batch.put_cf(cf, campaign.id.as_str().as_bytes(), to_json(campaign)?);
                }
            }
        }
        for (id, account) in &accounts {
            let cf = self.cf(CF_ACCOUNTS)?;
            batch.put_cf(cf, id.as_str().as_bytes(), to_json(account)?);
        }

        self.db.write(batch)?;
        Ok(Receipt { balances })
    }
}
