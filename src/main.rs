use campwire::application::lifecycle::{CampaignDraft, CampaignLifecycleEngine};
use campwire::application::transfer::CreditTransferEngine;
use campwire::domain::account::{Account, Amount, Caller, Role};
use campwire::domain::campaign::{CampaignId, CampaignStatus};
use campwire::domain::ports::{LedgerStoreRef, WriteUnit};
use campwire::domain::transaction::{Transaction, TransactionKind};
use campwire::error::{LedgerError, Result as LedgerResult};
use campwire::infrastructure::blob::InMemoryBlobStore;
use campwire::infrastructure::in_memory::InMemoryLedger;
use campwire::interfaces::csv::ops_reader::{OpKind, OpRecord, OpsReader};
use campwire::interfaces::csv::summary_writer::SummaryWriter;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Replays an operation log against the credit ledger and prints the final
/// account balances. An offline audit tool: the same engines a service
/// boundary would call, driven from a CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent ledger database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("CAMPWIRE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(path: PathBuf) -> LedgerResult<LedgerStoreRef> {
    use campwire::infrastructure::rocksdb::RocksDbLedger;
    Ok(Arc::new(RocksDbLedger::open(path)?))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(_path: PathBuf) -> LedgerResult<LedgerStoreRef> {
    Err(LedgerError::Validation(
        "this build has no persistent storage; rebuild with --features storage-rocksdb"
            .to_string(),
    ))
}

struct Replay {
    store: LedgerStoreRef,
    transfers: CreditTransferEngine,
    lifecycle: CampaignLifecycleEngine,
    /// Log-local campaign labels mapped to the ids minted during replay.
    campaigns: HashMap<String, CampaignId>,
}

impl Replay {
    fn new(store: LedgerStoreRef) -> Self {
        let blob = Arc::new(InMemoryBlobStore::new());
        Self {
            transfers: CreditTransferEngine::new(store.clone()),
            lifecycle: CampaignLifecycleEngine::new(store.clone(), blob),
            store,
            campaigns: HashMap::new(),
        }
    }

    async fn caller(&self, email: &str) -> LedgerResult<Caller> {
        let account = self
            .store
            .account_by_email(email)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(email.to_string()))?;
        Ok(Caller::for_account(&account))
    }

    fn campaign_id(&self, label: Option<&str>) -> LedgerResult<CampaignId> {
        let label = label.ok_or_else(|| {
            LedgerError::Validation("operation requires a campaign label".to_string())
        })?;
        self.campaigns
            .get(label)
            .cloned()
            .ok_or_else(|| LedgerError::CampaignNotFound(label.to_string()))
    }

    async fn apply(&mut self, record: OpRecord) -> LedgerResult<()> {
        match record.op {
            OpKind::Open | OpKind::OpenAdmin => {
                let role = if record.op == OpKind::OpenAdmin {
                    Role::Admin
                } else {
                    Role::User
                };
                let name = record.note.clone().unwrap_or_else(|| record.account.clone());
                let account = Account::new(name, record.account.clone(), role);
                let id = account.id.clone();
                self.store.insert_account(account).await?;

                if let Some(opening) = record.amount.filter(|a| *a > 0) {
                    let amount = Amount::new(opening as u64)?;
                    self.store
                        .commit(
                            WriteUnit::new().credit(id.clone(), amount).append(
                                Transaction::self_entry(
                                    &id,
                                    TransactionKind::Credit,
                                    amount,
                                    "opening balance",
                                ),
                            ),
                        )
                        .await?;
                }
                Ok(())
            }
            OpKind::Transfer => {
                let caller = self.caller(&record.account).await?;
                let target = record.target.as_deref().ok_or_else(|| {
                    LedgerError::Validation("transfer requires a target".to_string())
                })?;
                let amount = record.amount.ok_or_else(|| {
                    LedgerError::Validation("transfer requires an amount".to_string())
                })?;
                let note = record.note.as_deref().unwrap_or("credit transfer");
                self.transfers.adjust(&caller, target, amount, note).await?;
                Ok(())
            }
            OpKind::Campaign => {
                let owner = self
                    .store
                    .account_by_email(&record.account)
                    .await?
                    .ok_or_else(|| LedgerError::AccountNotFound(record.account.clone()))?;
                let label = record.target.clone().ok_or_else(|| {
                    LedgerError::Validation("campaign requires a label".to_string())
                })?;
                let count = record.amount.filter(|a| *a > 0).ok_or_else(|| {
                    LedgerError::Validation("campaign requires a recipient count".to_string())
                })?;
                // Only the recipient count affects the ledger, so the replay
                // synthesizes placeholder destinations.
                let draft = CampaignDraft {
                    title: record.note.clone().unwrap_or_else(|| label.clone()),
                    message: "replayed campaign".to_string(),
                    recipients: (1..=count).map(|i| format!("+1555{i:07}")).collect(),
                    uploads: vec![],
                };
                let created = self.lifecycle.create_campaign(&owner.id, draft).await?;
                self.campaigns.insert(label, created.campaign.id);
                Ok(())
            }
            OpKind::Status => {
                let caller = self.caller(&record.account).await?;
                let id = self.campaign_id(record.target.as_deref())?;
                let status: CampaignStatus = record
                    .note
                    .as_deref()
                    .ok_or_else(|| {
                        LedgerError::Validation("status requires a target status".to_string())
                    })?
                    .parse()?;
                self.lifecycle.transition(&caller, &id, status).await?;
                Ok(())
            }
            OpKind::Report => {
                let caller = self.caller(&record.account).await?;
                let id = self.campaign_id(record.target.as_deref())?;
                let body = record.note.clone().unwrap_or_default();
                self.lifecycle
                    .complete_with_report(&caller, &id, body.as_bytes(), "text/plain")
                    .await?;
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let store: LedgerStoreRef = match cli.db_path {
        Some(path) => open_persistent(path).into_diagnostic()?,
        None => Arc::new(InMemoryLedger::new()),
    };

    let mut replay = Replay::new(store.clone());

    let file = File::open(cli.input).into_diagnostic()?;
    for record in OpsReader::new(file).records() {
        match record {
            Ok(op) => {
                if let Err(e) = replay.apply(op).await {
                    eprintln!("Error applying operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let accounts = store.accounts().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = SummaryWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}
