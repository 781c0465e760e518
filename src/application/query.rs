use crate::domain::account::{Account, AccountId, Role};
use crate::domain::campaign::{Campaign, CampaignStatus};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    CreatedDesc,
    CreatedAsc,
}

#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            sort: SortOrder::default(),
        }
    }
}

impl ListParams {
    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

/// Ledger entry joined with the counterparty account for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub entry: Transaction,
    pub counterparty_email: Option<String>,
}

/// Non-admin account together with its campaigns, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountCampaigns {
    pub account: Account,
    pub campaigns: Vec<Campaign>,
}

/// Count and slice come from the same filtered, sorted view so the totals
/// never drift from the returned page.
fn paginate<T>(items: Vec<T>, params: &ListParams) -> PageOf<T> {
    let page = params.page.max(1);
    let limit = params.limit.max(1);
    let total_items = items.len() as u64;
    let total_pages = total_items.div_ceil(limit);
    let items = items
        .into_iter()
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .collect();
    PageOf {
        items,
        current_page: page,
        total_pages,
        total_items,
    }
}

/// Read-only listings over campaigns and the transaction log. No invariants
/// beyond correct filter/sort/paginate composition.
pub struct QueryService {
    store: LedgerStoreRef,
}

impl QueryService {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    pub async fn campaigns(
        &self,
        params: &ListParams,
        status: Option<CampaignStatus>,
        owner: Option<&AccountId>,
    ) -> Result<PageOf<Campaign>> {
        let mut items = self.store.campaigns().await?;
        if let Some(status) = status {
            items.retain(|c| c.status == status);
        }
        if let Some(owner) = owner {
            items.retain(|c| &c.owner == owner);
        }
        if let Some(term) = &params.search {
            let term = term.to_lowercase();
            items.retain(|c| {
                c.title.to_lowercase().contains(&term)
                    || c.message.to_lowercase().contains(&term)
            });
        }
        // id tiebreak keeps ordering stable for entries sharing a timestamp
        items.sort_by(|a, b| (a.created_at, a.id.as_str()).cmp(&(b.created_at, b.id.as_str())));
        if params.sort == SortOrder::CreatedDesc {
            items.reverse();
        }
        Ok(paginate(items, params))
    }

    pub async fn transactions(
        &self,
        params: &ListParams,
        kind: Option<TransactionKind>,
        actor: Option<&AccountId>,
    ) -> Result<PageOf<TransactionView>> {
        let emails: HashMap<AccountId, String> = self
            .store
            .accounts()
            .await?
            .into_iter()
            .map(|a| (a.id, a.email))
            .collect();

        let mut items: Vec<TransactionView> = self
            .store
            .transactions()
            .await?
            .into_iter()
            .map(|entry| TransactionView {
                counterparty_email: emails.get(&entry.counterparty).cloned(),
                entry,
            })
            .collect();

        if let Some(kind) = kind {
            items.retain(|v| v.entry.kind == kind);
        }
        if let Some(actor) = actor {
            items.retain(|v| &v.entry.actor == actor);
        }
        if let Some(term) = &params.search {
            let term = term.to_lowercase();
            items.retain(|v| {
                v.entry.description.to_lowercase().contains(&term)
                    || v.counterparty_email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&term))
            });
        }
        items.sort_by(|a, b| {
            (a.entry.created_at, a.entry.id.as_str())
                .cmp(&(b.entry.created_at, b.entry.id.as_str()))
        });
        if params.sort == SortOrder::CreatedDesc {
            items.reverse();
        }
        Ok(paginate(items, params))
    }

    /// Every non-admin account with its campaigns, newest first.
    pub async fn accounts_overview(&self) -> Result<Vec<AccountCampaigns>> {
        let mut accounts = self.store.accounts().await?;
        accounts.retain(|a| a.role != Role::Admin);
        accounts.sort_by(|a, b| a.email.cmp(&b.email));

        let campaigns = self.store.campaigns().await?;
        Ok(accounts
            .into_iter()
            .map(|account| {
                let mut owned: Vec<Campaign> = campaigns
                    .iter()
                    .filter(|c| c.owner == account.id)
                    .cloned()
                    .collect();
                owned.sort_by(|a, b| {
                    (b.created_at, b.id.as_str()).cmp(&(a.created_at, a.id.as_str()))
                });
                AccountCampaigns {
                    account,
                    campaigns: owned,
                }
            })
            .collect())
    }
}
