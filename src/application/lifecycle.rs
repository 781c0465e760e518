use crate::domain::account::{AccountId, Amount, Caller, Credits};
use crate::domain::campaign::{
    Campaign, CampaignId, CampaignStatus, MediaId, MediaItem, Report, StorageProvider,
};
use crate::domain::ports::{BlobStoreRef, LedgerStoreRef, WriteUnit};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// Media payload handed in by the boundary layer for upload.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct CampaignDraft {
    pub title: String,
    pub message: String,
    pub recipients: Vec<String>,
    pub uploads: Vec<MediaUpload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedCampaign {
    pub campaign: Campaign,
    pub owner_balance: Credits,
}

/// Owns campaign creation (credit hold) and the status workflow.
///
/// Every mutation is one atomic unit against the ledger store: the credit
/// hold, its self-referential ledger entry and the campaign record commit or
/// roll back together. Blob uploads happen before the unit and are validated
/// first, so a storage failure never leaves a half-created campaign.
pub struct CampaignLifecycleEngine {
    store: LedgerStoreRef,
    blobs: HashMap<StorageProvider, BlobStoreRef>,
    uploads_via: StorageProvider,
}

impl CampaignLifecycleEngine {
    /// `primary` is the blob store new uploads go to. Additional providers
    /// can be registered for resolving previously stored references.
    pub fn new(store: LedgerStoreRef, primary: BlobStoreRef) -> Self {
        let uploads_via = primary.provider();
        let mut blobs = HashMap::new();
        blobs.insert(uploads_via, primary);
        Self {
            store,
            blobs,
            uploads_via,
        }
    }

    pub fn register_blob_store(&mut self, blob: BlobStoreRef) {
        self.blobs.insert(blob.provider(), blob);
    }

    fn blob(&self, provider: StorageProvider) -> Result<&BlobStoreRef> {
        self.blobs.get(&provider).ok_or_else(|| {
            LedgerError::internal(format!("no blob store registered for {provider:?}"))
        })
    }

    /// Creates a campaign in `pending`, debiting one credit per recipient
    /// from the owner as a hold. The balance check runs before any mutation;
    /// the authoritative guard is re-evaluated inside the commit.
    pub async fn create_campaign(
        &self,
        owner: &AccountId,
        draft: CampaignDraft,
    ) -> Result<CreatedCampaign> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(LedgerError::Validation("title is required".to_string()));
        }
        if draft.message.trim().is_empty() {
            return Err(LedgerError::Validation("message is required".to_string()));
        }
        if draft.recipients.is_empty() {
            return Err(LedgerError::Validation(
                "at least one recipient is required".to_string(),
            ));
        }
        let cost = Amount::new(draft.recipients.len() as u64)?;

        let account = self
            .store
            .account(owner)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(owner.to_string()))?;
        if !account.credits.can_cover(cost) {
            warn!(owner = %owner, required = cost.value(), "campaign creation rejected");
            return Err(LedgerError::InsufficientCredits {
                account: owner.to_string(),
                required: cost.value(),
                available: account.credits.value(),
            });
        }

        // Uploads are outside the transactional boundary; a failure here
        // aborts before any ledger write.
        let blob = self.blob(self.uploads_via)?;
        let mut media = Vec::with_capacity(draft.uploads.len());
        for upload in &draft.uploads {
            let stored = blob.put_object(&upload.bytes, &upload.content_type).await?;
            media.push(MediaItem {
                id: MediaId::new(),
                url: stored.url,
                key: stored.key,
                content_type: upload.content_type.clone(),
                provider: blob.provider(),
            });
        }

        let campaign = Campaign::new(
            owner.clone(),
            title,
            draft.message.clone(),
            draft.recipients.clone(),
            media,
        );
        let hold = Transaction::self_entry(
            owner,
            TransactionKind::Debit,
            cost,
            &format!("campaign hold: {title}"),
        );
        let unit = WriteUnit::new()
            .debit_guarded(owner.clone(), cost)
            .append(hold)
            .insert_campaign(campaign.clone());

        let receipt = self.store.commit(unit).await?;
        info!(campaign = %campaign.id, owner = %owner, cost = cost.value(), "campaign created");

        Ok(CreatedCampaign {
            owner_balance: receipt.balance_of(owner)?,
            campaign,
        })
    }

    /// Admin-only status transition. Rejection refunds the held credits to
    /// the owner in the same unit; the status write is guarded on the status
    /// observed here, so a lost race surfaces as `Conflict` with no partial
    /// update.
    pub async fn transition(
        &self,
        caller: &Caller,
        id: &CampaignId,
        new_status: CampaignStatus,
    ) -> Result<Campaign> {
        caller.require_admin()?;

        let campaign = self
            .store
            .campaign(id)
            .await?
            .ok_or_else(|| LedgerError::CampaignNotFound(id.to_string()))?;
        if !campaign.status.allows(new_status) {
            return Err(LedgerError::InvalidTransition {
                from: campaign.status.to_string(),
                to: new_status.to_string(),
            });
        }

        let observed = campaign.status;
        let mut updated = campaign.clone();
        updated.status = new_status;
        updated.updated_at = Utc::now();

        let mut unit = WriteUnit::new();
        if new_status == CampaignStatus::Rejected {
            let refund = Amount::new(campaign.cost())?;
            // resolve the owner up front; a dangling reference must abort
            // before the unit is built
            self.store
                .account(&campaign.owner)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(campaign.owner.to_string()))?;
            unit = unit
                .credit(campaign.owner.clone(), refund)
                .append(Transaction::self_entry(
                    &campaign.owner,
                    TransactionKind::Credit,
                    refund,
                    "refund: campaign rejected",
                ));
            info!(
                campaign = %id,
                owner = %campaign.owner,
                refund = refund.value(),
                "campaign rejected, credits refunded"
            );
        }
        let unit = unit.update_campaign(observed, updated.clone());

        self.store.commit(unit).await?;
        Ok(updated)
    }

    /// Admin-only completion: uploads the delivery report, then atomically
    /// attaches it and moves the campaign from `processing` to `completed`.
    /// No credit movement; the cost was settled at creation.
    pub async fn complete_with_report(
        &self,
        caller: &Caller,
        id: &CampaignId,
        report_bytes: &[u8],
        content_type: &str,
    ) -> Result<Campaign> {
        caller.require_admin()?;

        let campaign = self
            .store
            .campaign(id)
            .await?
            .ok_or_else(|| LedgerError::CampaignNotFound(id.to_string()))?;
        if campaign.status != CampaignStatus::Processing {
            return Err(LedgerError::InvalidState(format!(
                "report submission requires a processing campaign, status is {}",
                campaign.status
            )));
        }

        let blob = self.blob(self.uploads_via)?;
        let stored = blob.put_object(report_bytes, content_type).await?;

        let mut updated = campaign;
        updated.report = Some(Report {
            url: stored.url,
            key: stored.key,
            uploaded_at: Utc::now(),
            uploaded_by: caller.account.clone(),
        });
        updated.status = CampaignStatus::Completed;
        updated.updated_at = Utc::now();

        let unit =
            WriteUnit::new().update_campaign(CampaignStatus::Processing, updated.clone());
        self.store.commit(unit).await?;
        info!(campaign = %id, "campaign completed with report");
        Ok(updated)
    }

    /// Resolves an attachment's stored key to a time-limited access URL via
    /// the blob store it was uploaded with.
    pub async fn media_url(
        &self,
        id: &CampaignId,
        media: &MediaId,
        ttl: Duration,
    ) -> Result<String> {
        let campaign = self
            .store
            .campaign(id)
            .await?
            .ok_or_else(|| LedgerError::CampaignNotFound(id.to_string()))?;
        let item = campaign
            .media
            .iter()
            .find(|m| &m.id == media)
            .ok_or_else(|| LedgerError::MediaNotFound(media.to_string()))?;
        self.blob(item.provider)?.signed_url(&item.key, ttl).await
    }
}
