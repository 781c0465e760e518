use crate::domain::account::AccountId;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(String);

impl CampaignId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
}

impl CampaignStatus {
    /// Transition table for the status workflow. Single source of truth:
    /// every status check in the lifecycle engine goes through here.
    ///
    /// `completed` is reachable only through report submission, never through
    /// a plain status update, and both `completed` and `rejected` are
    /// terminal. Un-rejecting a campaign is not supported.
    pub fn allows(&self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Rejected) | (Processing, Rejected)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Rejected)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Processing => "processing",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl FromStr for CampaignStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CampaignStatus::Pending),
            "processing" => Ok(CampaignStatus::Processing),
            "completed" => Ok(CampaignStatus::Completed),
            "rejected" => Ok(CampaignStatus::Rejected),
            other => Err(LedgerError::Validation(format!(
                "unknown campaign status: {other}"
            ))),
        }
    }
}

/// Blob-store backend an attachment was stored with. Selected once at the
/// boundary; the core only consults it when resolving a stored key back to
/// a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Memory,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(String);

impl MediaId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored attachment reference, recorded at campaign creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub url: String,
    pub key: String,
    pub content_type: String,
    pub provider: StorageProvider,
}

/// Completion artifact attached when an admin submits the delivery report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub url: String,
    pub key: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: AccountId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub owner: AccountId,
    pub title: String,
    pub message: String,
    pub recipients: Vec<String>,
    pub status: CampaignStatus,
    pub media: Vec<MediaItem>,
    pub report: Option<Report>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(
        owner: AccountId,
        title: impl Into<String>,
        message: impl Into<String>,
        recipients: Vec<String>,
        media: Vec<MediaItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CampaignId::new(),
            owner,
            title: title.into(),
            message: message.into(),
            recipients,
            status: CampaignStatus::Pending,
            media,
            report: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Credits held by this campaign: one credit per recipient slot.
    pub fn cost(&self) -> u64 {
        self.recipients.len() as u64
    }
}
