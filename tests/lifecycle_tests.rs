mod common;

use campwire::application::lifecycle::{CampaignDraft, CampaignLifecycleEngine, MediaUpload};
use campwire::domain::account::{AccountId, Caller, Credits, Role};
use campwire::domain::campaign::CampaignStatus;
use campwire::domain::ports::LedgerStore;
use campwire::domain::transaction::TransactionKind;
use campwire::error::LedgerError;
use campwire::infrastructure::blob::InMemoryBlobStore;
use campwire::infrastructure::in_memory::InMemoryLedger;
use common::seed_account;
use std::sync::Arc;
use std::time::Duration;

fn engine(store: &InMemoryLedger) -> CampaignLifecycleEngine {
    CampaignLifecycleEngine::new(Arc::new(store.clone()), Arc::new(InMemoryBlobStore::new()))
}

fn draft(recipients: usize) -> CampaignDraft {
    CampaignDraft {
        title: "spring sale".to_string(),
        message: "20% off this week".to_string(),
        recipients: (1..=recipients).map(|i| format!("+1555000{i:04}")).collect(),
        uploads: vec![],
    }
}

fn admin_caller() -> Caller {
    Caller::new(AccountId::new(), Role::Admin)
}

#[tokio::test]
async fn test_create_campaign_debits_hold() {
    let store = InMemoryLedger::new();
    let owner = seed_account(&store, "maya", "maya@acme.io", Role::User, 20).await;
    let engine = engine(&store);

    let created = engine.create_campaign(&owner.id, draft(5)).await.unwrap();

    assert_eq!(created.owner_balance, Credits::new(15));
    assert_eq!(created.campaign.status, CampaignStatus::Pending);
    assert_eq!(created.campaign.cost(), 5);

    let holds: Vec<_> = store
        .transactions()
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.description.starts_with("campaign hold"))
        .collect();
    assert_eq!(holds.len(), 1);
    assert_eq!(holds[0].kind, TransactionKind::Debit);
    assert_eq!(holds[0].amount.value(), 5);
    assert!(holds[0].is_self_referential());
}

#[tokio::test]
async fn test_rejection_refunds_hold() {
    let store = InMemoryLedger::new();
    let owner = seed_account(&store, "maya", "maya@acme.io", Role::User, 20).await;
    let engine = engine(&store);

    let created = engine.create_campaign(&owner.id, draft(5)).await.unwrap();
    assert_eq!(created.owner_balance, Credits::new(15));

    let rejected = engine
        .transition(&admin_caller(), &created.campaign.id, CampaignStatus::Rejected)
        .await
        .unwrap();
    assert_eq!(rejected.status, CampaignStatus::Rejected);

    assert_eq!(
        store.account(&owner.id).await.unwrap().unwrap().credits,
        Credits::new(20)
    );
    let refund = store
        .transactions()
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.description == "refund: campaign rejected")
        .unwrap();
    assert_eq!(refund.kind, TransactionKind::Credit);
    assert_eq!(refund.amount.value(), 5);
    assert!(refund.is_self_referential());
}

#[tokio::test]
async fn test_rejected_campaign_is_locked() {
    let store = InMemoryLedger::new();
    let owner = seed_account(&store, "maya", "maya@acme.io", Role::User, 20).await;
    let engine = engine(&store);
    let admin = admin_caller();

    let created = engine.create_campaign(&owner.id, draft(5)).await.unwrap();
    engine
        .transition(&admin, &created.campaign.id, CampaignStatus::Rejected)
        .await
        .unwrap();

    let entries_before = store.transactions().await.unwrap().len();
    let err = engine
        .transition(&admin, &created.campaign.id, CampaignStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));

    assert_eq!(store.transactions().await.unwrap().len(), entries_before);
    assert_eq!(
        store.account(&owner.id).await.unwrap().unwrap().credits,
        Credits::new(20)
    );
    let campaign = store.campaign(&created.campaign.id).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Rejected);
}

#[tokio::test]
async fn test_full_completion_flow() {
    let store = InMemoryLedger::new();
    let owner = seed_account(&store, "maya", "maya@acme.io", Role::User, 20).await;
    let engine = engine(&store);
    let admin = admin_caller();

    let created = engine.create_campaign(&owner.id, draft(5)).await.unwrap();
    engine
        .transition(&admin, &created.campaign.id, CampaignStatus::Processing)
        .await
        .unwrap();
    let completed = engine
        .complete_with_report(&admin, &created.campaign.id, b"delivered: 5/5", "text/csv")
        .await
        .unwrap();

    assert_eq!(completed.status, CampaignStatus::Completed);
    let report = completed.report.expect("report attached");
    assert_eq!(report.uploaded_by, admin.account);

    // completion settles the hold: no refund, no further movement
    assert_eq!(
        store.account(&owner.id).await.unwrap().unwrap().credits,
        Credits::new(15)
    );

    // terminal: rejecting a completed campaign fails
    let err = engine
        .transition(&admin, &created.campaign.id, CampaignStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_report_requires_processing() {
    let store = InMemoryLedger::new();
    let owner = seed_account(&store, "maya", "maya@acme.io", Role::User, 20).await;
    let engine = engine(&store);

    let created = engine.create_campaign(&owner.id, draft(2)).await.unwrap();
    let err = engine
        .complete_with_report(&admin_caller(), &created.campaign.id, b"x", "text/csv")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));
}

#[tokio::test]
async fn test_non_admin_cannot_transition() {
    let store = InMemoryLedger::new();
    let owner = seed_account(&store, "maya", "maya@acme.io", Role::User, 20).await;
    let engine = engine(&store);

    let created = engine.create_campaign(&owner.id, draft(2)).await.unwrap();
    let err = engine
        .transition(
            &Caller::for_account(&owner),
            &created.campaign.id,
            CampaignStatus::Processing,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    let err = engine
        .complete_with_report(
            &Caller::for_account(&owner),
            &created.campaign.id,
            b"x",
            "text/csv",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
}

#[tokio::test]
async fn test_media_upload_and_resolution() {
    let store = InMemoryLedger::new();
    let owner = seed_account(&store, "maya", "maya@acme.io", Role::User, 20).await;
    let blob = Arc::new(InMemoryBlobStore::new());
    let engine = CampaignLifecycleEngine::new(Arc::new(store.clone()), blob.clone());

    let mut with_media = draft(2);
    with_media.uploads = vec![
        MediaUpload {
            bytes: b"jpeg".to_vec(),
            content_type: "image/jpeg".to_string(),
        },
        MediaUpload {
            bytes: b"mp4".to_vec(),
            content_type: "video/mp4".to_string(),
        },
    ];

    let created = engine.create_campaign(&owner.id, with_media).await.unwrap();
    assert_eq!(created.campaign.media.len(), 2);

    for item in &created.campaign.media {
        let (bytes, content_type) = blob.object(&item.key).await.unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&content_type, &item.content_type);

        let url = engine
            .media_url(&created.campaign.id, &item.id, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.contains(&item.key));
    }
}
