use crate::domain::campaign::StorageProvider;
use crate::domain::ports::{BlobStore, StoredObject};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory blob store. The default upload target for the replay CLI and
/// the test suites.
#[derive(Default, Clone)]
pub struct InMemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, StoredBlob>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: raw bytes and content type for a stored key.
    pub async fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|blob| (blob.bytes.clone(), blob.content_type.clone()))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn provider(&self) -> StorageProvider {
        StorageProvider::Memory
    }

    async fn put_object(&self, bytes: &[u8], content_type: &str) -> Result<StoredObject> {
        let key = Uuid::new_v4().to_string();
        let mut objects = self.objects.write().await;
        objects.insert(
            key.clone(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(StoredObject {
            url: format!("memory://{key}"),
            key,
        })
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let objects = self.objects.read().await;
        if !objects.contains_key(key) {
            return Err(LedgerError::MediaNotFound(key.to_string()));
        }
        Ok(format!("memory://{key}?expires={}", ttl.as_secs()))
    }
}

/// Filesystem blob store: one file per object under a root directory.
#[derive(Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn provider(&self) -> StorageProvider {
        StorageProvider::Local
    }

    async fn put_object(&self, bytes: &[u8], _content_type: &str) -> Result<StoredObject> {
        tokio::fs::create_dir_all(&self.root).await?;
        let key = Uuid::new_v4().to_string();
        let path = self.root.join(&key);
        tokio::fs::write(&path, bytes).await?;
        Ok(StoredObject {
            url: format!("file://{}", path.display()),
            key,
        })
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let path = self.root.join(key);
        if !tokio::fs::try_exists(&path).await? {
            return Err(LedgerError::MediaNotFound(key.to_string()));
        }
        Ok(format!("file://{}?expires={}", path.display(), ttl.as_secs()))
    }
}
