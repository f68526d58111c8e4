use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use sw_core::{BlobStore, StorageError, StorageResult};
use sw_model::EncryptionKeyId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub encryption: Option<EncryptionKeyId>,
}

/// In-memory blob store keyed by `bucket/key`
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    puts: Mutex<Vec<String>>,
}

fn path(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a put
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects.lock().insert(
            path(bucket, key),
            StoredObject {
                body: body.into(),
                encryption: None,
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects.lock().get(&path(bucket, key)).cloned()
    }

    pub fn body_string(&self, bucket: &str, key: &str) -> Option<String> {
        self.object(bucket, key)
            .map(|object| String::from_utf8_lossy(&object.body).into_owned())
    }

    /// Every `bucket/key` put, in call order
    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().len()
    }

    /// Puts whose key contains `fragment`
    pub fn puts_matching(&self, fragment: &str) -> Vec<String> {
        self.puts
            .lock()
            .iter()
            .filter(|key| key.contains(fragment))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        encryption: Option<&EncryptionKeyId>,
    ) -> StorageResult<()> {
        let path = path(bucket, key);
        self.puts.lock().push(path.clone());
        self.objects.lock().insert(
            path,
            StoredObject {
                body,
                encryption: encryption.cloned(),
            },
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        self.object(bucket, key)
            .map(|object| object.body)
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("https://s3.amazonaws.com/{bucket}/{key}")
    }
}
