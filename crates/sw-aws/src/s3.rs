//! S3 blob store

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use bytes::Bytes;
use sw_core::{BlobStore, StorageError, StorageResult};
use sw_model::EncryptionKeyId;
use tracing::debug;

/// Public URL of an object, as the provisioning service fetches templates
#[must_use]
pub fn object_url(bucket: &str, key: &str) -> String {
    format!("https://s3.amazonaws.com/{bucket}/{key}")
}

/// [`BlobStore`] over one S3 client
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        encryption: Option<&EncryptionKeyId>,
    ) -> StorageResult<()> {
        let size = body.len();
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body));
        if let Some(kms_key) = encryption {
            request = request
                .server_side_encryption(ServerSideEncryption::AwsKms)
                .ssekms_key_id(kms_key.as_str());
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::request("put_object", bucket, key, DisplayErrorContext(&e).to_string()))?;
        debug!(bucket, key, size, encrypted = encryption.is_some(), "put object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|service| service.is_no_such_key()) => {
                return Err(StorageError::not_found(bucket, key));
            }
            Err(e) => {
                return Err(StorageError::request(
                    "get_object",
                    bucket,
                    key,
                    DisplayErrorContext(&e).to_string(),
                ));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::request("get_object", bucket, key, e.to_string()))?;
        debug!(bucket, key, "got object");
        Ok(data.into_bytes())
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        object_url(bucket, key)
    }
}
