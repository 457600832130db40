use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::config::Config;
use crate::errors::StorageError;
use crate::storage::{validate_key, ReportStorage, StorageMode};

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Objects in an S3-compatible bucket.
///
/// The prefix applies on save only; load and delete take the key exactly as
/// `save` returned it, so stored keys already carry the prefix.
#[derive(Debug, Clone)]
pub struct BucketStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: Option<String>,
}

impl BucketStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, prefix: Option<String>) -> Self {
        let prefix = prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        Self {
            client,
            bucket,
            prefix,
        }
    }

    /// Key an object is written under.
    pub fn object_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl ReportStorage for BucketStorage {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        validate_key(key)?;
        let object_key = self.object_key(key.trim());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(PDF_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed: {e}")))?;

        info!("Uploaded PDF to s3://{}/{}", self.bucket, object_key);
        Ok(object_key)
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3(format!("download failed: {e}"))
                }
            })?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("body read failed: {e}")))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete failed: {e}")))?;
        Ok(())
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Bucket
    }
}

/// Constructs an S3 client for MinIO (local) or AWS (production). Static
/// credentials are used when both keys are configured; otherwise the default
/// provider chain applies.
pub async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()));

    if let (Some(access_key), Some(secret_key)) =
        (&config.aws_access_key_id, &config.aws_secret_access_key)
    {
        let credentials = Credentials::new(access_key, secret_key, None, None, "arcana-static");
        loader = loader.credentials_provider(credentials);
    }
    if let Some(endpoint) = &config.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
