//! MinIO/S3-compatible photo store built on rust-s3.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use tracing::{debug, info, warn};

use super::sigv4::{self, SigningParams};
use super::{PhotoStorage, StorageError};
use crate::core::config::MinIOConfig;

pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    config: MinIOConfig,
    http_client: Client,
}

impl MinIOClient {
    /// Connect to the bucket, creating it and its public-read policy when missing
    pub async fn new(config: MinIOConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("Invalid MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| StorageError::Config(format!("Invalid MinIO bucket: {}", e)))?;
        // MinIO expects http://endpoint/bucket rather than virtual-host style
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            bucket,
            region,
            credentials,
            config,
            http_client,
        };

        client.ensure_bucket_exists().await;
        client.set_public_read_policy().await;

        info!(
            "MinIO photo store ready: endpoint={}, bucket={}, prefix={}",
            client.config.endpoint,
            client.bucket.name(),
            client.config.public_prefix
        );

        Ok(client)
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    async fn ensure_bucket_exists(&self) {
        let created = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => info!("Bucket '{}' created", self.bucket.name()),
            Err(e) => {
                let message = e.to_string();
                if message.contains("BucketAlreadyOwnedByYou")
                    || message.contains("BucketAlreadyExists")
                    || message.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    /// Allow anonymous GET on `{public_prefix}/*` so photo URLs render in clients
    async fn set_public_read_policy(&self) {
        let bucket_name = self.bucket.name();
        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": {"AWS": "*"},
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{}/{}/*", bucket_name, self.config.public_prefix)]
            }]
        })
        .to_string();

        match self.put_bucket_policy(&bucket_name, &policy).await {
            Ok(()) => info!(
                "Public read policy set for {}/{}/*",
                bucket_name, self.config.public_prefix
            ),
            Err(e) => warn!(
                "Failed to set bucket policy for '{}': {}. Set it manually with: mc anonymous set download minio/{}/{}",
                bucket_name, e, bucket_name, self.config.public_prefix
            ),
        }
    }

    async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<(), StorageError> {
        let endpoint = Url::parse(&self.config.endpoint)
            .map_err(|e| StorageError::Config(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint
            .host_str()
            .ok_or_else(|| StorageError::Config("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let params = SigningParams {
            access_key: &self.config.access_key,
            secret_key: &self.config.secret_key,
            region: &self.config.region,
            service: "s3",
        };
        let signed = sigv4::sign(
            &params,
            "PUT",
            &host_header,
            &format!("/{}", bucket_name),
            "policy=",
            policy.as_bytes(),
            Utc::now(),
        )?;

        let response = self
            .http_client
            .put(format!("{}/{}?policy", self.config.endpoint, bucket_name))
            .header("Host", &host_header)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| StorageError::Config(format!("Policy request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Config(format!(
            "Bucket policy rejected: {} - {}",
            status, body
        )))
    }
}

#[async_trait]
impl PhotoStorage for MinIOClient {
    fn prefix(&self) -> &str {
        &self.config.public_prefix
    }

    fn url_for(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.public_endpoint.trim_end_matches('/'),
            self.bucket.name(),
            key
        )
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| StorageError::Upload(key.to_string(), e.to_string()))?;

        if !(200..300).contains(&response.status_code()) {
            return Err(StorageError::Upload(
                key.to_string(),
                format!("status {}", response.status_code()),
            ));
        }

        debug!("Stored photo '{}' ({} bytes)", key, data.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Delete(key.to_string(), e.to_string()))?;

        if response.status_code() == 404 {
            return Err(StorageError::NotFound(key.to_string()));
        }

        debug!("Removed photo '{}'", key);
        Ok(())
    }
}
