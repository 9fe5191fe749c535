//! Supabase Storage client over the S3 protocol

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use aws_sdk_s3::Client;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::storage::backend::StorageBackend;
use crate::storage::config::{StorageConfig, DEFAULT_REGION};
use crate::storage::types::{public_object_url, Bucket};

/// Largest batch accepted by a single DeleteObjects request
const DELETE_BATCH: usize = 1000;

/// Everything outside the unreserved set is escaped in a copy source
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Storage client holding the S3 handle for one Supabase project
#[derive(Clone, Debug)]
pub struct StorageClient {
    client: Client,
    project_url: Url,
    region: String,
}

impl StorageClient {
    /// Create a client for the given configuration
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "supabase",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(&config.endpoint_url)
            .force_path_style(true)
            .build();

        tracing::debug!(
            endpoint = %config.endpoint_url,
            region = %config.region,
            "Created storage client"
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
            project_url: config.project_url.clone(),
            region: config.region.clone(),
        })
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
        let response = self.client.list_objects_v2().bucket(bucket).send().await?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(|k| k.to_string()))
            .collect())
    }
}

/// Value of `x-amz-copy-source`: `bucket/key`, percent-encoded per path segment
fn copy_source(bucket: &str, key: &str) -> String {
    std::iter::once(bucket)
        .chain(key.split('/'))
        .map(|segment| utf8_percent_encode(segment, COPY_SOURCE).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl StorageBackend for StorageClient {
    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let response = self.client.list_buckets().send().await?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| Bucket {
                name: b.name().unwrap_or_default().to_string(),
                creation_date: b.creation_date().map(|d| {
                    chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                        .unwrap_or_default()
                }),
                region: None,
            })
            .collect();

        Ok(buckets)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);

        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await?;
        Ok(())
    }

    async fn get_bucket(&self, bucket: &str) -> Result<Bucket> {
        let response = self.client.head_bucket().bucket(bucket).send().await?;

        Ok(Bucket {
            name: bucket.to_string(),
            creation_date: None,
            region: response.bucket_region().map(|r| r.to_string()),
        })
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(path)
            .presigned(presigning)
            .await?;

        Ok(request.uri().to_string())
    }

    async fn get_public_url(&self, bucket: &str, path: &str) -> Result<String> {
        Ok(public_object_url(&self.project_url, bucket, path))
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        self.list_keys(bucket).await
    }

    async fn move_object(&self, bucket: &str, from: &str, to: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(bucket)
            .key(to)
            .copy_source(copy_source(bucket, from))
            .send()
            .await?;

        self.client
            .delete_object()
            .bucket(bucket)
            .key(from)
            .send()
            .await?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, paths: &[String]) -> Result<()> {
        for chunk in paths.chunks(DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()?;

            let response = self
                .client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await?;

            // quiet mode reports per-key failures in the body, not as a request error
            if let Some(first) = response.errors().first() {
                anyhow::bail!(
                    "{} of {} objects in {} were not deleted ({}: {})",
                    response.errors().len(),
                    chunk.len(),
                    bucket,
                    first.key().unwrap_or_default(),
                    first.message().unwrap_or("unknown error"),
                );
            }
        }

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client.delete_bucket().bucket(bucket).send().await?;
        Ok(())
    }

    async fn empty_bucket(&self, bucket: &str) -> Result<()> {
        loop {
            let keys = self.list_keys(bucket).await?;
            if keys.is_empty() {
                return Ok(());
            }
            tracing::debug!(bucket, count = keys.len(), "Removing objects from bucket");
            self.delete_objects(bucket, &keys).await?;
        }
    }

    async fn upload(&self, bucket: &str, destination: &str, local_path: &Path) -> Result<()> {
        let body = ByteStream::from_path(local_path).await?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(destination)
            .body(body)
            .send()
            .await?;

        Ok(())
    }

    async fn download(&self, bucket: &str, source: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(source)
            .send()
            .await?;

        let data = response.body.collect().await?;
        Ok(data.into_bytes().to_vec())
    }
}
