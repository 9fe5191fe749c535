//! The vendor calls the storage adapter delegates to

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::types::Bucket;

/// One method per vendor storage endpoint.
///
/// Implementations forward to the service and hand back whatever it returns;
/// errors are not translated.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<Bucket>>;

    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    async fn get_bucket(&self, bucket: &str) -> Result<Bucket>;

    async fn create_signed_url(&self, bucket: &str, path: &str, expires_in_secs: u64)
        -> Result<String>;

    async fn get_public_url(&self, bucket: &str, path: &str) -> Result<String>;

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>>;

    async fn move_object(&self, bucket: &str, from: &str, to: &str) -> Result<()>;

    async fn delete_objects(&self, bucket: &str, paths: &[String]) -> Result<()>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    async fn empty_bucket(&self, bucket: &str) -> Result<()>;

    /// Upload the file at `local_path` (always absolute) to `destination`
    async fn upload(&self, bucket: &str, destination: &str, local_path: &Path) -> Result<()>;

    async fn download(&self, bucket: &str, source: &str) -> Result<Vec<u8>>;
}
