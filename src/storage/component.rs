//! Storage adapter handed to work components
//!
//! Every method is a direct delegation to the backend. Destructive operations also
//! come in a `*_confirmed` form that asks the user first.

use std::io::{BufRead, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::confirm::{Confirmer, Outcome, PendingAction};
use crate::storage::backend::StorageBackend;
use crate::storage::client::StorageClient;
use crate::storage::config::StorageConfig;
use crate::storage::types::Bucket;

/// Bucket and object operations for a Supabase project
pub struct SupabaseStorage<B = StorageClient> {
    backend: B,
}

impl SupabaseStorage<StorageClient> {
    /// Connect using the given configuration
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        Ok(Self::new(StorageClient::new(config).await?))
    }
}

impl<B: StorageBackend> SupabaseStorage<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Buckets visible to the configured credentials
    pub async fn available_buckets(&self) -> Result<Vec<Bucket>> {
        let buckets = self.backend.list_buckets().await?;
        tracing::debug!(count = buckets.len(), "Listed buckets");
        Ok(buckets)
    }

    /// Create a bucket.
    ///
    /// With `fetch_descriptor` set, the new bucket is looked up afterwards and returned.
    pub async fn create_bucket(
        &self,
        bucket_name: &str,
        fetch_descriptor: bool,
    ) -> Result<Option<Bucket>> {
        tracing::info!(bucket = bucket_name, "Creating bucket");
        self.backend.create_bucket(bucket_name).await?;

        if fetch_descriptor {
            Ok(Some(self.backend.get_bucket(bucket_name).await?))
        } else {
            Ok(None)
        }
    }

    pub async fn retrieve_bucket(&self, bucket_name: &str) -> Result<Bucket> {
        self.backend.get_bucket(bucket_name).await
    }

    /// Time-limited URL for a private object; `expiry_secs` is the lifetime in seconds
    pub async fn create_signed_url(
        &self,
        bucket_name: &str,
        path: &str,
        expiry_secs: u64,
    ) -> Result<String> {
        tracing::debug!(bucket = bucket_name, path, expiry_secs, "Signing object URL");
        self.backend.create_signed_url(bucket_name, path, expiry_secs).await
    }

    /// URL of an object in a public bucket
    pub async fn retrieve_public_url(&self, bucket_name: &str, path: &str) -> Result<String> {
        self.backend.get_public_url(bucket_name, path).await
    }

    /// Names of the objects in a bucket
    pub async fn list_bucket_files(&self, bucket_name: &str) -> Result<Vec<String>> {
        let files = self.backend.list_objects(bucket_name).await?;
        tracing::debug!(bucket = bucket_name, count = files.len(), "Listed bucket files");
        Ok(files)
    }

    pub async fn delete_files_from_bucket(
        &self,
        bucket_name: &str,
        files: &[String],
    ) -> Result<()> {
        tracing::info!(bucket = bucket_name, count = files.len(), "Deleting files");
        self.backend.delete_objects(bucket_name, files).await
    }

    pub async fn move_file(&self, bucket_name: &str, from: &str, to: &str) -> Result<()> {
        tracing::info!(bucket = bucket_name, from, to, "Moving file");
        self.backend.move_object(bucket_name, from, to).await
    }

    pub async fn delete_bucket(&self, bucket_name: &str) -> Result<()> {
        tracing::info!(bucket = bucket_name, "Deleting bucket");
        self.backend.delete_bucket(bucket_name).await
    }

    pub async fn empty_bucket(&self, bucket_name: &str) -> Result<()> {
        tracing::info!(bucket = bucket_name, "Emptying bucket");
        self.backend.empty_bucket(bucket_name).await
    }

    /// Upload a local file.
    ///
    /// The source is opened first so a missing or unreadable file fails locally; the
    /// backend always receives the absolute path.
    pub async fn upload_to_bucket(
        &self,
        source: impl AsRef<Path>,
        destination: &str,
        bucket_name: &str,
    ) -> Result<()> {
        let source = source.as_ref();
        tokio::fs::File::open(source)
            .await
            .with_context(|| format!("Failed to open {:?} for upload", source))?;

        let absolute = std::path::absolute(source)
            .map(|path| normalize(&path))
            .with_context(|| format!("Failed to resolve {:?}", source))?;

        tracing::info!(bucket = bucket_name, destination, source = ?absolute, "Uploading file");
        self.backend.upload(bucket_name, destination, &absolute).await
    }

    /// Download an object and write its bytes verbatim to `destination`
    pub async fn download_from_bucket(
        &self,
        source: &str,
        bucket_name: &str,
        destination: impl AsRef<Path>,
    ) -> Result<()> {
        let destination = destination.as_ref();
        let data = self.backend.download(bucket_name, source).await?;

        tokio::fs::write(destination, &data)
            .await
            .with_context(|| format!("Failed to write {:?}", destination))?;

        tracing::info!(bucket = bucket_name, source, bytes = data.len(), "Downloaded file");
        Ok(())
    }

    pub async fn delete_bucket_confirmed<R: BufRead, W: Write>(
        &self,
        confirmer: &mut Confirmer<R, W>,
        bucket_name: &str,
    ) -> Result<Outcome<()>> {
        let assets = [bucket_name.to_string()];
        confirmer
            .confirm_and_execute_async(&PendingAction::new("delete", "bucket", &assets), || {
                self.delete_bucket(bucket_name)
            })
            .await
    }

    pub async fn empty_bucket_confirmed<R: BufRead, W: Write>(
        &self,
        confirmer: &mut Confirmer<R, W>,
        bucket_name: &str,
    ) -> Result<Outcome<()>> {
        let assets = [bucket_name.to_string()];
        confirmer
            .confirm_and_execute_async(&PendingAction::new("empty", "bucket", &assets), || {
                self.empty_bucket(bucket_name)
            })
            .await
    }

    pub async fn delete_files_confirmed<R: BufRead, W: Write>(
        &self,
        confirmer: &mut Confirmer<R, W>,
        bucket_name: &str,
        files: &[String],
    ) -> Result<Outcome<()>> {
        confirmer
            .confirm_and_execute_async(&PendingAction::new("delete", "file", files), || {
                self.delete_files_from_bucket(bucket_name, files)
            })
            .await
    }

    /// Moving overwrites `to` and removes `from`, so both are listed
    pub async fn move_file_confirmed<R: BufRead, W: Write>(
        &self,
        confirmer: &mut Confirmer<R, W>,
        bucket_name: &str,
        from: &str,
        to: &str,
    ) -> Result<Outcome<()>> {
        let assets = [from.to_string(), to.to_string()];
        confirmer
            .confirm_and_execute_async(&PendingAction::new("move", "file", &assets), || {
                self.move_file(bucket_name, from, to)
            })
            .await
    }
}

/// Drop `.` and fold `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(normalized.components().next_back(), Some(Component::RootDir) | None) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
