//! Integration tests for the storage adapter using MinIO via testcontainers
//!
//! MinIO stands in for the Supabase Storage S3 endpoint. These tests require Docker
//! to be running.
//!
//! Run with: cargo test --test storage_integration
//!
//! Note: Tests are conditionally skipped if Docker is not available.

use std::io::Cursor;
use std::time::Duration;

use supabase_work::confirm::{Confirmer, Outcome};
use supabase_work::storage::config::{
    ENV_ACCESS_KEY_ID, ENV_ENDPOINT, ENV_KEY, ENV_SECRET_ACCESS_KEY, ENV_URL,
};
use supabase_work::{StorageConfig, SupabaseStorage};
use tempfile::TempDir;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::minio::MinIO;

/// MinIO default credentials
const MINIO_ACCESS_KEY: &str = "minioadmin";
const MINIO_SECRET_KEY: &str = "minioadmin";

/// Test helper to check if Docker is available
fn docker_available() -> bool {
    std::process::Command::new("docker")
        .arg("info")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Start MinIO and return the container with its endpoint URL
async fn start_minio() -> (ContainerAsync<MinIO>, String) {
    let container = MinIO::default()
        .with_env_var("MINIO_ROOT_USER", MINIO_ACCESS_KEY)
        .with_env_var("MINIO_ROOT_PASSWORD", MINIO_SECRET_KEY)
        .start()
        .await
        .expect("Failed to start MinIO container");

    let host = container.get_host().await.expect("Failed to get container host");
    let port = container.get_host_port_ipv4(9000).await.expect("Failed to get MinIO port");

    // Wait for MinIO to be ready
    tokio::time::sleep(Duration::from_secs(2)).await;

    (container, format!("http://{}:{}", host, port))
}

/// Storage adapter configured for MinIO
async fn connect(endpoint: &str) -> SupabaseStorage {
    let endpoint = endpoint.to_string();
    let config = StorageConfig::from_lookup(|name| match name {
        n if n == ENV_URL => Some("https://abcd.supabase.co".to_string()),
        n if n == ENV_KEY => Some("anon-key".to_string()),
        n if n == ENV_ACCESS_KEY_ID => Some(MINIO_ACCESS_KEY.to_string()),
        n if n == ENV_SECRET_ACCESS_KEY => Some(MINIO_SECRET_KEY.to_string()),
        n if n == ENV_ENDPOINT => Some(endpoint.clone()),
        _ => None,
    })
    .expect("Failed to build config");

    SupabaseStorage::connect(&config).await.expect("Failed to create storage client")
}

fn confirmer(answer: &str) -> Confirmer<Cursor<Vec<u8>>, Vec<u8>> {
    Confirmer::new(Cursor::new(answer.as_bytes().to_vec()), Vec::new())
}

/// Test bucket operations: create, list, retrieve
#[tokio::test]
async fn test_create_list_and_retrieve_buckets() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let storage = connect(&endpoint).await;

    storage.create_bucket("test-bucket-1", false).await.expect("Failed to create bucket 1");
    let created = storage
        .create_bucket("test-bucket-2", true)
        .await
        .expect("Failed to create bucket 2");
    assert_eq!(created.map(|b| b.name), Some("test-bucket-2".to_string()));

    let buckets = storage.available_buckets().await.expect("Failed to list buckets");
    let names: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
    assert!(names.contains(&"test-bucket-1"));
    assert!(names.contains(&"test-bucket-2"));

    let bucket = storage.retrieve_bucket("test-bucket-1").await.expect("Failed to get bucket");
    assert_eq!(bucket.name, "test-bucket-1");

    assert!(storage.retrieve_bucket("no-such-bucket").await.is_err());
}

/// Upload then download must give back byte-identical data
#[tokio::test]
async fn test_upload_download_round_trip() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let storage = connect(&endpoint).await;
    storage.create_bucket("data-bucket", false).await.expect("Failed to create bucket");

    let dir = TempDir::new().unwrap();
    let source = dir.path().join("payload.bin");
    let data: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    std::fs::write(&source, &data).unwrap();

    storage
        .upload_to_bucket(&source, "nested/payload.bin", "data-bucket")
        .await
        .expect("Failed to upload");

    let target = dir.path().join("downloaded.bin");
    storage
        .download_from_bucket("nested/payload.bin", "data-bucket", &target)
        .await
        .expect("Failed to download");

    assert_eq!(std::fs::read(&target).unwrap(), data);
}

/// Listing, moving and deleting files
#[tokio::test]
async fn test_list_move_and_delete_files() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let storage = connect(&endpoint).await;
    storage.create_bucket("files-bucket", false).await.unwrap();

    let dir = TempDir::new().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        let path = dir.path().join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        storage.upload_to_bucket(&path, name, "files-bucket").await.unwrap();
    }

    let mut files = storage.list_bucket_files("files-bucket").await.unwrap();
    files.sort();
    assert_eq!(files, vec!["a.txt", "b.txt", "c.txt"]);

    storage.move_file("files-bucket", "a.txt", "moved/a.txt").await.unwrap();
    let mut files = storage.list_bucket_files("files-bucket").await.unwrap();
    files.sort();
    assert_eq!(files, vec!["b.txt", "c.txt", "moved/a.txt"]);

    let target = dir.path().join("moved.txt");
    storage
        .download_from_bucket("moved/a.txt", "files-bucket", &target)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"a.txt");

    storage
        .delete_files_from_bucket("files-bucket", &["b.txt".to_string(), "c.txt".to_string()])
        .await
        .unwrap();
    let files = storage.list_bucket_files("files-bucket").await.unwrap();
    assert_eq!(files, vec!["moved/a.txt"]);
}

/// Declining keeps the bucket; confirming empties then deletes it
#[tokio::test]
async fn test_confirmed_empty_and_delete_bucket() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let storage = connect(&endpoint).await;
    storage.create_bucket("purge-me", false).await.unwrap();

    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        let path = dir.path().join(format!("file-{i}.txt"));
        std::fs::write(&path, format!("content {i}")).unwrap();
        storage
            .upload_to_bucket(&path, &format!("dir/file-{i}.txt"), "purge-me")
            .await
            .unwrap();
    }

    let outcome = storage
        .empty_bucket_confirmed(&mut confirmer("n\n"), "purge-me")
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(storage.list_bucket_files("purge-me").await.unwrap().len(), 5);

    let outcome = storage
        .empty_bucket_confirmed(&mut confirmer("y\n"), "purge-me")
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Executed(()));
    assert!(storage.list_bucket_files("purge-me").await.unwrap().is_empty());

    let outcome = storage
        .delete_bucket_confirmed(&mut confirmer("yes\n"), "purge-me")
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Executed(()));

    let names: Vec<String> = storage
        .available_buckets()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert!(!names.contains(&"purge-me".to_string()));
}

/// Signed URLs are fetchable without credentials until they expire
#[tokio::test]
async fn test_signed_and_public_urls() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let storage = connect(&endpoint).await;
    storage.create_bucket("url-bucket", false).await.unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hello.txt");
    std::fs::write(&path, b"hello signed world").unwrap();
    storage.upload_to_bucket(&path, "hello.txt", "url-bucket").await.unwrap();

    let signed = storage
        .create_signed_url("url-bucket", "hello.txt", 300)
        .await
        .expect("Failed to sign URL");
    assert!(signed.starts_with(&endpoint));
    assert!(signed.contains("X-Amz-Expires=300"));

    let body = reqwest::get(&signed)
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(body.as_ref(), b"hello signed world");

    let public = storage.retrieve_public_url("url-bucket", "hello.txt").await.unwrap();
    assert_eq!(
        public,
        "https://abcd.supabase.co/storage/v1/object/public/url-bucket/hello.txt"
    );
}
