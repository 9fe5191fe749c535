//! Supabase Storage access
//!
//! This module provides bucket and object functionality including:
//! - [`component::SupabaseStorage`] - The adapter work components hold
//! - [`backend::StorageBackend`] - The vendor calls the adapter delegates to
//! - [`client::StorageClient`] - S3 protocol implementation of the backend
//! - [`config::StorageConfig`] - Connection settings read from the environment

pub mod backend;
pub mod client;
pub mod component;
pub mod config;
pub mod types;

// Re-export commonly used types
pub use backend::StorageBackend;
pub use client::StorageClient;
pub use component::SupabaseStorage;
pub use config::StorageConfig;
pub use types::{public_object_url, Bucket};
