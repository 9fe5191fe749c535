//! Storage data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Represents a storage bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub region: Option<String>,
}

impl Bucket {
    /// Bucket descriptor carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
            region: None,
        }
    }
}

/// Build the public URL of an object in a public bucket.
///
/// Supabase serves public objects under `/storage/v1/object/public/{bucket}/{path}`
/// relative to the project URL. Each path component is percent-encoded; empty
/// components (leading, trailing or doubled slashes) are dropped.
pub fn public_object_url(project_url: &Url, bucket: &str, path: &str) -> String {
    let mut url = project_url.clone();
    url.set_query(None);
    url.set_fragment(None);

    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["storage", "v1", "object", "public", bucket])
            .extend(path.split('/').filter(|s| !s.is_empty()));
    }

    url.to_string()
}
