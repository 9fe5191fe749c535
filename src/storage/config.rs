//! Connection settings for Supabase Storage
//!
//! Values come from the process environment:
//! - `SUPABASE_URL` - project URL, e.g. `https://abcd.supabase.co`
//! - `SUPABASE_KEY` - project API key
//! - `SUPABASE_S3_ACCESS_KEY_ID` / `SUPABASE_S3_SECRET_ACCESS_KEY` - S3 protocol credentials
//! - `SUPABASE_S3_REGION` - optional, defaults to `us-east-1`
//! - `SUPABASE_S3_ENDPOINT` - optional override of `{SUPABASE_URL}/storage/v1/s3`

use url::Url;

use crate::error::ConfigError;

pub const ENV_URL: &str = "SUPABASE_URL";
pub const ENV_KEY: &str = "SUPABASE_KEY";
pub const ENV_ACCESS_KEY_ID: &str = "SUPABASE_S3_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "SUPABASE_S3_SECRET_ACCESS_KEY";
pub const ENV_REGION: &str = "SUPABASE_S3_REGION";
pub const ENV_ENDPOINT: &str = "SUPABASE_S3_ENDPOINT";

pub const DEFAULT_REGION: &str = "us-east-1";

/// Everything needed to build a storage client
#[derive(Clone)]
pub struct StorageConfig {
    /// Project URL, also the base for public object URLs
    pub project_url: Url,
    pub api_key: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    /// S3 protocol endpoint
    pub endpoint_url: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("project_url", &self.project_url.as_str())
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

impl StorageConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let project_url = parse_project_url(ENV_URL, &required(ENV_URL)?)?;
        let api_key = required(ENV_KEY)?;
        let access_key_id = required(ENV_ACCESS_KEY_ID)?;
        let secret_access_key = required(ENV_SECRET_ACCESS_KEY)?;

        let region = lookup(ENV_REGION)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let endpoint_url = match lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            Some(endpoint) => endpoint,
            None => s3_endpoint(&project_url),
        };

        Ok(Self {
            project_url,
            api_key,
            access_key_id,
            secret_access_key,
            region,
            endpoint_url,
        })
    }
}

/// Parse and check a project URL taken from variable `name`
pub(crate) fn parse_project_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme(name)),
    }
}

/// S3 protocol endpoint of a Supabase project
fn s3_endpoint(project_url: &Url) -> String {
    format!("{}/storage/v1/s3", project_url.as_str().trim_end_matches('/'))
}
