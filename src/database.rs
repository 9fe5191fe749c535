//! Supabase database access through the PostgREST API

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;
use crate::storage::config::{parse_project_url, ENV_KEY, ENV_URL};

/// Table access for a Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseDb {
    http: reqwest::Client,
    rest_url: Url,
}

impl SupabaseDb {
    /// Build a client from `SUPABASE_URL` and `SUPABASE_KEY`
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(ENV_URL).map_err(|_| ConfigError::MissingVar(ENV_URL))?;
        let key = std::env::var(ENV_KEY).map_err(|_| ConfigError::MissingVar(ENV_KEY))?;
        Self::new(&url, &key)
    }

    pub fn new(project_url: &str, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar(ENV_KEY).into());
        }

        let rest_url = rest_endpoint(parse_project_url(ENV_URL, project_url)?)?;

        let mut headers = HeaderMap::new();
        let mut key_header =
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
        key_header.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("API key is not a valid header value")?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key_header);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, rest_url })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        let mut url = self.rest_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("REST endpoint {} cannot take a path", self.rest_url))?
            .pop_if_empty()
            .push(table);
        Ok(url)
    }

    /// All rows of `table`
    pub async fn fetch(&self, table: &str) -> Result<Vec<Value>> {
        let url = self.table_url(table)?;
        tracing::debug!(table, "Fetching rows");

        let rows = self
            .http
            .get(url)
            .query(&[("select", "*")])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await?;

        tracing::debug!(table, count = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// Insert `rows` into `table`, returning the stored rows
    pub async fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>> {
        let url = self.table_url(table)?;
        tracing::info!(table, count = rows.len(), "Inserting rows");

        let inserted = self
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await?;

        Ok(inserted)
    }
}

/// `{project}/rest/v1/`, keeping any path the project URL already has
fn rest_endpoint(mut project_url: Url) -> Result<Url> {
    project_url.set_query(None);
    project_url.set_fragment(None);
    project_url
        .path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Project URL cannot take a path"))?
        .pop_if_empty()
        .extend(["rest", "v1", ""]);
    Ok(project_url)
}
