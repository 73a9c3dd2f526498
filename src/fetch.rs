//! Retrieval of the raw source tables.
//!
//! A [`SourceSpec`] names one tabular resource and how to reach it; the
//! [`FetchClient`] turns a spec into a [`Table`]. Remote sources are fetched
//! with a bounded timeout and no retries: a failed fetch aborts the run.

use crate::error::FetchError;
use crate::table::Table;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Where a source table lives and how to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Delimited text with a header row on the local filesystem.
    LocalCsv { name: String, path: PathBuf },
    /// Delimited text with a header row behind an HTTP endpoint.
    RemoteCsv { name: String, url: String },
    /// REST endpoint returning a JSON array of row objects.
    RestJson {
        name: String,
        url: String,
        api_key: String,
    },
}

impl SourceSpec {
    /// A CSV source at `location`, which is either an `http(s)://` URL or a
    /// local filesystem path.
    pub fn csv(name: &str, location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::RemoteCsv {
                name: name.to_string(),
                url: location.to_string(),
            }
        } else {
            Self::LocalCsv {
                name: name.to_string(),
                path: PathBuf::from(location),
            }
        }
    }

    /// A REST source returning a JSON array of row objects, authenticated
    /// with an API key.
    pub fn rest(name: &str, url: &str, api_key: &str) -> Self {
        Self::RestJson {
            name: name.to_string(),
            url: url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// The table name this source produces.
    pub fn name(&self) -> &str {
        match self {
            Self::LocalCsv { name, .. }
            | Self::RemoteCsv { name, .. }
            | Self::RestJson { name, .. } => name,
        }
    }

    /// Human-readable location, for logs.
    pub fn location(&self) -> String {
        match self {
            Self::LocalCsv { path, .. } => path.display().to_string(),
            Self::RemoteCsv { url, .. } | Self::RestJson { url, .. } => url.clone(),
        }
    }
}

/// HTTP client shared by the remote source kinds.
pub struct FetchClient {
    client: reqwest::Client,
}

impl FetchClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Retrieve one source table and normalize it to a [`Table`].
    pub async fn fetch(&self, spec: &SourceSpec) -> Result<Table, FetchError> {
        info!(source = spec.name(), location = %spec.location(), "Fetching source table");

        let table = match spec {
            SourceSpec::LocalCsv { name, path } => read_local_csv(name, path)?,
            SourceSpec::RemoteCsv { name, url } => self.fetch_remote_csv(name, url).await?,
            SourceSpec::RestJson { name, url, api_key } => {
                self.fetch_rest_rows(name, url, api_key).await?
            }
        };

        info!(
            source = table.name(),
            rows = table.row_count(),
            columns = table.column_count(),
            "Fetched source table"
        );
        Ok(table)
    }

    async fn fetch_remote_csv(&self, name: &str, url: &str) -> Result<Table, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status,
            });
        }

        let content = response.text().await?;
        Table::from_csv(name, &content)
    }

    async fn fetch_rest_rows(
        &self,
        name: &str,
        url: &str,
        api_key: &str,
    ) -> Result<Table, FetchError> {
        let response = self
            .client
            .get(url)
            .header("apikey", api_key)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await?;
        let rows: Value = serde_json::from_str(&body)?;
        Table::from_json_rows(name, &rows)
    }
}

fn read_local_csv(name: &str, path: &Path) -> Result<Table, FetchError> {
    let content = fs::read_to_string(path).map_err(|source| FetchError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Table::from_csv(name, &content)
}
