use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while retrieving or decoding a source table.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    BadStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected JSON shape in '{table}' response: {detail}")]
    JsonShape { table: String, detail: String },
    #[error("source '{table}' has no header row")]
    MissingHeader { table: String },
}

/// Failures while joining the two source tables.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("join key '{key}' is missing from the '{table}' table")]
    MissingKey { table: String, key: String },
    #[error("join key '{key}' is not unique in the '{table}' table (duplicate value '{value}')")]
    DuplicateKey {
        table: String,
        key: String,
        value: String,
    },
}

/// Failures while writing a table to durable storage.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {}: {source}", .dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode CSV for {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
