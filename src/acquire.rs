//! The acquisition pipeline: fetch both sources, merge, persist.

use crate::config::AppConfig;
use crate::fetch::FetchClient;
use crate::merge::merge;
use crate::persist::persist;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

/// What one acquisition run produced.
#[derive(Debug, Clone)]
pub struct AcquireSummary {
    pub personality_rows: usize,
    pub asset_rows: usize,
    pub merged_rows: usize,
    pub merged_columns: usize,
    pub merged_path: PathBuf,
}

/// Run fetch → merge → persist against the configured sources.
///
/// Nothing is written until both fetches and the merge have succeeded, so a
/// failing run never leaves partial output behind. Rerunning over unchanged
/// sources regenerates byte-identical files.
pub async fn run(config: &AppConfig) -> anyhow::Result<AcquireSummary> {
    let client = FetchClient::new().context("building the HTTP client")?;

    // 1. Fetch both source tables
    let personality = client
        .fetch(&config.personality_source)
        .await
        .context("fetching the personality table")?;
    let assets = client
        .fetch(&config.assets_source)
        .await
        .context("fetching the assets table")?;

    // 2. Join them on the shared identifier
    let merged =
        merge(&personality, &assets, &config.join_key).context("merging the source tables")?;
    info!(
        rows = merged.row_count(),
        columns = merged.column_count(),
        join_key = %config.join_key,
        "Merged source tables"
    );

    // 3. Persist the raw snapshots and the merged dataset
    persist(&personality, &config.personality_snapshot_path())
        .context("writing the personality snapshot")?;
    persist(&assets, &config.assets_snapshot_path()).context("writing the assets snapshot")?;
    let merged_path = config.merged_path();
    persist(&merged, &merged_path).context("writing the merged dataset")?;

    info!(path = %merged_path.display(), "Acquisition complete");

    Ok(AcquireSummary {
        personality_rows: personality.row_count(),
        asset_rows: assets.row_count(),
        merged_rows: merged.row_count(),
        merged_columns: merged.column_count(),
        merged_path,
    })
}
