//! # finpersona - Behavioural Finance Dataset Tooling
//!
//! Downloads a personality-profile table and an asset-holdings table, joins
//! them on the shared individual identifier, and persists the merged dataset
//! for read-only exploration:
//! - One-shot acquisition pipeline (fetch → merge → persist)
//! - Atomic overwrite of the output files, never a partial write
//! - Descriptive statistics report over the persisted dataset
//!
//! ## Quick Start
//!
//! ```no_run
//! use finpersona::{acquire, AppConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load();
//!     let summary = acquire::run(&config).await?;
//!     println!(
//!         "merged {} rows into {}",
//!         summary.merged_rows,
//!         summary.merged_path.display()
//!     );
//!     Ok(())
//! }
//! ```

// Core modules - the acquisition pipeline
pub mod acquire;
pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod persist;
pub mod table;
pub mod utils;

// Analysis modules - read-only consumers of the merged dataset
pub mod explore;
pub mod stats;

// Re-export the operation surface
pub use config::AppConfig;
pub use error::{FetchError, MergeError, WriteError};
pub use fetch::{FetchClient, SourceSpec};
pub use merge::merge;
pub use persist::persist;
pub use table::Table;
pub use utils::init_logger;
