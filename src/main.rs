use clap::{Parser, Subcommand};
use finpersona::utils::init_logger;
use finpersona::{acquire, config::AppConfig, explore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "finpersona")]
#[command(about = "Download, merge and explore the behavioural-finance personality/asset dataset")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch both source tables, merge them and write the dataset files
    Acquire,
    /// Print a descriptive report over the persisted merged dataset
    Explore {
        /// Merged dataset to read (defaults to the configured output path)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logger()?;

    let cli = Cli::parse();
    let config = AppConfig::load();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        join_key = %config.join_key,
        "Loaded configuration"
    );

    // A bare invocation runs the acquisition pipeline
    match cli.command.unwrap_or(Commands::Acquire) {
        Commands::Acquire => {
            let summary = acquire::run(&config).await?;
            println!(
                "Merged {} personality rows with {} asset rows into {} ({} rows, {} columns)",
                summary.personality_rows,
                summary.asset_rows,
                summary.merged_path.display(),
                summary.merged_rows,
                summary.merged_columns
            );
        }
        Commands::Explore { input } => {
            let input = input.unwrap_or_else(|| config.merged_path());
            explore::run(&input, &config.join_key)?;
        }
    }

    Ok(())
}
