use crate::fetch::SourceSpec;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

// Upstream locations hardcoded from the behavioural-finance task repository.
const DEFAULT_PERSONALITY_URL: &str =
    "https://raw.githubusercontent.com/karwester/behavioural-finance-task/main/personality.csv";
const DEFAULT_SUPABASE_URL: &str = "https://pvgaaikztozwlfhyrqlo.supabase.co";
// Anon key published in the upstream task repository.
const DEFAULT_SUPABASE_API_KEY: &str = concat!(
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJpc3MiOiJzdXBhYmFzZSIsInJlZiI6",
    "InB2Z2FhaWt6dG96d2xmaHlycWxvIiwicm9sZSI6ImFub24iLCJpYXQiOjE3NDc4NDE2",
    "MjUsImV4cCI6MjA2MzQxNzYyNX0.iAqMXnJ_sJuBMtA6FPNCRcYnKw95YkJvY3OhCIZ77vI"
);

const DEFAULT_DATA_DIR: &str = "datasets";
const DEFAULT_JOIN_KEY: &str = "_id";

pub const PERSONALITY_FILENAME: &str = "personality.csv";
pub const ASSETS_FILENAME: &str = "assets.csv";
pub const MERGED_FILENAME: &str = "merged_dataset.csv";

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug)]
pub struct ConfigYaml {
    pub personality_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_api_key: Option<String>,
    pub assets_csv: Option<String>,
    pub data_dir: Option<String>,
    pub join_key: Option<String>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub personality_source: SourceSpec,
    pub assets_source: SourceSpec,
    pub data_dir: PathBuf,
    pub join_key: String,
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> Self {
        // Check for CONFIG_FILE environment variable first
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    // Load configuration from YAML file
    pub fn from_yaml(file_path: &str) -> Self {
        let yaml_content = fs::read_to_string(file_path)
            .unwrap_or_else(|e| panic!("Failed to read config file {}: {}", file_path, e));

        let yaml_config: ConfigYaml = serde_yaml::from_str(&yaml_content)
            .unwrap_or_else(|e| panic!("Failed to parse YAML config: {}", e));

        Self::resolve(
            yaml_config.personality_url,
            yaml_config.supabase_url,
            yaml_config.supabase_api_key,
            yaml_config.assets_csv,
            yaml_config.data_dir,
            yaml_config.join_key,
        )
    }

    // Load all configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::resolve(
            env::var("PERSONALITY_URL").ok(),
            env::var("SUPABASE_URL").ok(),
            env::var("SUPABASE_API_KEY").ok(),
            env::var("ASSETS_CSV").ok(),
            env::var("DATA_DIR").ok(),
            env::var("JOIN_KEY").ok(),
        )
    }

    // Fill in defaults and resolve the raw settings into source specs
    fn resolve(
        personality_url: Option<String>,
        supabase_url: Option<String>,
        supabase_api_key: Option<String>,
        assets_csv: Option<String>,
        data_dir: Option<String>,
        join_key: Option<String>,
    ) -> Self {
        let personality_url =
            personality_url.unwrap_or_else(|| DEFAULT_PERSONALITY_URL.to_string());
        let supabase_url = supabase_url.unwrap_or_else(|| DEFAULT_SUPABASE_URL.to_string());
        let supabase_api_key =
            supabase_api_key.unwrap_or_else(|| DEFAULT_SUPABASE_API_KEY.to_string());

        let personality_source = SourceSpec::csv("personality", &personality_url);

        // ASSETS_CSV overrides the REST endpoint with a plain CSV source
        let assets_source = match assets_csv {
            Some(location) => SourceSpec::csv("assets", &location),
            None => SourceSpec::rest(
                "assets",
                &format!(
                    "{}/rest/v1/assets?select=*",
                    supabase_url.trim_end_matches('/')
                ),
                &supabase_api_key,
            ),
        };

        Self {
            personality_source,
            assets_source,
            data_dir: PathBuf::from(data_dir.unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            join_key: join_key.unwrap_or_else(|| DEFAULT_JOIN_KEY.to_string()),
        }
    }

    /// Path of the raw personality snapshot written by acquisition.
    pub fn personality_snapshot_path(&self) -> PathBuf {
        self.data_dir.join(PERSONALITY_FILENAME)
    }

    /// Path of the raw assets snapshot written by acquisition.
    pub fn assets_snapshot_path(&self) -> PathBuf {
        self.data_dir.join(ASSETS_FILENAME)
    }

    /// Path of the merged dataset consumed by the explorer.
    pub fn merged_path(&self) -> PathBuf {
        self.data_dir.join(MERGED_FILENAME)
    }
}
