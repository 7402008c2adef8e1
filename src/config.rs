use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_NUM_DOCS: usize = 1000;

/// Directory layout of a project root. Everything the tool reads or writes lives below it.
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    pub root: PathBuf,
    pub database_dir: PathBuf,
    pub evaluation: PathBuf,
    pub tokenizers: PathBuf,
    pub datasets: PathBuf,
    pub config_file: PathBuf,
    pub env_file: PathBuf,
    pub database_file: PathBuf,
}

impl ResourcePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let database_dir = root.join("resources").join("database");
        Self {
            evaluation: database_dir.join("evaluation"),
            tokenizers: database_dir.join("tokenizers"),
            datasets: database_dir.join("datasets"),
            database_file: database_dir.join("TOKENEXPLORER.duckdb"),
            config_file: root.join("settings").join("configurations.json"),
            env_file: root.join("setup").join("variables").join(".env"),
            database_dir,
            root,
        }
    }

    /// Create the output directories if they do not exist yet
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.evaluation, &self.tokenizers, &self.datasets] {
            std::fs::create_dir_all(dir)
                .context(format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Settings read from `configurations.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Configuration {
    /// Tokenizer identifiers, benchmarked in this order
    #[serde(rename = "TOKENIZERS", default)]
    pub tokenizers: Vec<String>,

    /// Path of the custom baseline `tokenizer.json`, relative to the tokenizers directory
    #[serde(rename = "CUSTOM_TOKENIZER", default)]
    pub custom_tokenizer: Option<PathBuf>,

    #[serde(default)]
    pub benchmarks: BenchmarkSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkSettings {
    /// Documents beyond this count are ignored; `null` processes the whole corpus
    #[serde(rename = "MAX_NUM_DOCS", default = "default_max_num_docs")]
    pub max_num_docs: Option<usize>,

    /// Drop text and token columns from the persisted results
    #[serde(rename = "REDUCE_CSV_SIZE", default)]
    pub reduce_csv_size: bool,

    #[serde(rename = "SAVE_CSV", default)]
    pub save_csv: bool,
}

fn default_max_num_docs() -> Option<usize> {
    Some(DEFAULT_MAX_NUM_DOCS)
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            max_num_docs: default_max_num_docs(),
            reduce_csv_size: false,
            save_csv: false,
        }
    }
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read configuration at {}", path.display()))?;
        serde_json::from_str(&contents)
            .context(format!("Failed to parse configuration at {}", path.display()))
    }
}
