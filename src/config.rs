//! Configuration file handling.
//!
//! Settings come from `understanding-check.toml` in the working directory, or
//! the file passed with `--config`. Every field has a default, so a missing
//! file is not an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::words::Script;

pub const DEFAULT_CONFIG_FILE: &str = "understanding-check.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub words: WordsConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the per-date goal and response files.
    #[serde(default = "default_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordsConfig {
    #[serde(default)]
    pub script: Script,

    /// How many words the results view lists.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            script: Script::default(),
            max_words: default_max_words(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_dir(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_words() -> usize {
    50
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn default_toml() -> String {
        r#"# understanding-check configuration

[storage]
# Directory for goals_<date>.json and responses_<date>.json
data_dir = "."

[words]
# "hangul" counts runs of Hangul syllables; "alphabetic" counts any letters
script = "hangul"
max_words = 50

[export]
output_dir = "."
"#
        .to_string()
    }
}
