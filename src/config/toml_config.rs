use crate::utils::error::{ReconError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional file-based configuration. Every field can also come from the
/// command line; CLI values win on conflict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: Option<SourceConfig>,
    pub directory: Option<DirectoryConfig>,
    pub load: Option<LoadConfig>,
    pub fetch: Option<FetchConfig>,
}

/// The tabular roster source: one token, two table endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub roster_url: Option<String>,
    pub lead_url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub concurrent_requests: Option<usize>,
}

impl TomlConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ReconError::ConfigError {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    pub fn roster_url(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.roster_url.as_deref())
    }

    pub fn lead_url(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.lead_url.as_deref())
    }

    pub fn roster_token(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.token.as_deref())
    }

    pub fn directory_url(&self) -> Option<&str> {
        self.directory.as_ref().and_then(|d| d.url.as_deref())
    }

    pub fn directory_token(&self) -> Option<&str> {
        self.directory.as_ref().and_then(|d| d.token.as_deref())
    }

    pub fn output_path(&self) -> Option<&str> {
        self.load.as_ref().and_then(|l| l.output_path.as_deref())
    }

    pub fn concurrent_requests(&self) -> Option<usize> {
        self.fetch.as_ref().and_then(|f| f.concurrent_requests)
    }
}
