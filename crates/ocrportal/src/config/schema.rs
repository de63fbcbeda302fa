use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::EngineKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engines: EnginesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Media root for every artifact namespace.
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    crate::db::default_database_path()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "ocrportal.db".to_string())
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnginesConfig {
    /// Engine used until an administrator selects one.
    #[serde(default)]
    pub default: EngineKind,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub scratch_dir: Option<String>,
    #[serde(default = "default_ocrmypdf")]
    pub ocrmypdf: CommandConfig,
    #[serde(default = "default_docling")]
    pub docling: CommandConfig,
}

fn default_timeout_secs() -> Option<u64> {
    Some(900)
}

fn default_ocrmypdf() -> CommandConfig {
    CommandConfig::program("ocrmypdf")
}

fn default_docling() -> CommandConfig {
    CommandConfig::program("docling")
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            default: EngineKind::default(),
            timeout_secs: default_timeout_secs(),
            scratch_dir: None,
            ocrmypdf: default_ocrmypdf(),
            docling: default_docling(),
        }
    }
}

impl EnginesConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn scratch_path(&self) -> Option<PathBuf> {
        self.scratch_dir.as_ref().map(PathBuf::from)
    }
}

/// An external program and the arguments placed before the engine's own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandConfig {
    fn program(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }
}
