//! Configuration loading and management
//!
//! Handles parsing of `config.toml` from the platform config directory (or
//! an explicit path).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::store::DEFAULT_RECORDS_KEY;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task behaviour configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Where records are kept
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Data directory; the platform data directory when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Key (file stem) the records snapshot is stored under
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    DEFAULT_RECORDS_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: default_key(),
        }
    }
}

/// Task behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct TasksConfig {
    /// Roll sticky incomplete tasks onto today whenever records are opened
    #[serde(default = "default_true")]
    pub touch_sticky_on_open: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            touch_sticky_on_open: true,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "daybook")
}

/// Platform location of `config.toml`, if the platform has one
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Platform data directory, falling back to `./.daybook`
pub fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".daybook"))
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> crate::error::Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Effective data directory
    pub fn data_dir(&self) -> PathBuf {
        self.storage.dir.clone().unwrap_or_else(default_data_dir)
    }

    fn validate(&self) -> crate::error::Result<()> {
        crate::storage::validate_key(&self.storage.key).map_err(|err| {
            crate::error::Error::InvalidConfig(format!("storage.key: {err}"))
        })?;
        if let Some(dir) = &self.storage.dir {
            if dir.as_os_str().is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "storage.dir cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.key, "records");
        assert!(cfg.storage.dir.is_none());
        assert!(cfg.tasks.touch_sticky_on_open);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let content = r#"
[storage]
dir = "/var/lib/daybook"
key = "work"

[tasks]
touch_sticky_on_open = false
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.storage.dir, Some(PathBuf::from("/var/lib/daybook")));
        assert_eq!(cfg.storage.key, "work");
        assert!(!cfg.tasks.touch_sticky_on_open);
        assert_eq!(cfg.data_dir(), PathBuf::from("/var/lib/daybook"));
    }

    #[test]
    fn invalid_key_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage]\nkey = \"../escape\"").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_or_default(Some(&dir.path().join("absent.toml"))).expect("load");
        assert_eq!(cfg.storage.key, "records");
        let cfg = Config::load_or_default(None).expect("load");
        assert!(cfg.tasks.touch_sticky_on_open);
    }
}
