//! Repository configuration file support.
//!
//! This module provides utilities for reading artifact-repository
//! configuration from TOML configuration files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::factory::RepositoryType;
use super::repository::RepositoryError;

/// Repository configuration from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub repository: RepositorySettings,
    #[serde(default)]
    pub filesystem: FilesystemSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

/// Filesystem backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesystemSettings {
    /// Directory holding the per-user artifact files.
    #[serde(default)]
    pub artifact_dir: String,
}

impl RepositoryConfig {
    /// Load repository configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;

        let config: RepositoryConfig = toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    /// Load repository configuration from the default location.
    ///
    /// Searches for `artifacts.toml` in the current directory and the
    /// parent directory.
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = vec![
            PathBuf::from("artifacts.toml"),
            PathBuf::from("../artifacts.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No artifacts.toml found in standard locations",
        ))
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        self.repository.repo_type.parse()
    }

    /// Artifact directory, when the filesystem backend is configured with one.
    pub fn artifact_dir(&self) -> Option<&str> {
        if self.filesystem.artifact_dir.is_empty() {
            None
        } else {
            Some(&self.filesystem.artifact_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_config() {
        let toml = r#"
[repository]
type = "local"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.repository.repo_type, "local");
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
        assert!(config.artifact_dir().is_none());
    }

    #[test]
    fn test_parse_filesystem_config() {
        let toml = r#"
[repository]
type = "fs"

[filesystem]
artifact_dir = "/var/lib/cyclecast/artifacts"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.repository_type().unwrap(),
            RepositoryType::Filesystem
        );
        assert_eq!(config.artifact_dir(), Some("/var/lib/cyclecast/artifacts"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let toml = r#"
[repository]
type = "postgres"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert!(config.repository_type().is_err());
    }
}
