//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring artifact
//! repository instances based on runtime configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
#[cfg(feature = "fs-repo")]
use super::repositories::FsRepository;
#[cfg(feature = "local-repo")]
use super::repositories::LocalRepository;
use super::repository::{ArtifactRepository, RepositoryError, RepositoryResult};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory repository
    Local,
    /// Filesystem-backed repository
    Filesystem,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "fs"/"filesystem").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "fs" | "filesystem" => Ok(Self::Filesystem),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from the `ARTIFACT_REPOSITORY_TYPE` environment
    /// variable, defaulting to Local.
    pub fn from_env() -> Self {
        std::env::var("ARTIFACT_REPOSITORY_TYPE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// Factory for creating artifact repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance from a parsed configuration file.
    pub fn from_config(config: &RepositoryConfig) -> RepositoryResult<Arc<dyn ArtifactRepository>> {
        let repo_type = config
            .repository_type()
            .map_err(RepositoryError::configuration)?;
        match repo_type {
            RepositoryType::Local => Self::create(RepositoryType::Local, None),
            RepositoryType::Filesystem => {
                let dir = config.artifact_dir().ok_or_else(|| {
                    RepositoryError::configuration(
                        "Filesystem repository requires 'filesystem.artifact_dir' setting",
                    )
                })?;
                Self::create(RepositoryType::Filesystem, Some(dir))
            }
        }
    }

    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `artifact_dir` - Artifact directory (required for Filesystem)
    pub fn create(
        repo_type: RepositoryType,
        artifact_dir: Option<&str>,
    ) -> RepositoryResult<Arc<dyn ArtifactRepository>> {
        match repo_type {
            RepositoryType::Local => {
                #[cfg(feature = "local-repo")]
                {
                    let _ = artifact_dir;
                    Ok(Self::create_local())
                }
                #[cfg(not(feature = "local-repo"))]
                {
                    let _ = artifact_dir;
                    Err(RepositoryError::configuration(
                        "Local repository feature not enabled",
                    ))
                }
            }
            RepositoryType::Filesystem => {
                #[cfg(feature = "fs-repo")]
                {
                    let dir = artifact_dir.ok_or_else(|| {
                        RepositoryError::configuration(
                            "Filesystem repository requires an artifact directory",
                        )
                    })?;
                    let repo = FsRepository::new(dir)?;
                    Ok(Arc::new(repo) as Arc<dyn ArtifactRepository>)
                }
                #[cfg(not(feature = "fs-repo"))]
                {
                    Err(RepositoryError::configuration(
                        "Filesystem repository feature not enabled",
                    ))
                }
            }
        }
    }

    /// Create an in-memory repository.
    #[cfg(feature = "local-repo")]
    pub fn create_local() -> Arc<dyn ArtifactRepository> {
        Arc::new(LocalRepository::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repository_type() {
        assert_eq!("local".parse(), Ok(RepositoryType::Local));
        assert_eq!("fs".parse(), Ok(RepositoryType::Filesystem));
        assert_eq!("Filesystem".parse(), Ok(RepositoryType::Filesystem));
        assert!("postgres".parse::<RepositoryType>().is_err());
    }

    #[test]
    fn test_create_local() {
        let repo = RepositoryFactory::create(RepositoryType::Local, None).unwrap();
        assert!(repo.health_check().unwrap());
    }

    #[test]
    fn test_create_filesystem_requires_dir() {
        let result = RepositoryFactory::create(RepositoryType::Filesystem, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let repo =
            RepositoryFactory::create(RepositoryType::Filesystem, dir.path().to_str()).unwrap();
        assert!(repo.health_check().unwrap());
    }
}
