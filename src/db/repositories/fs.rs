//! Filesystem-backed artifact repository.
//!
//! One JSON file per `(user, kind)` pair under a configured directory,
//! e.g. `artifacts/user_42_model.json` and `artifacts/user_42_scaler.json`.
//! Loads are absent-tolerant: a missing file is `Ok(None)`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::api::UserId;
use crate::db::repository::{
    ArtifactKind, ArtifactRepository, ErrorContext, RepositoryError, RepositoryResult,
    StoredArtifact,
};

/// Filesystem implementation of [`ArtifactRepository`].
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    /// Open (creating if needed) an artifact directory.
    pub fn new(root: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            RepositoryError::storage_with_context(
                format!("failed to create artifact directory: {}", e),
                ErrorContext::new("init").with_details(root.display().to_string()),
            )
        })?;
        Ok(Self { root })
    }

    /// Directory holding the artifact files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, user: UserId, kind: ArtifactKind) -> PathBuf {
        self.root.join(format!("user_{}_{}.json", user.0, kind))
    }
}

impl ArtifactRepository for FsRepository {
    fn load(&self, user: UserId, kind: ArtifactKind) -> RepositoryResult<Option<StoredArtifact>> {
        let path = self.artifact_path(user, kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RepositoryError::storage_with_context(
                    format!("failed to read artifact: {}", e),
                    ErrorContext::new("load_artifact")
                        .with_entity(kind.as_str())
                        .with_user(user),
                ))
            }
        };

        let artifact: StoredArtifact = serde_json::from_slice(&bytes).map_err(|e| {
            RepositoryError::corrupt_with_context(
                format!("failed to decode artifact file: {}", e),
                ErrorContext::new("load_artifact")
                    .with_entity(kind.as_str())
                    .with_user(user)
                    .with_details(path.display().to_string()),
            )
        })?;
        Ok(Some(artifact))
    }

    fn store(
        &self,
        user: UserId,
        kind: ArtifactKind,
        artifact: &StoredArtifact,
    ) -> RepositoryResult<()> {
        let path = self.artifact_path(user, kind);
        let bytes = serde_json::to_vec(artifact)
            .map_err(|e| RepositoryError::internal(format!("failed to encode artifact: {}", e)))?;

        // Write to a sibling temp file, then rename, so a concurrent load
        // never observes a half-written artifact.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).map_err(|e| {
            RepositoryError::storage_with_context(
                format!("failed to write artifact: {}", e),
                ErrorContext::new("store_artifact")
                    .with_entity(kind.as_str())
                    .with_user(user),
            )
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            RepositoryError::storage_with_context(
                format!("failed to finalize artifact: {}", e),
                ErrorContext::new("store_artifact")
                    .with_entity(kind.as_str())
                    .with_user(user),
            )
        })?;
        Ok(())
    }

    fn delete_user_artifacts(&self, user: UserId) -> RepositoryResult<()> {
        for kind in [ArtifactKind::Model, ArtifactKind::Scaler] {
            let path = self.artifact_path(user, kind);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(RepositoryError::storage_with_context(
                        format!("failed to delete artifact: {}", e),
                        ErrorContext::new("delete_user_artifacts")
                            .with_entity(kind.as_str())
                            .with_user(user),
                    ))
                }
            }
        }
        Ok(())
    }

    fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.root.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsRepository::new(dir.path()).unwrap();
        let loaded = repo.load(UserId::new(5), ArtifactKind::Scaler).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_store_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsRepository::new(dir.path()).unwrap();
        let artifact = StoredArtifact::new(r#"{"mins":[20.0],"maxs":[45.0]}"#.to_string());

        repo.store(UserId::new(5), ArtifactKind::Scaler, &artifact)
            .unwrap();
        let loaded = repo
            .load(UserId::new(5), ArtifactKind::Scaler)
            .unwrap()
            .unwrap();
        assert_eq!(loaded, artifact);
        assert!(loaded.verify());
    }

    #[test]
    fn test_undecodable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsRepository::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("user_5_model.json"), b"not json").unwrap();

        let err = repo.load(UserId::new(5), ArtifactKind::Model).unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptArtifact { .. }));
    }

    #[test]
    fn test_delete_is_absent_tolerant() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsRepository::new(dir.path()).unwrap();
        assert!(repo.delete_user_artifacts(UserId::new(99)).is_ok());
    }
}
