//! In-memory artifact repository for unit testing and local development.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::api::UserId;
use crate::db::repository::{
    ArtifactKind, ArtifactRepository, RepositoryResult, StoredArtifact,
};

/// In-memory implementation of [`ArtifactRepository`].
///
/// Artifacts live in a `HashMap` behind an `RwLock`, so loads take a shared
/// lock and stores an exclusive one. Nothing survives the process; use the
/// filesystem repository for durable artifacts.
#[derive(Default)]
pub struct LocalRepository {
    artifacts: RwLock<HashMap<(UserId, ArtifactKind), StoredArtifact>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts across all users (test helper).
    pub fn artifact_count(&self) -> usize {
        self.artifacts.read().len()
    }
}

impl ArtifactRepository for LocalRepository {
    fn load(&self, user: UserId, kind: ArtifactKind) -> RepositoryResult<Option<StoredArtifact>> {
        Ok(self.artifacts.read().get(&(user, kind)).cloned())
    }

    fn store(
        &self,
        user: UserId,
        kind: ArtifactKind,
        artifact: &StoredArtifact,
    ) -> RepositoryResult<()> {
        self.artifacts
            .write()
            .insert((user, kind), artifact.clone());
        Ok(())
    }

    fn delete_user_artifacts(&self, user: UserId) -> RepositoryResult<()> {
        self.artifacts.write().retain(|(owner, _), _| *owner != user);
        Ok(())
    }

    fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
