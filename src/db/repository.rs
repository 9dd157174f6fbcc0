//! Repository trait and error types for the model artifact store.
//!
//! The learned estimator persists two blobs per user: the fitted model
//! weights and the feature normalizer. This module defines the abstract
//! interface those blobs are stored behind, with structured error context
//! for debugging and monitoring.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::UserId;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// The two artifact blobs persisted per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Fitted model weights.
    Model,
    /// Fitted feature normalizer parameters.
    Scaler,
}

impl ArtifactKind {
    /// Stable name used in storage keys and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Scaler => "scaler",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored artifact: a JSON payload plus its SHA-256 checksum.
///
/// The checksum is computed at store time and verified at load time; a
/// mismatch means the blob was corrupted at rest and the caller should
/// treat the artifact as unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub payload: String,
    pub checksum: String,
}

impl StoredArtifact {
    /// Wrap a JSON payload, computing its checksum.
    pub fn new(payload: String) -> Self {
        let checksum = super::checksum::calculate_checksum(&payload);
        Self { payload, checksum }
    }

    /// Verify the payload against the stored checksum.
    pub fn verify(&self) -> bool {
        super::checksum::calculate_checksum(&self.payload) == self.checksum
    }
}

/// Abstract per-user artifact store.
///
/// Implementations must keep users fully isolated: one user's artifacts are
/// loadable independently of any other user's, and an absent artifact is a
/// normal `Ok(None)`, never an error. All operations are synchronous; the
/// estimation engine itself is synchronous and the only slow path
/// (training) is serialized elsewhere.
pub trait ArtifactRepository: Send + Sync {
    /// Load one artifact blob, `Ok(None)` when never stored.
    fn load(&self, user: UserId, kind: ArtifactKind) -> RepositoryResult<Option<StoredArtifact>>;

    /// Store (or replace) one artifact blob.
    fn store(
        &self,
        user: UserId,
        kind: ArtifactKind,
        artifact: &StoredArtifact,
    ) -> RepositoryResult<()>;

    /// Remove all artifacts for a user. Removing a user with no artifacts
    /// is not an error.
    fn delete_user_artifacts(&self, user: UserId) -> RepositoryResult<()>;

    /// Verify the backend is reachable and usable.
    fn health_check(&self) -> RepositoryResult<bool>;
}

impl std::fmt::Debug for dyn ArtifactRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ArtifactRepository")
    }
}

/// Structured context for repository errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "load_artifact", "store_artifact")
    pub operation: Option<String>,
    /// The entity involved (e.g., "model", "scaler")
    pub entity: Option<String>,
    /// The owning user id if applicable
    pub user_id: Option<i64>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity (artifact kind).
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the owning user id.
    pub fn with_user(mut self, user: UserId) -> Self {
        self.user_id = Some(user.0);
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(user) = self.user_id {
            parts.push(format!("user={}", user));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Backend storage could not be reached or written.
    #[error("Storage error: {message} {context}")]
    StorageError {
        message: String,
        context: ErrorContext,
    },

    /// Stored payload failed its integrity check or could not be decoded.
    #[error("Corrupt artifact: {message} {context}")]
    CorruptArtifact {
        message: String,
        context: ErrorContext,
    },

    /// Configuration or initialization error.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    /// Create a storage error (retryable).
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    /// Create a storage error with full context.
    pub fn storage_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::StorageError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Create a corrupt-artifact error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a corrupt-artifact error with context.
    pub fn corrupt_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::CorruptArtifact {
            message: message.into(),
            context,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::StorageError { context, .. } => context,
            Self::CorruptArtifact { context, .. } => context,
            Self::ConfigurationError { context, .. } => context,
            Self::InternalError { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::StorageError { context, .. }
            | Self::CorruptArtifact { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_artifact_verify() {
        let artifact = StoredArtifact::new(r#"{"weights":[1.0]}"#.to_string());
        assert!(artifact.verify());

        let mut tampered = artifact.clone();
        tampered.payload = r#"{"weights":[2.0]}"#.to_string();
        assert!(!tampered.verify());
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new("load_artifact")
            .with_entity("model")
            .with_user(UserId::new(7))
            .with_details("missing file");
        let rendered = ctx.to_string();
        assert!(rendered.contains("operation=load_artifact"));
        assert!(rendered.contains("entity=model"));
        assert!(rendered.contains("user=7"));
        assert!(rendered.contains("details=missing file"));
    }

    #[test]
    fn test_storage_errors_are_retryable() {
        assert!(RepositoryError::storage("disk unavailable").is_retryable());
        assert!(!RepositoryError::corrupt("bad checksum").is_retryable());
    }

    #[test]
    fn test_with_operation_updates_context() {
        let err = RepositoryError::corrupt("bad checksum").with_operation("load_artifact");
        assert_eq!(err.context().operation.as_deref(), Some("load_artifact"));
    }
}
